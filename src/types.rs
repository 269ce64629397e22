use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, JSONError};

/// The cached fields of a remote object, with its envelope removed.
pub type Snapshot = Map<String, Value>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentState {
    Pending,
    CheckingIn,
    CheckedIn,
    #[serde(alias = "underway")]
    InProgress,
    #[serde(alias = "complete")]
    Ended,
}

impl TournamentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TournamentState::Pending => "pending",
            TournamentState::CheckingIn => "checking_in",
            TournamentState::CheckedIn => "checked_in",
            TournamentState::InProgress => "in_progress",
            TournamentState::Ended => "ended",
        }
    }
}

impl fmt::Display for TournamentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TournamentState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(TournamentState::Pending),
            "checking_in" => Ok(TournamentState::CheckingIn),
            "checked_in" => Ok(TournamentState::CheckedIn),
            "in_progress" | "underway" => Ok(TournamentState::InProgress),
            "ended" | "complete" => Ok(TournamentState::Ended),
            other => Err(Error::validation(
                "state",
                format!("`{other}` is not a tournament state"),
            )),
        }
    }
}

/// Whether a wrapper may still talk to the remote object it mirrors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Liveness {
    #[default]
    Active,
    Destroyed,
}

impl Liveness {
    pub(crate) fn ensure_active(self, entity: &'static str) -> Result<(), Error> {
        match self {
            Liveness::Active => Ok(()),
            Liveness::Destroyed => {
                tracing::error!(entity, "operation attempted on a destroyed {entity}");
                Err(Error::Destroyed { entity })
            }
        }
    }
}

/// `state` filter accepted by the tournament index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum IndexState {
    All,
    Pending,
    InProgress,
    Ended,
}

impl IndexState {
    fn as_str(&self) -> &'static str {
        match self {
            IndexState::All => "all",
            IndexState::Pending => "pending",
            IndexState::InProgress => "in_progress",
            IndexState::Ended => "ended",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TournamentFilter {
    pub state: Option<IndexState>,
    pub tournament_type: Option<String>,
    pub created_after: Option<String>,
    pub created_before: Option<String>,
    pub subdomain: Option<String>,
}

impl TournamentFilter {
    pub(crate) fn query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(state) = self.state {
            query.push(("state".into(), state.as_str().into()));
        }
        let optional = [
            ("type", &self.tournament_type),
            ("created_after", &self.created_after),
            ("created_before", &self.created_before),
            ("subdomain", &self.subdomain),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                query.push((key.into(), value.clone()));
            }
        }
        query
    }
}

/// `state` filter accepted by the match index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum MatchState {
    All,
    Pending,
    Open,
    Complete,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MatchFilter {
    pub state: Option<MatchState>,
    pub participant_id: Option<u64>,
}

impl MatchFilter {
    pub(crate) fn query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(state) = self.state {
            let state = match state {
                MatchState::All => "all",
                MatchState::Pending => "pending",
                MatchState::Open => "open",
                MatchState::Complete => "complete",
            };
            query.push(("state".into(), state.into()));
        }
        if let Some(id) = self.participant_id {
            query.push(("participant_id".into(), id.to_string()));
        }
        query
    }
}

/// Reads a numeric id from a snapshot. The API sends ids as numbers, but a
/// string of digits is accepted as well.
pub(crate) fn snapshot_id(
    snapshot: &Snapshot,
    entity: &'static str,
    field: &'static str,
) -> Result<u64, Error> {
    match snapshot.get(field) {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    }
    .ok_or(Error::MissingAttribute { entity, field })
}

/// Parses `{"<key>": {...}}`.
pub(crate) fn unwrap_entity(body: &str, key: &str, path: &str) -> Result<Snapshot, Error> {
    let value: Value = serde_json::from_str(body).map_err(|e| JSONError::new(path, e))?;
    match take_entity(value, key) {
        Some(snapshot) => Ok(snapshot),
        None => Err(JSONError::new(path, missing_envelope(key)).into()),
    }
}

/// Like `unwrap_entity`, but a body without the envelope yields `None`.
pub(crate) fn try_unwrap_entity(body: &str, key: &str) -> Option<Snapshot> {
    serde_json::from_str(body)
        .ok()
        .and_then(|value| take_entity(value, key))
}

/// Parses `[{"<key>": {...}}, ...]`.
pub(crate) fn unwrap_entities(body: &str, key: &str, path: &str) -> Result<Vec<Snapshot>, Error> {
    let values: Vec<Value> = serde_json::from_str(body).map_err(|e| JSONError::new(path, e))?;
    values
        .into_iter()
        .map(|value| {
            take_entity(value, key)
                .ok_or_else(|| JSONError::new(path, missing_envelope(key)).into())
        })
        .collect()
}

fn take_entity(value: Value, key: &str) -> Option<Snapshot> {
    match value {
        Value::Object(mut outer) => match outer.remove(key) {
            Some(Value::Object(inner)) => Some(inner),
            _ => None,
        },
        _ => None,
    }
}

fn missing_envelope(key: &str) -> serde_json::Error {
    serde::de::Error::custom(format!("expected an object under `{key}`"))
}

/// Wraps validated fields in the envelope the API expects on writes.
pub(crate) fn envelope(key: &str, fields: Snapshot) -> Value {
    let mut outer = Map::new();
    outer.insert(key.into(), Value::Object(fields));
    Value::Object(outer)
}
