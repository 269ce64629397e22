use std::sync::Arc;

use serde_json::{json, Value};
use tracing::info;

use crate::error::Error;
use crate::matches::Match;
use crate::participant::Participant;
use crate::transport::{Connection, Credential, Transport};
use crate::types::{
    envelope, snapshot_id, try_unwrap_entity, unwrap_entities, unwrap_entity, Liveness,
    MatchFilter, Snapshot, TournamentState,
};
use crate::validate::{PARTICIPANT, TOURNAMENT};

const ENTITY: &str = "tournament";

/// A tournament and the last snapshot the API returned for it.
///
/// Every call checks liveness first: once [`Tournament::destroy`] succeeds
/// the wrapper refuses all further work without touching the network.
#[derive(Clone, Debug)]
pub struct Tournament {
    attributes: Snapshot,
    liveness: Liveness,
    reset_state: TournamentState,
    connection: Connection,
}

impl Tournament {
    pub fn new(
        snapshot: Snapshot,
        credential: impl Into<Credential>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self::from_connection(
            snapshot,
            Connection::new(credential.into(), transport),
            TournamentState::Ended,
        )
    }

    pub(crate) fn from_connection(
        snapshot: Snapshot,
        connection: Connection,
        reset_state: TournamentState,
    ) -> Self {
        Self {
            attributes: snapshot,
            liveness: Liveness::Active,
            reset_state,
            connection,
        }
    }

    /// State recorded after [`Tournament::reset`] when the server does not
    /// answer with a snapshot. Defaults to `ended`.
    pub fn with_reset_state(mut self, state: TournamentState) -> Self {
        self.reset_state = state;
        self
    }

    /// The cached snapshot, without a network call.
    pub fn snapshot(&self) -> &Snapshot {
        &self.attributes
    }

    pub fn id(&self) -> Result<u64, Error> {
        snapshot_id(&self.attributes, ENTITY, "id")
    }

    pub fn name(&self) -> Option<&str> {
        self.attributes.get("name").and_then(Value::as_str)
    }

    /// `None` if the snapshot has no state or one this crate does not know.
    pub fn state(&self) -> Option<TournamentState> {
        self.attributes
            .get("state")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
    }

    pub fn liveness(&self) -> Liveness {
        self.liveness
    }

    pub fn is_destroyed(&self) -> bool {
        self.liveness == Liveness::Destroyed
    }

    fn path(&self, suffix: &str) -> Result<String, Error> {
        self.liveness.ensure_active(ENTITY)?;
        Ok(format!("tournaments/{}{suffix}.json", self.id()?))
    }

    /// Re-fetches the snapshot.
    pub async fn attributes(&mut self) -> Result<&Snapshot, Error> {
        let path = self.path("")?;
        let body = self.connection.get(&path, vec![]).await?;
        self.attributes = unwrap_entity(&body, ENTITY, &path)?;
        Ok(&self.attributes)
    }

    pub async fn update(&mut self, args: &Value) -> Result<&Snapshot, Error> {
        let path = self.path("")?;
        let fields = TOURNAMENT.validate(args)?;
        let body = self.connection.put(&path, &envelope(ENTITY, fields)).await?;
        self.attributes = unwrap_entity(&body, ENTITY, &path)?;
        Ok(&self.attributes)
    }

    /// Deletes the tournament. The wrapper is inert afterwards.
    pub async fn destroy(&mut self) -> Result<(), Error> {
        let path = self.path("")?;
        let body = self.connection.delete(&path).await?;
        if let Some(snapshot) = try_unwrap_entity(&body, ENTITY) {
            self.attributes = snapshot;
        }
        self.liveness = Liveness::Destroyed;
        info!(id = self.id().ok(), "tournament destroyed");
        Ok(())
    }

    /// `checking_in` → `checked_in`.
    pub async fn process_check_ins(&mut self) -> Result<&Snapshot, Error> {
        self.transition("process_check_ins", TournamentState::CheckedIn).await
    }

    /// `checking_in` or `checked_in` → `pending`.
    pub async fn abort_check_in(&mut self) -> Result<&Snapshot, Error> {
        self.transition("abort_check_in", TournamentState::Pending).await
    }

    /// The server refuses to start with fewer than two participants.
    pub async fn start(&mut self) -> Result<&Snapshot, Error> {
        self.transition("start", TournamentState::InProgress).await
    }

    pub async fn finalize(&mut self) -> Result<&Snapshot, Error> {
        self.transition("finalize", TournamentState::Ended).await
    }

    /// Clears all match results so the tournament can be started again.
    pub async fn reset(&mut self) -> Result<&Snapshot, Error> {
        let fallback = self.reset_state;
        self.transition("reset", fallback).await
    }

    pub async fn open_for_predictions(&mut self) -> Result<&Snapshot, Error> {
        self.transition("open_for_predictions", TournamentState::Pending).await
    }

    /// Posts a lifecycle action. The server's snapshot replaces the cache;
    /// if it sends none, only the state is set to `fallback`.
    async fn transition(
        &mut self,
        action: &str,
        fallback: TournamentState,
    ) -> Result<&Snapshot, Error> {
        let path = self.path(&format!("/{action}"))?;
        let body = self.connection.post(&path, &json!({})).await?;
        match try_unwrap_entity(&body, ENTITY) {
            Some(snapshot) => self.attributes = snapshot,
            None => {
                self.attributes
                    .insert("state".into(), fallback.as_str().into());
            }
        }
        info!(id = self.id().ok(), action, state = ?self.state(), "tournament transition");
        Ok(&self.attributes)
    }

    pub async fn participants(&self) -> Result<Vec<Participant>, Error> {
        let path = self.path("/participants")?;
        let body = self.connection.get(&path, vec![]).await?;
        self.wrap_participants(&body, &path)
    }

    pub async fn participant(&self, id: u64) -> Result<Participant, Error> {
        let path = self.path(&format!("/participants/{id}"))?;
        let body = self.connection.get(&path, vec![]).await?;
        self.wrap_participant(&body, &path)
    }

    pub async fn create_participant(&self, args: &Value) -> Result<Participant, Error> {
        let path = self.path("/participants")?;
        let fields = PARTICIPANT.validate(args)?;
        let body = self
            .connection
            .post(&path, &envelope("participant", fields))
            .await?;
        self.wrap_participant(&body, &path)
    }

    /// Validates every entry before sending any of them.
    pub async fn bulk_add_participants(&self, args: &[Value]) -> Result<Vec<Participant>, Error> {
        let path = self.path("/participants/bulk_add")?;
        let participants = args
            .iter()
            .map(|args| PARTICIPANT.validate(args).map(Value::Object))
            .collect::<Result<Vec<_>, _>>()?;
        let body = self
            .connection
            .post(&path, &json!({ "participants": participants }))
            .await?;
        self.wrap_participants(&body, &path)
    }

    pub async fn randomize_participants(&self) -> Result<Vec<Participant>, Error> {
        let path = self.path("/participants/randomize")?;
        let body = self.connection.post(&path, &json!({})).await?;
        self.wrap_participants(&body, &path)
    }

    /// Removes every participant. Only allowed before the tournament starts.
    pub async fn clear_participants(&self) -> Result<(), Error> {
        let path = self.path("/participants/clear")?;
        self.connection.delete(&path).await?;
        Ok(())
    }

    pub async fn matches(&self, filter: &MatchFilter) -> Result<Vec<Match>, Error> {
        let path = self.path("/matches")?;
        let body = self.connection.get(&path, filter.query()).await?;
        let tournament_id = self.id()?;
        Ok(unwrap_entities(&body, "match", &path)?
            .into_iter()
            .map(|snapshot| {
                Match::from_connection(snapshot, tournament_id, self.connection.clone())
            })
            .collect())
    }

    pub async fn get_match(&self, id: u64) -> Result<Match, Error> {
        let path = self.path(&format!("/matches/{id}"))?;
        let body = self.connection.get(&path, vec![]).await?;
        Ok(Match::from_connection(
            unwrap_entity(&body, "match", &path)?,
            self.id()?,
            self.connection.clone(),
        ))
    }

    fn wrap_participant(&self, body: &str, path: &str) -> Result<Participant, Error> {
        Ok(Participant::from_connection(
            unwrap_entity(body, "participant", path)?,
            self.id()?,
            self.connection.clone(),
        ))
    }

    fn wrap_participants(&self, body: &str, path: &str) -> Result<Vec<Participant>, Error> {
        let tournament_id = self.id()?;
        Ok(unwrap_entities(body, "participant", path)?
            .into_iter()
            .map(|snapshot| {
                Participant::from_connection(snapshot, tournament_id, self.connection.clone())
            })
            .collect())
    }
}
