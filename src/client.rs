use std::sync::Arc;

use serde_json::Value;

use crate::config::Config;
use crate::error::Error;
use crate::tournament::Tournament;
use crate::transport::{Connection, Credential, HttpTransport, Transport, DEFAULT_BASE_URL};
use crate::types::{
    envelope, unwrap_entities, unwrap_entity, Snapshot, TournamentFilter, TournamentState,
};
use crate::validate::TOURNAMENT;

/// Entry point: owns the API key and the transport, and hands out
/// [`Tournament`] wrappers that share both.
#[derive(Clone, Debug)]
pub struct Client {
    connection: Connection,
    reset_state: TournamentState,
}

impl Client {
    pub fn new(api_key: impl Into<Credential>) -> Result<Self, Error> {
        let transport = HttpTransport::new(DEFAULT_BASE_URL)?;
        Ok(Self::with_transport(api_key, Arc::new(transport)))
    }

    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let transport = HttpTransport::new(&config.base_url)?;
        Ok(Self::with_transport(config.credential.clone(), Arc::new(transport))
            .with_reset_state(config.reset_state))
    }

    pub fn with_transport(api_key: impl Into<Credential>, transport: Arc<dyn Transport>) -> Self {
        Self {
            connection: Connection::new(api_key.into(), transport),
            reset_state: TournamentState::Ended,
        }
    }

    pub fn with_reset_state(mut self, state: TournamentState) -> Self {
        self.reset_state = state;
        self
    }

    fn wrap(&self, snapshot: Snapshot) -> Tournament {
        Tournament::from_connection(snapshot, self.connection.clone(), self.reset_state)
    }

    pub async fn tournaments(&self, filter: &TournamentFilter) -> Result<Vec<Tournament>, Error> {
        let path = "tournaments.json";
        let body = self.connection.get(path, filter.query()).await?;
        Ok(unwrap_entities(&body, "tournament", path)?
            .into_iter()
            .map(|snapshot| self.wrap(snapshot))
            .collect())
    }

    /// Looks a tournament up by numeric id or by url (`subdomain-url` for
    /// tournaments hosted on a subdomain).
    pub async fn tournament(&self, id: &str) -> Result<Tournament, Error> {
        if id.is_empty()
            || !id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(Error::validation(
                "id",
                format!("`{id}` may only contain letters, numbers, underscores and dashes"),
            ));
        }
        let path = format!("tournaments/{id}.json");
        let body = self.connection.get(&path, vec![]).await?;
        Ok(self.wrap(unwrap_entity(&body, "tournament", &path)?))
    }

    pub async fn create_tournament(&self, args: &Value) -> Result<Tournament, Error> {
        let path = "tournaments.json";
        let fields = TOURNAMENT.validate(args)?;
        let body = self
            .connection
            .post(path, &envelope("tournament", fields))
            .await?;
        Ok(self.wrap(unwrap_entity(&body, "tournament", path)?))
    }
}
