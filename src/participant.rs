use std::sync::Arc;

use serde_json::{json, Value};
use tracing::info;

use crate::error::Error;
use crate::transport::{Connection, Credential, Transport};
use crate::types::{envelope, snapshot_id, try_unwrap_entity, unwrap_entity, Liveness, Snapshot};
use crate::validate::PARTICIPANT;

const ENTITY: &str = "participant";

#[derive(Clone, Debug)]
pub struct Participant {
    attributes: Snapshot,
    tournament_id: u64,
    liveness: Liveness,
    connection: Connection,
}

impl Participant {
    pub fn new(
        snapshot: Snapshot,
        tournament_id: u64,
        credential: impl Into<Credential>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self::from_connection(
            snapshot,
            tournament_id,
            Connection::new(credential.into(), transport),
        )
    }

    pub(crate) fn from_connection(
        snapshot: Snapshot,
        tournament_id: u64,
        connection: Connection,
    ) -> Self {
        Self {
            attributes: snapshot,
            tournament_id,
            liveness: Liveness::Active,
            connection,
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.attributes
    }

    pub fn id(&self) -> Result<u64, Error> {
        snapshot_id(&self.attributes, ENTITY, "id")
    }

    pub fn tournament_id(&self) -> u64 {
        self.tournament_id
    }

    pub fn name(&self) -> Option<&str> {
        self.attributes.get("name").and_then(Value::as_str)
    }

    pub fn seed(&self) -> Option<u64> {
        self.attributes.get("seed").and_then(Value::as_u64)
    }

    pub fn is_active(&self) -> bool {
        self.attributes
            .get("active")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn is_destroyed(&self) -> bool {
        self.liveness == Liveness::Destroyed
    }

    fn path(&self, suffix: &str) -> Result<String, Error> {
        self.liveness.ensure_active(ENTITY)?;
        Ok(format!(
            "tournaments/{}/participants/{}{suffix}.json",
            self.tournament_id,
            self.id()?
        ))
    }

    pub async fn attributes(&mut self) -> Result<&Snapshot, Error> {
        let path = self.path("")?;
        let body = self.connection.get(&path, vec![]).await?;
        self.attributes = unwrap_entity(&body, ENTITY, &path)?;
        Ok(&self.attributes)
    }

    pub async fn update(&mut self, args: &Value) -> Result<&Snapshot, Error> {
        let path = self.path("")?;
        let fields = PARTICIPANT.validate(args)?;
        let body = self.connection.put(&path, &envelope(ENTITY, fields)).await?;
        self.attributes = unwrap_entity(&body, ENTITY, &path)?;
        Ok(&self.attributes)
    }

    pub async fn check_in(&mut self) -> Result<&Snapshot, Error> {
        self.post_action("check_in").await
    }

    pub async fn undo_check_in(&mut self) -> Result<&Snapshot, Error> {
        self.post_action("undo_check_in").await
    }

    /// Removes the participant, or marks it inactive once the tournament
    /// is underway. The wrapper is inert afterwards either way.
    pub async fn destroy(&mut self) -> Result<(), Error> {
        let path = self.path("")?;
        let body = self.connection.delete(&path).await?;
        if let Some(snapshot) = try_unwrap_entity(&body, ENTITY) {
            self.attributes = snapshot;
        }
        self.liveness = Liveness::Destroyed;
        info!(id = self.id().ok(), tournament_id = self.tournament_id, "participant destroyed");
        Ok(())
    }

    async fn post_action(&mut self, action: &str) -> Result<&Snapshot, Error> {
        let path = self.path(&format!("/{action}"))?;
        let body = self.connection.post(&path, &json!({})).await?;
        self.attributes = unwrap_entity(&body, ENTITY, &path)?;
        Ok(&self.attributes)
    }
}
