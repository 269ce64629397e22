use std::sync::Arc;

use serde_json::Value;

use crate::error::Error;
use crate::transport::{Connection, Credential, Transport};
use crate::types::{envelope, snapshot_id, try_unwrap_entity, unwrap_entity, Liveness, Snapshot};
use crate::validate::ATTACHMENT;

const ENTITY: &str = "match_attachment";

/// A link, file or note attached to a match.
#[derive(Clone, Debug)]
pub struct Attachment {
    attributes: Snapshot,
    tournament_id: u64,
    match_id: u64,
    liveness: Liveness,
    connection: Connection,
}

impl Attachment {
    pub fn new(
        snapshot: Snapshot,
        tournament_id: u64,
        match_id: u64,
        credential: impl Into<Credential>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self::from_connection(
            snapshot,
            tournament_id,
            match_id,
            Connection::new(credential.into(), transport),
        )
    }

    pub(crate) fn from_connection(
        snapshot: Snapshot,
        tournament_id: u64,
        match_id: u64,
        connection: Connection,
    ) -> Self {
        Self {
            attributes: snapshot,
            tournament_id,
            match_id,
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

    pub fn match_id(&self) -> u64 {
        self.match_id
    }

    pub fn url(&self) -> Option<&str> {
        self.attributes.get("url").and_then(Value::as_str)
    }

    pub fn description(&self) -> Option<&str> {
        self.attributes.get("description").and_then(Value::as_str)
    }

    pub fn is_destroyed(&self) -> bool {
        self.liveness == Liveness::Destroyed
    }

    fn path(&self) -> Result<String, Error> {
        self.liveness.ensure_active("match attachment")?;
        Ok(format!(
            "tournaments/{}/matches/{}/attachments/{}.json",
            self.tournament_id,
            self.match_id,
            self.id()?
        ))
    }

    pub async fn attributes(&mut self) -> Result<&Snapshot, Error> {
        let path = self.path()?;
        let body = self.connection.get(&path, vec![]).await?;
        self.attributes = unwrap_entity(&body, ENTITY, &path)?;
        Ok(&self.attributes)
    }

    pub async fn update(&mut self, args: &Value) -> Result<&Snapshot, Error> {
        let path = self.path()?;
        let fields = ATTACHMENT.validate(args)?;
        let body = self.connection.put(&path, &envelope(ENTITY, fields)).await?;
        self.attributes = unwrap_entity(&body, ENTITY, &path)?;
        Ok(&self.attributes)
    }

    pub async fn destroy(&mut self) -> Result<(), Error> {
        let path = self.path()?;
        let body = self.connection.delete(&path).await?;
        if let Some(snapshot) = try_unwrap_entity(&body, ENTITY) {
            self.attributes = snapshot;
        }
        self.liveness = Liveness::Destroyed;
        Ok(())
    }
}
