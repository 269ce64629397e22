use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, info};

use crate::attachment::Attachment;
use crate::error::Error;
use crate::score::{self, Outcome, TIE};
use crate::transport::{Connection, Credential, Transport};
use crate::types::{envelope, snapshot_id, unwrap_entities, unwrap_entity, Snapshot};
use crate::validate::{validate_match, ATTACHMENT};

const ENTITY: &str = "match";

/// A match inside a tournament. Results are reported through
/// [`Match::update`]; the winner is always worked out from the scores.
#[derive(Clone, Debug)]
pub struct Match {
    attributes: Snapshot,
    tournament_id: u64,
    connection: Connection,
}

impl Match {
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

    pub fn player1_id(&self) -> Option<u64> {
        snapshot_id(&self.attributes, ENTITY, "player1_id").ok()
    }

    pub fn player2_id(&self) -> Option<u64> {
        snapshot_id(&self.attributes, ENTITY, "player2_id").ok()
    }

    pub fn state(&self) -> Option<&str> {
        self.attributes.get("state").and_then(Value::as_str)
    }

    fn path(&self, suffix: &str) -> Result<String, Error> {
        Ok(format!(
            "tournaments/{}/matches/{}{suffix}.json",
            self.tournament_id,
            self.id()?
        ))
    }

    /// Always a round trip; the cached snapshot is replaced.
    pub async fn attributes(&mut self) -> Result<&Snapshot, Error> {
        let path = self.path("")?;
        let body = self.connection.get(&path, vec![]).await?;
        self.attributes = unwrap_entity(&body, ENTITY, &path)?;
        Ok(&self.attributes)
    }

    /// Reports a result. `args` is either a list of `x-y` game scores or a
    /// mapping with `scores_csv` and optional `player1_votes`/`player2_votes`.
    pub async fn update(&mut self, args: &Value) -> Result<&Snapshot, Error> {
        let path = self.path("")?;
        let update = validate_match(args)?;
        let winner_id = self.winner_id(score::resolve(&update.scores))?;
        debug!(
            scores_csv = %update.scores_csv,
            winner_id = %winner_id,
            "resolved match winner"
        );

        let mut fields = update.votes;
        fields.insert("scores_csv".into(), update.scores_csv.into());
        fields.insert("winner_id".into(), winner_id);

        let body = self.connection.put(&path, &envelope(ENTITY, fields)).await?;
        self.attributes = unwrap_entity(&body, ENTITY, &path)?;
        info!(
            id = self.id().ok(),
            tournament_id = self.tournament_id,
            "match result reported"
        );
        Ok(&self.attributes)
    }

    pub async fn update_scores<S: AsRef<str>>(&mut self, scores: &[S]) -> Result<&Snapshot, Error> {
        let scores: Vec<Value> = scores.iter().map(|s| s.as_ref().into()).collect();
        self.update(&Value::Array(scores)).await
    }

    fn winner_id(&self, outcome: Outcome) -> Result<Value, Error> {
        let field = match outcome {
            Outcome::Tie => return Ok(TIE.into()),
            Outcome::Player1 => "player1_id",
            Outcome::Player2 => "player2_id",
        };
        match self.attributes.get(field) {
            Some(id) if !id.is_null() => Ok(id.clone()),
            _ => Err(Error::MissingAttribute {
                entity: ENTITY,
                field,
            }),
        }
    }

    pub async fn mark_as_underway(&mut self) -> Result<&Snapshot, Error> {
        self.post_action("mark_as_underway").await
    }

    pub async fn unmark_as_underway(&mut self) -> Result<&Snapshot, Error> {
        self.post_action("unmark_as_underway").await
    }

    /// Clears the result of this match and every match that depends on it.
    pub async fn reopen(&mut self) -> Result<&Snapshot, Error> {
        self.post_action("reopen").await
    }

    async fn post_action(&mut self, action: &str) -> Result<&Snapshot, Error> {
        let path = self.path(&format!("/{action}"))?;
        let body = self.connection.post(&path, &json!({})).await?;
        self.attributes = unwrap_entity(&body, ENTITY, &path)?;
        Ok(&self.attributes)
    }

    pub async fn attachments(&self) -> Result<Vec<Attachment>, Error> {
        let path = self.path("/attachments")?;
        let body = self.connection.get(&path, vec![]).await?;
        let match_id = self.id()?;
        Ok(unwrap_entities(&body, "match_attachment", &path)?
            .into_iter()
            .map(|snapshot| {
                Attachment::from_connection(
                    snapshot,
                    self.tournament_id,
                    match_id,
                    self.connection.clone(),
                )
            })
            .collect())
    }

    pub async fn attachment(&self, id: u64) -> Result<Attachment, Error> {
        let path = self.path(&format!("/attachments/{id}"))?;
        let body = self.connection.get(&path, vec![]).await?;
        self.wrap_attachment(&body, &path)
    }

    /// Needs at least a `url` or a `description`.
    pub async fn create_attachment(&self, args: &Value) -> Result<Attachment, Error> {
        let path = self.path("/attachments")?;
        let fields = ATTACHMENT.validate(args)?;
        if fields.is_empty() {
            return Err(Error::validation(
                "match_attachment",
                "needs a url or a description",
            ));
        }
        let body = self
            .connection
            .post(&path, &envelope("match_attachment", fields))
            .await?;
        self.wrap_attachment(&body, &path)
    }

    fn wrap_attachment(&self, body: &str, path: &str) -> Result<Attachment, Error> {
        Ok(Attachment::from_connection(
            unwrap_entity(body, "match_attachment", path)?,
            self.tournament_id,
            self.id()?,
            self.connection.clone(),
        ))
    }
}
