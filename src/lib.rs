//! Client for the Challonge v1 REST API.
//!
//! Arguments are checked locally before anything is sent: a rejected field
//! never costs a request. Match winners are derived from the game scores.
//!
//! ```no_run
//! use challonge::{Client, MatchFilter};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), challonge::Error> {
//! let client = Client::new("my-api-key")?;
//! let mut tournament = client
//!     .create_tournament(&json!({"name": "Friday Cup", "url": "friday_cup"}))
//!     .await?;
//! tournament.create_participant(&json!({"name": "Alice"})).await?;
//! tournament.create_participant(&json!({"name": "Bob"})).await?;
//! tournament.start().await?;
//!
//! for mut game in tournament.matches(&MatchFilter::default()).await? {
//!     game.update_scores(&["3-1", "2-3", "3-0"]).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod attachment;
pub mod client;
pub mod config;
pub mod error;
pub mod matches;
pub mod participant;
pub mod score;
pub mod tournament;
pub mod transport;
pub mod types;
pub mod validate;

#[cfg(test)]
mod testing;

pub use attachment::Attachment;
pub use client::Client;
pub use config::Config;
pub use error::Error;
pub use matches::Match;
pub use participant::Participant;
pub use tournament::Tournament;
pub use transport::{Credential, HttpTransport, Response, Transport};
pub use types::{
    IndexState, Liveness, MatchFilter, MatchState, Snapshot, TournamentFilter, TournamentState,
};
