use std::env;

use crate::error::{EnvVarError, Error};
use crate::transport::{Credential, DEFAULT_BASE_URL};
use crate::types::TournamentState;

pub const API_KEY_VAR: &str = "CHALLONGE_API_KEY";
pub const BASE_URL_VAR: &str = "CHALLONGE_BASE_URL";
pub const RESET_STATE_VAR: &str = "CHALLONGE_RESET_STATE";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub credential: Credential,
    pub base_url: String,
    /// State a tournament records after `reset` when the server sends no snapshot.
    pub reset_state: TournamentState,
}

impl Config {
    pub fn new(api_key: impl Into<Credential>) -> Self {
        Self {
            credential: api_key.into(),
            base_url: DEFAULT_BASE_URL.into(),
            reset_state: TournamentState::Ended,
        }
    }

    // requires CHALLONGE_API_KEY env var
    // can use dotenv
    pub fn from_env() -> Result<Self, Error> {
        let api_key = env::var(API_KEY_VAR).map_err(|e| EnvVarError::new(API_KEY_VAR, e))?;
        let mut config = Self::new(api_key);

        if let Ok(base_url) = env::var(BASE_URL_VAR) {
            config.base_url = base_url;
        }
        if let Ok(state) = env::var(RESET_STATE_VAR) {
            config.reset_state = state.parse().map_err(|_| {
                Error::validation(RESET_STATE_VAR, format!("`{state}` is not a tournament state"))
            })?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_from_env() {
        env::remove_var(API_KEY_VAR);
        env::remove_var(BASE_URL_VAR);
        assert!(matches!(Config::from_env(), Err(Error::EnvVar(_))));

        dotenv::from_filename(".env.example").ok();
        let config = Config::from_env().unwrap();
        assert_eq!(config.credential, Credential::from("asdf1234"));
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.reset_state, TournamentState::Ended);

        env::set_var(RESET_STATE_VAR, "pending");
        assert_eq!(
            Config::from_env().unwrap().reset_state,
            TournamentState::Pending
        );

        env::set_var(RESET_STATE_VAR, "reopened");
        assert!(matches!(
            Config::from_env(),
            Err(Error::Validation { ref field, .. }) if field == RESET_STATE_VAR
        ));
        env::remove_var(RESET_STATE_VAR);
    }
}
