#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Request(#[from] reqwest::Error),

    #[error(transparent)]
    EnvVar(#[from] EnvVarError),

    #[error("JSON serialization error: {0}")]
    JSON(#[from] JSONError),

    #[error("invalid value for `{field}`: {reason}")]
    Validation { field: String, reason: String },

    #[error("expected a mapping of field names to values, got {found}")]
    NotAMapping { found: &'static str },

    #[error("request failed with status {status}: {}", .messages.join("; "))]
    Remote { status: u16, messages: Vec<String> },

    #[error("{entity} has been destroyed")]
    Destroyed { entity: &'static str },

    #[error("{entity} snapshot has no `{field}` attribute")]
    MissingAttribute {
        entity: &'static str,
        field: &'static str,
    },
}

impl Error {
    pub(crate) fn validation(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
#[error("{source} ({var})")]
pub struct EnvVarError {
    var: String,
    #[source]
    source: std::env::VarError,
}

impl EnvVarError {
    pub fn new(var: &str, source: std::env::VarError) -> Self {
        Self {
            var: var.into(),
            source,
        }
    }
}

#[derive(thiserror::Error, Debug)]
#[error("{source} ({path})")]
pub struct JSONError {
    path: String,
    #[source]
    source: serde_json::Error,
}

impl JSONError {
    /// `path` is the request path whose body failed to parse.
    pub fn new(path: &str, source: serde_json::Error) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}
