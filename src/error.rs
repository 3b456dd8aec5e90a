use thiserror::Error;

#[derive(Error, Debug)]
pub enum MatchError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{}", remote_message(.status, .message))]
    RemoteFailure {
        status: Option<u16>,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn remote_message(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("Remote store error ({}): {}", code, message),
        None => format!("Remote store error: {}", message),
    }
}

/// Transport failures (connect, timeout, body decode) are remote failures too.
impl From<reqwest::Error> for MatchError {
    fn from(err: reqwest::Error) -> Self {
        MatchError::RemoteFailure {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

impl MatchError {
    pub fn remote(status: Option<u16>, message: impl Into<String>) -> Self {
        MatchError::RemoteFailure {
            status,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, MatchError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, MatchError>;
