use std::time::Duration;

use thiserror::Error;

/// Failures of a client round-trip. Local state is never changed when one occurs.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    #[error("todo item not found")]
    NotFound,

    #[error("server responded {status}: {message}")]
    Api { status: u16, message: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("todo item {0} already has a request in flight")]
    Busy(i64),

    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::Decode(e.to_string())
        } else {
            ClientError::Transport(e.to_string())
        }
    }
}
