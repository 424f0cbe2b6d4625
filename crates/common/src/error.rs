//! Unified error type for the robot dashboard.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Network failure, timeout, or a non-2xx HTTP response.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The HTTP call succeeded but the body is not valid JSON.
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The platform answered with a valid envelope that signals failure.
    #[error("Remote error (code={code}): {message}")]
    Remote { code: i64, message: String },

    #[error("No strategy matching '{0}' found")]
    StrategyNotFound(String),

    #[error("Exchange not found: {0}")]
    ExchangeNotFound(String),

    #[error("Credential not found: {0}")]
    CredentialNotFound(i64),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// True for failures that never reached a decodable response.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}
