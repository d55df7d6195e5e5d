use thiserror::Error;

/// Failure talking to the booking backend
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Backend returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("Could not decode response: {0}")]
    Decode(String),

    #[error("Invalid transport configuration: {0}")]
    Config(String),

    #[error("Request task ended early: {0}")]
    Aborted(String),
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        TransportError::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
