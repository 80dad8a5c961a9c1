use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FbaError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A user-facing input problem, reported before any remote call is made.
    #[error("{0}")]
    MissingInput(String),

    #[error("No such method: {0}")]
    NoSuchMethod(String),

    #[error("Authentication required: {0}")]
    Unauthorized(String),

    /// An error envelope returned verbatim by the remote service.
    #[error("Remote error {code}: {message}")]
    Remote {
        code: i32,
        message: String,
        data: Option<Value>,
    },

    #[error("Server error: {0}")]
    Server(String),

    #[error("Record error: {0}")]
    Record(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<std::net::AddrParseError> for FbaError {
    fn from(err: std::net::AddrParseError) -> Self {
        FbaError::InvalidRequest(err.to_string())
    }
}

impl From<hyper::Error> for FbaError {
    fn from(err: hyper::Error) -> Self {
        FbaError::Transport(err.to_string())
    }
}

impl From<hyper::http::Error> for FbaError {
    fn from(err: hyper::http::Error) -> Self {
        FbaError::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FbaError>;
