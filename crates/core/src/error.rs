//! Error types for the core library

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The request never produced a response (unreachable host, timeout, ...)
    #[error("Network error: {0}")]
    Transport(String),

    /// The service answered with a non-success HTTP status
    #[error("{message}")]
    Status { status: u16, message: String },

    /// Success status, but the envelope reports a business failure
    #[error("{0}")]
    Application(String),

    /// The envelope claimed success but its payload was missing or unreadable
    #[error("Unexpected response: {0}")]
    InvalidResponse(String),

    /// Rejected locally before any request was made
    #[error("{0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Broad failure class, used by callers that react differently to
/// connectivity problems and to rejected input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Protocol,
    Application,
    Validation,
    Local,
}

impl Error {
    /// Create a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an Application error
    pub fn application(message: impl Into<String>) -> Self {
        Self::Application(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(_) => ErrorKind::Transport,
            Self::Status { .. } | Self::InvalidResponse(_) => ErrorKind::Protocol,
            Self::Application(_) => ErrorKind::Application,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Storage(_) | Self::Io(_) | Self::Serialization(_) => ErrorKind::Local,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}
