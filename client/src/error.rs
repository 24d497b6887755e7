use thiserror::Error;
use voto_types::{ErrorKind, ValidationError};

/// Failure of a call against the election service.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("authentication failed: {0}")]
    Auth(String),

    /// Duplicate vote, voting closed. The message is the service's own.
    #[error("{0}")]
    Conflict(String),

    #[error("connection error: {0}")]
    Network(String),

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("invalid response: {0}")]
    Protocol(String),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Auth(_) => ErrorKind::Auth,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Network(_) => ErrorKind::Transient,
            Self::Rejected(_) | Self::Protocol(_) => ErrorKind::Unexpected,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }

    /// Message suitable for showing to the user.
    ///
    /// Service messages are passed through verbatim; transport details
    /// collapse to a generic connection error.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::Auth(msg) | Self::Conflict(msg) | Self::Rejected(msg) => msg.clone(),
            Self::Network(_) => "Connection error, please try again".to_string(),
            Self::Protocol(_) => "Unexpected response from the election service".to_string(),
        }
    }
}
