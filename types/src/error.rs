//! Error taxonomy shared across crates.

use thiserror::Error;

/// How a failure should be treated by the portal.
///
/// Every crate-level error maps onto exactly one kind, which decides the
/// user-visible message and whether the session or cached data survive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Input rejected on the client before any network call.
    Validation,
    /// Invalid credentials or an expired/invalid token.
    Auth,
    /// Duplicate vote, voting closed, or a vote already in flight.
    Conflict,
    /// Timeout or connectivity failure; safe to retry on the next poll.
    Transient,
    /// The server rejected the request for another reason or answered
    /// with something unreadable.
    Unexpected,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Auth => "auth",
            Self::Conflict => "conflict",
            Self::Transient => "transient",
            Self::Unexpected => "unexpected",
        }
    }
}

/// Client-side input validation failures. Never sent to the server.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("email address {0:?} is not valid")]
    InvalidEmail(String),

    #[error("passwords do not match")]
    PasswordMismatch,
}
