use thiserror::Error;
use voto_client::ApiError;
use voto_types::ErrorKind;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("an authentication request is already in progress")]
    AuthenticationInProgress,

    #[error("no authenticated session")]
    NotAuthenticated,

    #[error("session was closed before the request completed")]
    Superseded,

    #[error("cannot apply {event} while {state}")]
    IllegalTransition {
        state: &'static str,
        event: &'static str,
    },

    #[error("session store error: {0}")]
    Store(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AuthenticationInProgress => ErrorKind::Conflict,
            Self::NotAuthenticated | Self::Superseded => ErrorKind::Auth,
            Self::IllegalTransition { .. } | Self::Store(_) => ErrorKind::Unexpected,
            Self::Api(e) => e.kind(),
        }
    }
}
