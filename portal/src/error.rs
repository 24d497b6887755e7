use thiserror::Error;
use voto_client::ApiError;
use voto_session::SessionError;
use voto_tally::TallyError;
use voto_types::ErrorKind;

#[derive(Debug, Error)]
pub enum PortalError {
    #[error("config error: {0}")]
    Config(String),

    #[error("session error: {0}")]
    Session(#[from] SessionError),

    #[error("tally error: {0}")]
    Tally(#[from] TallyError),

    #[error("election service error: {0}")]
    Api(#[from] ApiError),

    #[error("you have already voted")]
    AlreadyVoted,
}

impl PortalError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Validation,
            Self::Session(e) => e.kind(),
            Self::Tally(e) => e.kind(),
            Self::Api(e) => e.kind(),
            Self::AlreadyVoted => ErrorKind::Conflict,
        }
    }
}
