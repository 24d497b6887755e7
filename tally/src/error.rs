use thiserror::Error;
use voto_client::ApiError;
use voto_types::{ErrorKind, UserId};

#[derive(Debug, Error)]
pub enum TallyError {
    #[error("no authenticated session")]
    NotAuthenticated,

    #[error("session belongs to user {session}, not {requested}")]
    SessionMismatch { session: UserId, requested: UserId },

    /// A cast for this user is already on its way to the service.
    #[error("a vote for user {0} is already in flight")]
    VoteInProgress(UserId),

    /// `counted` is `None` when the candidate counts overflow.
    #[error("inconsistent tally: total {total} does not match the candidate counts ({counted:?})")]
    InconsistentSnapshot { total: u64, counted: Option<u64> },

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl TallyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotAuthenticated | Self::SessionMismatch { .. } => ErrorKind::Auth,
            Self::VoteInProgress(_) => ErrorKind::Conflict,
            Self::InconsistentSnapshot { .. } => ErrorKind::Unexpected,
            Self::Api(e) => e.kind(),
        }
    }

    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::NotAuthenticated => "Please log in to vote".to_string(),
            Self::SessionMismatch { .. } => "You can only vote as the logged-in user".to_string(),
            Self::VoteInProgress(_) => "Your vote is already being processed".to_string(),
            Self::InconsistentSnapshot { .. } => {
                "Unexpected response from the election service".to_string()
            }
            Self::Api(e) => e.user_message(),
        }
    }
}
