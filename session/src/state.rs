//! Session states and the transition function between them.

use serde::{Deserialize, Serialize};
use voto_types::{AuthPayload, SessionToken, User};

use crate::SessionError;

/// An authenticated user together with their bearer token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: User,
    pub token: SessionToken,
}

impl From<AuthPayload> for Session {
    fn from(payload: AuthPayload) -> Self {
        Self {
            user: payload.user,
            token: payload.token,
        }
    }
}

/// Where the authentication lifecycle currently is.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AuthState {
    #[default]
    Anonymous,
    Authenticating,
    Authenticated(Session),
    /// Last attempt failed; holds the message to show the user.
    Failed(String),
}

/// Inputs to [`AuthState::apply`].
#[derive(Clone, Debug)]
pub enum AuthEvent {
    /// A login, registration or restore request was issued.
    Started,
    Succeeded(AuthPayload),
    Rejected(String),
    /// An in-flight attempt ended without a verdict (e.g. a persisted
    /// session could not be checked).
    Abandoned,
    ErrorCleared,
    LoggedOut,
    /// The authenticated user cast their vote.
    Voted,
}

impl AuthEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Succeeded(_) => "succeeded",
            Self::Rejected(_) => "rejected",
            Self::Abandoned => "abandoned",
            Self::ErrorCleared => "error-cleared",
            Self::LoggedOut => "logged-out",
            Self::Voted => "voted",
        }
    }
}

impl AuthState {
    /// Compute the state that follows `event`.
    ///
    /// | from | event | to |
    /// |---|---|---|
    /// | Anonymous, Failed, Authenticated | Started | Authenticating |
    /// | Authenticating | Succeeded | Authenticated |
    /// | Authenticating | Rejected | Failed |
    /// | Authenticating | Abandoned | Anonymous |
    /// | Failed | ErrorCleared | Anonymous |
    /// | any | LoggedOut | Anonymous |
    /// | Authenticated | Voted | Authenticated (user marked as voted) |
    ///
    /// Every other pair is illegal and leaves `self` untouched.
    pub fn apply(&self, event: AuthEvent) -> Result<AuthState, SessionError> {
        match (self, event) {
            (Self::Authenticating, AuthEvent::Started) => Err(SessionError::AuthenticationInProgress),
            (_, AuthEvent::Started) => Ok(Self::Authenticating),
            (Self::Authenticating, AuthEvent::Succeeded(payload)) => {
                Ok(Self::Authenticated(payload.into()))
            }
            (Self::Authenticating, AuthEvent::Rejected(message)) => Ok(Self::Failed(message)),
            (Self::Authenticating, AuthEvent::Abandoned) => Ok(Self::Anonymous),
            (Self::Failed(_), AuthEvent::ErrorCleared) => Ok(Self::Anonymous),
            (_, AuthEvent::LoggedOut) => Ok(Self::Anonymous),
            (Self::Authenticated(session), AuthEvent::Voted) => {
                let mut session = session.clone();
                session.user.mark_voted();
                Ok(Self::Authenticated(session))
            }
            (state, event) => Err(SessionError::IllegalTransition {
                state: state.name(),
                event: event.name(),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::Authenticating => "authenticating",
            Self::Authenticated(_) => "authenticated",
            Self::Failed(_) => "failed",
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voto_types::UserId;

    fn payload() -> AuthPayload {
        AuthPayload {
            user: User {
                id: UserId::new(7),
                name: "Ana".into(),
                email: "ana@x.com".into(),
                national_id: None,
                has_voted: false,
                is_admin: false,
            },
            token: SessionToken::new("t-1"),
        }
    }

    fn authenticated() -> AuthState {
        AuthState::Authenticating
            .apply(AuthEvent::Succeeded(payload()))
            .unwrap()
    }

    #[test]
    fn happy_path_reaches_authenticated() {
        let state = AuthState::Anonymous.apply(AuthEvent::Started).unwrap();
        assert_eq!(state, AuthState::Authenticating);
        let state = state.apply(AuthEvent::Succeeded(payload())).unwrap();
        assert!(state.is_authenticated());
        assert_eq!(state.session().unwrap().user.id, UserId::new(7));
    }

    #[test]
    fn second_start_is_rejected_while_authenticating() {
        let err = AuthState::Authenticating
            .apply(AuthEvent::Started)
            .unwrap_err();
        assert!(matches!(err, SessionError::AuthenticationInProgress));
    }

    #[test]
    fn rejection_then_clear_returns_to_anonymous() {
        let failed = AuthState::Authenticating
            .apply(AuthEvent::Rejected("credenciales inválidas".into()))
            .unwrap();
        assert_eq!(failed.error(), Some("credenciales inválidas"));
        assert_eq!(failed.apply(AuthEvent::ErrorCleared).unwrap(), AuthState::Anonymous);
    }

    #[test]
    fn retry_from_failed_is_allowed() {
        let failed = AuthState::Failed("x".into());
        assert_eq!(failed.apply(AuthEvent::Started).unwrap(), AuthState::Authenticating);
    }

    #[test]
    fn logout_is_legal_from_every_state() {
        for state in [
            AuthState::Anonymous,
            AuthState::Authenticating,
            authenticated(),
            AuthState::Failed("x".into()),
        ] {
            assert_eq!(state.apply(AuthEvent::LoggedOut).unwrap(), AuthState::Anonymous);
        }
    }

    #[test]
    fn success_without_pending_request_is_illegal() {
        let err = AuthState::Anonymous
            .apply(AuthEvent::Succeeded(payload()))
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::IllegalTransition {
                state: "anonymous",
                event: "succeeded"
            }
        ));
    }

    #[test]
    fn voted_marks_user_and_keeps_token() {
        let state = authenticated().apply(AuthEvent::Voted).unwrap();
        let session = state.session().unwrap();
        assert!(session.user.has_voted);
        assert_eq!(session.token.expose(), "t-1");
    }

    #[test]
    fn voted_requires_authenticated_session() {
        assert!(AuthState::Anonymous.apply(AuthEvent::Voted).is_err());
    }
}
