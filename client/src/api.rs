//! The election service contract.

use async_trait::async_trait;
use voto_types::{
    AuthPayload, Candidate, CandidateId, Credentials, ElectionResults, RegisterData,
    SessionToken, User, UserId, Vote,
};

use crate::ApiError;

/// Operations the portal core needs from the remote election service.
///
/// Implementations must not retry on their own: the caller decides what a
/// failure means, and a vote in particular must never be resent.
#[async_trait]
pub trait ElectionApi: Send + Sync {
    /// `POST auth/login`.
    async fn login(&self, credentials: &Credentials) -> Result<AuthPayload, ApiError>;

    /// `POST auth/register`.
    async fn register(&self, data: &RegisterData) -> Result<AuthPayload, ApiError>;

    /// `POST auth/logout`. Revokes `token` on the service side.
    async fn logout(&self, token: &SessionToken) -> Result<(), ApiError>;

    /// `GET auth/me`. Resolves a token to its user; used to validate a
    /// persisted session at startup.
    async fn current_user(&self, token: &SessionToken) -> Result<User, ApiError>;

    /// `GET candidates`.
    async fn candidates(&self) -> Result<Vec<Candidate>, ApiError>;

    /// `POST votes/cast`. `None` when the service accepted the vote without
    /// returning it.
    async fn cast_vote(
        &self,
        token: &SessionToken,
        candidate_id: CandidateId,
        user_id: UserId,
    ) -> Result<Option<Vote>, ApiError>;

    /// `GET votes/results`.
    async fn results(&self) -> Result<ElectionResults, ApiError>;

    /// `GET votes/has-voted/{userId}`.
    async fn has_voted(&self, token: &SessionToken, user_id: UserId) -> Result<bool, ApiError>;
}
