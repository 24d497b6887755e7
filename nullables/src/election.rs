//! Nullable election service: an in-memory stand-in for the remote API.
//!
//! Behaves like the real service for accounts, tokens, the one-vote rule
//! and tallies, and lets tests add latency, take it offline, or inject a
//! failure into the next call to a given endpoint.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use voto_client::{ApiError, ElectionApi};
use voto_types::{
    AuthPayload, Candidate, CandidateId, Credentials, ElectionResults, RegisterData,
    SessionToken, Timestamp, User, UserId, Vote, VoteId,
};

use crate::fixtures;

/// Service endpoints, for call accounting and failure injection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Login,
    Register,
    Logout,
    CurrentUser,
    Candidates,
    CastVote,
    Results,
    HasVoted,
}

/// One call the service received.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedCall {
    pub endpoint: Endpoint,
    /// Bearer token presented with the call, if any.
    pub token: Option<String>,
}

struct Account {
    user: User,
    password: String,
}

struct ServiceState {
    accounts: Vec<Account>,
    tokens: HashMap<String, UserId>,
    candidates: Vec<Candidate>,
    votes: Vec<Vote>,
    /// Votes by voters outside the test, per candidate.
    external_votes: HashMap<CandidateId, u64>,
    voting_open: bool,
    finalized: bool,
    offline: bool,
    latency: Option<Duration>,
    injected: VecDeque<(Endpoint, ApiError)>,
    scripted_results: VecDeque<ElectionResults>,
    /// Accept casts without returning the recorded vote.
    omit_receipts: bool,
    /// `has-voted` answers `false` regardless, as a lagging replica would.
    status_lag: bool,
    calls: Vec<RecordedCall>,
    /// Logical server clock; ticks on every state change.
    revision: u64,
    next_user_id: u64,
    next_token: u64,
}

/// An in-memory election service.
pub struct NullElectionApi {
    state: Mutex<ServiceState>,
}

const BASE_TIME_MS: u64 = 1_700_000_000_000;

impl NullElectionApi {
    /// An open election with no candidates and no accounts.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ServiceState {
                accounts: Vec::new(),
                tokens: HashMap::new(),
                candidates: Vec::new(),
                votes: Vec::new(),
                external_votes: HashMap::new(),
                voting_open: true,
                finalized: false,
                offline: false,
                latency: None,
                injected: VecDeque::new(),
                scripted_results: VecDeque::new(),
                omit_receipts: false,
                status_lag: false,
                calls: Vec::new(),
                revision: 0,
                next_user_id: 1,
                next_token: 1,
            }),
        }
    }

    /// An open election over [`fixtures::ballot`].
    pub fn with_ballot() -> Self {
        let api = Self::new();
        api.set_candidates(fixtures::ballot());
        api
    }

    fn state(&self) -> MutexGuard<'_, ServiceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Setup ───────────────────────────────────────────────────────────

    pub fn set_candidates(&self, candidates: Vec<Candidate>) {
        let mut s = self.state();
        s.candidates = candidates;
        s.revision += 1;
    }

    /// Register an account with the next free id.
    pub fn add_user(&self, name: &str, email: &str, password: &str) -> User {
        let id = self.state().next_user_id;
        self.add_user_with_id(id, name, email, password)
    }

    pub fn add_user_with_id(&self, id: u64, name: &str, email: &str, password: &str) -> User {
        let user = fixtures::user(id, name, email);
        let mut s = self.state();
        s.next_user_id = s.next_user_id.max(id + 1);
        s.accounts.push(Account {
            user: user.clone(),
            password: password.to_string(),
        });
        user
    }

    /// Issue a token for an existing account without going through login.
    pub fn issue_token(&self, user_id: UserId) -> SessionToken {
        let mut s = self.state();
        Self::mint_token(&mut s, user_id)
    }

    /// Record a vote from a voter outside the test (another citizen).
    pub fn cast_external_vote(&self, candidate_id: CandidateId) {
        let mut s = self.state();
        *s.external_votes.entry(candidate_id).or_default() += 1;
        s.revision += 1;
    }

    pub fn set_voting_open(&self, open: bool) {
        self.state().voting_open = open;
    }

    pub fn set_finalized(&self, finalized: bool) {
        let mut s = self.state();
        s.finalized = finalized;
        s.voting_open = !finalized;
        s.revision += 1;
    }

    /// Make every call fail with a transient network error.
    pub fn set_offline(&self, offline: bool) {
        self.state().offline = offline;
    }

    /// Delay every call by `latency` (tokio time, so paused clocks work).
    pub fn set_latency(&self, latency: Duration) {
        self.state().latency = Some(latency);
    }

    /// Fail the next call to `endpoint` with `error`.
    pub fn fail_next(&self, endpoint: Endpoint, error: ApiError) {
        self.state().injected.push_back((endpoint, error));
    }

    /// Accept votes with a bare `success` and no vote payload.
    pub fn omit_vote_receipts(&self, omit: bool) {
        self.state().omit_receipts = omit;
    }

    /// Make `has-voted` report `false` for everyone until turned off.
    pub fn set_status_lag(&self, lagging: bool) {
        self.state().status_lag = lagging;
    }

    /// Answer the next results call with `results` verbatim.
    pub fn script_results(&self, results: ElectionResults) {
        self.state().scripted_results.push_back(results);
    }

    /// Invalidate every issued token.
    pub fn revoke_all_tokens(&self) {
        self.state().tokens.clear();
    }

    // ── Inspection ──────────────────────────────────────────────────────

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state().calls.clone()
    }

    pub fn calls_to(&self, endpoint: Endpoint) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| c.endpoint == endpoint)
            .count()
    }

    /// Votes accepted through `cast_vote`.
    pub fn accepted_votes(&self) -> Vec<Vote> {
        self.state().votes.clone()
    }

    /// The tally as the service would report it right now.
    pub fn current_results(&self) -> ElectionResults {
        Self::tally(&self.state())
    }

    // ── Internals ───────────────────────────────────────────────────────

    fn now(s: &ServiceState) -> Timestamp {
        Timestamp::from_millis(BASE_TIME_MS + s.revision)
    }

    fn mint_token(s: &mut ServiceState, user_id: UserId) -> SessionToken {
        let raw = format!("null-token-{}", s.next_token);
        s.next_token += 1;
        s.tokens.insert(raw.clone(), user_id);
        SessionToken::new(raw)
    }

    fn tally(s: &ServiceState) -> ElectionResults {
        let candidates: Vec<Candidate> = s
            .candidates
            .iter()
            .map(|c| {
                let own = s.votes.iter().filter(|v| v.candidate_id == c.id).count() as u64;
                let external = s.external_votes.get(&c.id).copied().unwrap_or(0);
                Candidate {
                    votes: Some(own + external),
                    ..c.clone()
                }
            })
            .collect();
        let mut results = ElectionResults {
            total_votes: candidates.iter().map(Candidate::vote_count).sum(),
            candidates,
            last_updated: Self::now(s),
            is_finalized: s.finalized,
        };
        results.fill_percentages();
        results
    }

    fn user_for_token(s: &ServiceState, token: &SessionToken) -> Result<User, ApiError> {
        let id = s
            .tokens
            .get(token.expose())
            .ok_or_else(|| ApiError::Auth("token inválido".into()))?;
        s.accounts
            .iter()
            .find(|a| a.user.id == *id)
            .map(|a| a.user.clone())
            .ok_or_else(|| ApiError::Auth("token inválido".into()))
    }

    /// Common prologue: latency, call accounting, outages, injected failures.
    async fn enter(&self, endpoint: Endpoint, token: Option<&SessionToken>) -> Result<(), ApiError> {
        let latency = self.state().latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let mut s = self.state();
        s.calls.push(RecordedCall {
            endpoint,
            token: token.map(|t| t.expose().to_string()),
        });
        if s.offline {
            return Err(ApiError::Network("election service unreachable".into()));
        }
        if let Some(pos) = s.injected.iter().position(|(e, _)| *e == endpoint) {
            if let Some((_, error)) = s.injected.remove(pos) {
                return Err(error);
            }
        }
        Ok(())
    }
}

impl Default for NullElectionApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ElectionApi for NullElectionApi {
    async fn login(&self, credentials: &Credentials) -> Result<AuthPayload, ApiError> {
        self.enter(Endpoint::Login, None).await?;
        let mut s = self.state();
        let user = s
            .accounts
            .iter()
            .find(|a| a.user.email == credentials.email && a.password == credentials.password)
            .map(|a| a.user.clone())
            .ok_or_else(|| ApiError::Auth("credenciales inválidas".into()))?;
        let token = Self::mint_token(&mut s, user.id);
        Ok(AuthPayload { user, token })
    }

    async fn register(&self, data: &RegisterData) -> Result<AuthPayload, ApiError> {
        self.enter(Endpoint::Register, None).await?;
        if data.password != data.confirm_password {
            return Err(ApiError::Rejected("las contraseñas no coinciden".into()));
        }
        let mut s = self.state();
        if s.accounts.iter().any(|a| a.user.email == data.email) {
            return Err(ApiError::Conflict("email ya registrado".into()));
        }
        let mut user = fixtures::user(s.next_user_id, &data.name, &data.email);
        user.national_id = Some(data.dni.clone());
        s.next_user_id += 1;
        s.accounts.push(Account {
            user: user.clone(),
            password: data.password.clone(),
        });
        let token = Self::mint_token(&mut s, user.id);
        Ok(AuthPayload { user, token })
    }

    async fn logout(&self, token: &SessionToken) -> Result<(), ApiError> {
        self.enter(Endpoint::Logout, Some(token)).await?;
        self.state().tokens.remove(token.expose());
        Ok(())
    }

    async fn current_user(&self, token: &SessionToken) -> Result<User, ApiError> {
        self.enter(Endpoint::CurrentUser, Some(token)).await?;
        Self::user_for_token(&self.state(), token)
    }

    async fn candidates(&self) -> Result<Vec<Candidate>, ApiError> {
        self.enter(Endpoint::Candidates, None).await?;
        Ok(self.state().candidates.clone())
    }

    async fn cast_vote(
        &self,
        token: &SessionToken,
        candidate_id: CandidateId,
        user_id: UserId,
    ) -> Result<Option<Vote>, ApiError> {
        self.enter(Endpoint::CastVote, Some(token)).await?;
        let mut s = self.state();
        let voter = Self::user_for_token(&s, token)?;
        if voter.id != user_id {
            return Err(ApiError::Auth("el token no corresponde al usuario".into()));
        }
        if !s.voting_open {
            return Err(ApiError::Conflict("la votación está cerrada".into()));
        }
        if !s.candidates.iter().any(|c| c.id == candidate_id) {
            return Err(ApiError::Rejected("candidato inexistente".into()));
        }
        if s.votes.iter().any(|v| v.user_id == user_id) {
            return Err(ApiError::Conflict("ya votaste".into()));
        }

        s.revision += 1;
        let vote = Vote {
            id: VoteId::new(s.votes.len() as u64 + 1),
            candidate_id,
            user_id,
            timestamp: Self::now(&s),
            verified: true,
        };
        s.votes.push(vote.clone());
        if let Some(account) = s.accounts.iter_mut().find(|a| a.user.id == user_id) {
            account.user.mark_voted();
        }
        Ok((!s.omit_receipts).then_some(vote))
    }

    async fn results(&self) -> Result<ElectionResults, ApiError> {
        self.enter(Endpoint::Results, None).await?;
        let mut s = self.state();
        let scripted = s.scripted_results.pop_front();
        Ok(scripted.unwrap_or_else(|| Self::tally(&s)))
    }

    async fn has_voted(&self, token: &SessionToken, user_id: UserId) -> Result<bool, ApiError> {
        self.enter(Endpoint::HasVoted, Some(token)).await?;
        let s = self.state();
        Self::user_for_token(&s, token)?;
        Ok(!s.status_lag && s.votes.iter().any(|v| v.user_id == user_id))
    }
}
