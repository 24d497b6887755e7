//! The portal composition root.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use voto_candidates::{CandidateFilter, CandidateFilterEngine, FilterUpdate};
use voto_client::{ElectionApi, HttpElectionApi};
use voto_session::{
    AuthSessionManager, AuthState, FileSessionStore, Session, SessionError, SessionStore,
};
use voto_tally::{RefreshOutcome, ResultsSynchronizer, SyncConfig, TallyError, TallySnapshot};
use voto_types::{
    Candidate, CandidateId, Clock, Credentials, ElectionResults, ErrorKind, Notification,
    Notifier, RegisterData, SystemClock, Vote,
};

use crate::{LogNotifier, PortalConfig, PortalError};

/// One citizen's view of the election.
pub struct VotingPortal {
    api: Arc<dyn ElectionApi>,
    notifier: Arc<dyn Notifier>,
    auth: AuthSessionManager,
    tally: ResultsSynchronizer,
    candidates: Mutex<CandidateFilterEngine>,
}

impl VotingPortal {
    pub fn new(
        api: Arc<dyn ElectionApi>,
        store: Arc<dyn SessionStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        sync: SyncConfig,
    ) -> Self {
        let auth = AuthSessionManager::new(Arc::clone(&api), store);
        let tally = ResultsSynchronizer::new(
            Arc::clone(&api),
            auth.handle(),
            Arc::clone(&notifier),
            clock,
            sync,
        );
        Self {
            api,
            notifier,
            auth,
            tally,
            candidates: Mutex::new(CandidateFilterEngine::default()),
        }
    }

    /// Wire the portal against the HTTP election service and the on-disk
    /// session file named in `config`.
    pub fn from_config(config: &PortalConfig) -> Result<Self, PortalError> {
        config.validate()?;
        let api = HttpElectionApi::with_timeouts(&config.api_url, config.http_timeouts())?;
        info!(api_url = %api.base_url(), "election service configured");
        Ok(Self::new(
            Arc::new(api),
            Arc::new(FileSessionStore::new(config.session_file.clone())),
            Arc::new(LogNotifier),
            Arc::new(SystemClock),
            config.sync_config(),
        ))
    }

    /// Resume a saved session, if the service still accepts it.
    ///
    /// An unreachable service is not fatal: the portal starts anonymous and
    /// the saved session is tried again next time.
    pub async fn start(&self) -> Result<Option<Session>, PortalError> {
        match self.auth.restore().await {
            Ok(session) => Ok(session),
            Err(e) if e.kind() == ErrorKind::Transient => {
                warn!(error = %e, "starting without session");
                self.notifier.notify(Notification::warning(
                    "Could not verify your saved session, please try again later",
                ));
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Stop background work.
    pub fn shutdown(&self) {
        self.tally.deactivate();
        debug!("portal shut down");
    }

    // ── Session ─────────────────────────────────────────────────────────

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, PortalError> {
        let credentials = Credentials::new(email, password);
        match self.auth.login(&credentials).await {
            Ok(session) => {
                self.notifier
                    .notify(Notification::success(format!("Welcome, {}", session.user.name)));
                Ok(session)
            }
            Err(e) => Err(self.auth_failed(e.into())),
        }
    }

    pub async fn register(&self, data: &RegisterData) -> Result<Session, PortalError> {
        match self.auth.register(data).await {
            Ok(session) => {
                self.notifier.notify(Notification::success(format!(
                    "Account created, welcome {}",
                    session.user.name
                )));
                Ok(session)
            }
            Err(e) => Err(self.auth_failed(e.into())),
        }
    }

    /// End the session. See [`AuthSessionManager::logout`] for the handle.
    pub fn logout(&self) -> Option<JoinHandle<()>> {
        let revocation = self.auth.logout();
        self.notifier.notify(Notification::info("You have been logged out"));
        revocation
    }

    pub fn clear_error(&self) {
        self.auth.clear_error();
    }

    pub fn session(&self) -> Option<Session> {
        self.auth.session()
    }

    pub fn auth_state(&self) -> AuthState {
        self.auth.state()
    }

    /// Report a failed login or registration. A request overtaken by a
    /// logout ends silently.
    fn auth_failed(&self, error: PortalError) -> PortalError {
        if matches!(error, PortalError::Session(SessionError::Superseded)) {
            debug!("authentication result dropped after logout");
            return error;
        }
        let message = self
            .auth
            .state()
            .error()
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        self.notifier.notify(Notification::error(message));
        error
    }

    // ── Voting ──────────────────────────────────────────────────────────

    /// Cast the session user's vote for `candidate_id`.
    ///
    /// A user already known to have voted is turned away locally. On
    /// success the session is marked as voted, whether or not the service
    /// returned the recorded vote.
    pub async fn cast_vote(
        &self,
        candidate_id: CandidateId,
    ) -> Result<Option<Vote>, PortalError> {
        let Some(session) = self.auth.session() else {
            let error = TallyError::NotAuthenticated;
            self.notifier.notify(Notification::error(error.user_message()));
            return Err(error.into());
        };
        if session.user.has_voted {
            self.notifier
                .notify(Notification::error(PortalError::AlreadyVoted.to_string()));
            return Err(PortalError::AlreadyVoted);
        }

        let vote = self.tally.cast_vote(candidate_id, session.user.id).await?;
        if let Err(e) = self.auth.mark_voted() {
            debug!(error = %e, "session ended before the vote was recorded locally");
        }
        Ok(vote)
    }

    /// Whether the session user has voted, as the service sees it.
    ///
    /// A positive answer is recorded on the session.
    pub async fn voting_status(&self) -> Result<bool, PortalError> {
        let Some(session) = self.auth.session() else {
            let error = TallyError::NotAuthenticated;
            self.notifier.notify(Notification::warning(error.user_message()));
            return Err(error.into());
        };
        let user_id = session.user.id;
        let voted = self.tally.has_user_voted(user_id).await?;
        if voted {
            let _ = self.auth.mark_voted();
        }
        Ok(voted)
    }

    // ── Results ─────────────────────────────────────────────────────────

    pub async fn refresh_results(&self) -> Result<RefreshOutcome, PortalError> {
        Ok(self.tally.refresh().await?)
    }

    pub fn results(&self) -> Option<ElectionResults> {
        self.tally.results()
    }

    pub fn watch_results(&self) -> watch::Receiver<Option<TallySnapshot>> {
        self.tally.activate();
        self.tally.subscribe()
    }

    pub fn stop_watching_results(&self) {
        self.tally.deactivate();
    }

    pub fn tally(&self) -> &ResultsSynchronizer {
        &self.tally
    }

    // ── Candidates ──────────────────────────────────────────────────────

    /// Fetch the ballot. On failure the previous ballot stays in place.
    pub async fn load_candidates(&self) -> Result<usize, PortalError> {
        let mut engine = self.candidates.lock().await;
        match engine.reload(self.api.as_ref()).await {
            Ok(count) => Ok(count),
            Err(e) => {
                warn!(error = %e, "failed to load candidates");
                self.notifier.notify(Notification::error(e.user_message()));
                Err(e.into())
            }
        }
    }

    pub async fn set_filters(&self, update: FilterUpdate) {
        self.candidates.lock().await.set_filters(update);
    }

    pub async fn clear_filters(&self) {
        self.candidates.lock().await.clear_filters();
    }

    pub async fn filters(&self) -> CandidateFilter {
        self.candidates.lock().await.filters().clone()
    }

    /// Candidates passing the current filters, in ballot order.
    pub async fn filtered_candidates(&self) -> Vec<Candidate> {
        self.candidates
            .lock()
            .await
            .filtered()
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn candidate(&self, id: CandidateId) -> Option<Candidate> {
        self.candidates.lock().await.get(id).cloned()
    }

    pub async fn parties(&self) -> Vec<String> {
        let engine = self.candidates.lock().await;
        engine.parties().into_iter().map(str::to_string).collect()
    }

    pub async fn colors(&self) -> Vec<String> {
        let engine = self.candidates.lock().await;
        engine.colors().into_iter().map(str::to_string).collect()
    }
}
