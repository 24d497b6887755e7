//! The authentication session manager.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use voto_client::{ApiError, ElectionApi};
use voto_types::{AuthPayload, Credentials, ErrorKind, RegisterData, SessionToken};

use crate::{AuthEvent, AuthState, Session, SessionError, SessionStore};

/// Read-only view of the session for other components.
///
/// Every read is a snapshot of the broadcast state; holders never see a
/// token after the logout that revoked it.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    rx: watch::Receiver<AuthState>,
}

impl SessionHandle {
    /// Wrap a raw receiver, e.g. one fed by a test.
    pub fn from_receiver(rx: watch::Receiver<AuthState>) -> Self {
        Self { rx }
    }

    pub fn state(&self) -> AuthState {
        self.rx.borrow().clone()
    }

    /// The current authenticated session, if any.
    pub fn current(&self) -> Option<Session> {
        self.rx.borrow().session().cloned()
    }

    pub fn token(&self) -> Option<SessionToken> {
        self.rx.borrow().session().map(|s| s.token.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.rx.borrow().is_authenticated()
    }

    /// Wait for the next state change. Returns `false` once the manager is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

/// Owns the authentication state and the session token lifecycle.
///
/// State lives in a `watch` channel: the manager is the only writer and
/// every transition goes through [`AuthState::apply`]. The persisted copy
/// is written inside the same update so it can never disagree with a
/// concurrent logout.
pub struct AuthSessionManager {
    api: Arc<dyn ElectionApi>,
    store: Arc<dyn SessionStore>,
    state: watch::Sender<AuthState>,
    /// Bumped on every logout. Requests remember the epoch they started in
    /// and their result is dropped if it changed meanwhile.
    epoch: AtomicU64,
}

impl AuthSessionManager {
    pub fn new(api: Arc<dyn ElectionApi>, store: Arc<dyn SessionStore>) -> Self {
        let (state, _) = watch::channel(AuthState::Anonymous);
        Self {
            api,
            store,
            state,
            epoch: AtomicU64::new(0),
        }
    }

    // ── Readers ─────────────────────────────────────────────────────────

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn session(&self) -> Option<Session> {
        self.state.borrow().session().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    /// A snapshot view for components that make authenticated calls.
    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            rx: self.state.subscribe(),
        }
    }

    // ── Operations ──────────────────────────────────────────────────────

    /// Authenticate with email and password.
    ///
    /// Rejected with [`SessionError::AuthenticationInProgress`] while another
    /// login, registration or restore is pending.
    pub async fn login(&self, credentials: &Credentials) -> Result<Session, SessionError> {
        let epoch = self.begin()?;
        info!(email = %credentials.email, "logging in");
        let outcome = self.api.login(credentials).await;
        self.finish(epoch, outcome)
    }

    /// Create an account and authenticate as it.
    ///
    /// Input is validated locally first; invalid input never reaches the
    /// service and leaves the session in `Failed`.
    pub async fn register(&self, data: &RegisterData) -> Result<Session, SessionError> {
        let epoch = self.begin()?;
        if let Err(e) = data.validate() {
            debug!(error = %e, "registration rejected locally");
            return self.finish(epoch, Err(ApiError::Validation(e)));
        }
        info!(email = %data.email, "registering");
        let outcome = self.api.register(data).await;
        self.finish(epoch, outcome)
    }

    /// Resume a persisted session, if there is one and the service still
    /// accepts its token.
    ///
    /// A token the service rejects is deleted. If the service cannot be
    /// reached the session stays anonymous but the persisted copy is kept
    /// for the next start.
    pub async fn restore(&self) -> Result<Option<Session>, SessionError> {
        let Some(persisted) = self.store.load()? else {
            debug!("no persisted session");
            return Ok(None);
        };

        let epoch = self.begin()?;
        match self.api.current_user(&persisted.token).await {
            Ok(mut user) => {
                if user.id == persisted.user.id && persisted.user.has_voted {
                    user.mark_voted();
                }
                info!(user_id = %user.id, "restored persisted session");
                let payload = AuthPayload {
                    user,
                    token: persisted.token,
                };
                self.finish(epoch, Ok(payload)).map(Some)
            }
            Err(e) if e.kind() == ErrorKind::Auth => {
                info!("persisted session is no longer valid");
                self.abandon(epoch, true);
                Ok(None)
            }
            Err(e) => {
                warn!(error = %e, "could not validate persisted session");
                self.abandon(epoch, false);
                Err(e.into())
            }
        }
    }

    /// End the session. Always succeeds and takes effect immediately.
    ///
    /// Any request still in flight for the old session has its result
    /// discarded. The token is also revoked remotely when a tokio runtime
    /// is available; that call's outcome is only logged. The returned handle
    /// lets short-lived callers wait for the revocation.
    pub fn logout(&self) -> Option<JoinHandle<()>> {
        self.epoch.fetch_add(1, Ordering::SeqCst);

        let mut revoked = None;
        self.state.send_modify(|state| {
            revoked = state.session().map(|s| s.token.clone());
            *state = AuthState::Anonymous;
            if let Err(e) = self.store.clear() {
                warn!(error = %e, "failed to clear persisted session");
            }
        });

        let token = revoked?;
        info!("logged out");
        self.revoke_remotely(token)
    }

    /// Leave `Failed` for `Anonymous`. A no-op in every other state.
    pub fn clear_error(&self) {
        self.state
            .send_if_modified(|state| match state.apply(AuthEvent::ErrorCleared) {
                Ok(next) => {
                    *state = next;
                    true
                }
                Err(_) => false,
            });
    }

    /// Record that the authenticated user has voted.
    pub fn mark_voted(&self) -> Result<(), SessionError> {
        let mut result = Err(SessionError::NotAuthenticated);
        self.state.send_if_modified(|state| {
            if state.session().map(|s| s.user.has_voted).unwrap_or(false) {
                result = Ok(());
                return false;
            }
            match state.apply(AuthEvent::Voted) {
                Ok(next) => {
                    if let Some(session) = next.session() {
                        self.persist(session);
                    }
                    *state = next;
                    result = Ok(());
                    true
                }
                Err(_) => false,
            }
        });
        result
    }

    // ── Internals ───────────────────────────────────────────────────────

    /// Enter `Authenticating` and return the epoch the request belongs to.
    ///
    /// Starting over from an authenticated session ends that session: its
    /// persisted copy is cleared and its token revoked, so a failed attempt
    /// leaves nothing of the previous user behind.
    fn begin(&self) -> Result<u64, SessionError> {
        let mut result = Err(SessionError::AuthenticationInProgress);
        let mut replaced = None;
        self.state
            .send_if_modified(|state| match state.apply(AuthEvent::Started) {
                Ok(next) => {
                    if let Some(previous) = state.session() {
                        replaced = Some(previous.token.clone());
                        if let Err(e) = self.store.clear() {
                            warn!(error = %e, "failed to clear persisted session");
                        }
                    }
                    *state = next;
                    result = Ok(self.epoch.load(Ordering::SeqCst));
                    true
                }
                Err(e) => {
                    result = Err(e);
                    false
                }
            });
        if let Some(token) = replaced {
            info!("replacing authenticated session");
            let _ = self.revoke_remotely(token);
        }
        result
    }

    /// Apply the outcome of a request started in `epoch`.
    fn finish(
        &self,
        epoch: u64,
        outcome: Result<AuthPayload, ApiError>,
    ) -> Result<Session, SessionError> {
        let event = match &outcome {
            Ok(payload) => AuthEvent::Succeeded(payload.clone()),
            Err(e) => AuthEvent::Rejected(e.user_message()),
        };

        let mut applied = false;
        self.state.send_if_modified(|state| {
            if self.epoch.load(Ordering::SeqCst) != epoch {
                return false;
            }
            match state.apply(event) {
                Ok(next) => {
                    if let Some(session) = next.session() {
                        self.persist(session);
                    }
                    *state = next;
                    applied = true;
                    true
                }
                Err(_) => false,
            }
        });

        if !applied {
            debug!("discarding authentication result for a closed session");
            return Err(SessionError::Superseded);
        }

        match outcome {
            Ok(payload) => {
                info!(user_id = %payload.user.id, "authenticated");
                Ok(payload.into())
            }
            Err(e) => {
                warn!(error = %e, "authentication failed");
                Err(e.into())
            }
        }
    }

    /// Drop a pending request without a verdict, optionally forgetting the
    /// persisted session.
    fn abandon(&self, epoch: u64, forget: bool) {
        self.state.send_if_modified(|state| {
            if self.epoch.load(Ordering::SeqCst) != epoch {
                return false;
            }
            if forget {
                if let Err(e) = self.store.clear() {
                    warn!(error = %e, "failed to clear persisted session");
                }
            }
            match state.apply(AuthEvent::Abandoned) {
                Ok(next) => {
                    *state = next;
                    true
                }
                Err(_) => false,
            }
        });
    }

    fn persist(&self, session: &Session) {
        if let Err(e) = self.store.save(session) {
            warn!(error = %e, "failed to persist session");
        }
    }

    fn revoke_remotely(&self, token: SessionToken) -> Option<JoinHandle<()>> {
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let api = Arc::clone(&self.api);
                Some(runtime.spawn(async move {
                    if let Err(e) = api.logout(&token).await {
                        debug!(error = %e, "remote token revocation failed");
                    }
                }))
            }
            Err(_) => {
                debug!("no async runtime, skipping remote token revocation");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemorySessionStore;
    use std::time::Duration;
    use voto_nullables::{Endpoint, NullElectionApi};

    struct Fixture {
        api: Arc<NullElectionApi>,
        store: Arc<MemorySessionStore>,
        manager: AuthSessionManager,
    }

    fn fixture_with_store(store: MemorySessionStore) -> Fixture {
        let api = Arc::new(NullElectionApi::new());
        api.add_user_with_id(7, "Ana", "ana@x.com", "Secret1!");
        let store = Arc::new(store);
        let manager = AuthSessionManager::new(api.clone(), store.clone());
        Fixture { api, store, manager }
    }

    fn fixture() -> Fixture {
        fixture_with_store(MemorySessionStore::new())
    }

    fn ana() -> Credentials {
        Credentials::new("ana@x.com", "Secret1!")
    }

    fn registration(password: &str, confirm: &str) -> RegisterData {
        RegisterData {
            name: "Beto".into(),
            dni: "20333444".into(),
            email: "beto@x.com".into(),
            password: password.into(),
            confirm_password: confirm.into(),
        }
    }

    #[tokio::test]
    async fn login_authenticates_and_persists() {
        let f = fixture();
        let handle = f.manager.handle();

        let session = f.manager.login(&ana()).await.unwrap();

        assert!(f.manager.is_authenticated());
        assert_eq!(session.user.email, "ana@x.com");
        assert_eq!(handle.token(), Some(session.token.clone()));
        assert_eq!(f.store.load().unwrap(), Some(session));
    }

    #[tokio::test]
    async fn failed_login_keeps_no_user_state() {
        let f = fixture();
        let err = f
            .manager
            .login(&Credentials::new("ana@x.com", "nope"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Auth);
        assert_eq!(f.manager.state().error(), Some("credenciales inválidas"));
        assert!(f.manager.session().is_none());
        assert!(f.store.load().unwrap().is_none());
    }

    #[tokio::test]
    async fn network_failure_surfaces_generic_message() {
        let f = fixture();
        f.api.set_offline(true);
        let err = f.manager.login(&ana()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transient);
        assert_eq!(
            f.manager.state().error(),
            Some("Connection error, please try again")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_login_is_rejected() {
        let f = fixture();
        f.api.set_latency(Duration::from_millis(50));

        let creds = ana();
        let (first, second) = tokio::join!(f.manager.login(&creds), f.manager.login(&creds));

        assert!(first.is_ok());
        assert!(matches!(second, Err(SessionError::AuthenticationInProgress)));
        assert_eq!(f.api.calls_to(Endpoint::Login), 1);
    }

    #[tokio::test]
    async fn failed_relogin_drops_previous_session() {
        let f = fixture();
        f.api.add_user_with_id(8, "Beto", "beto@x.com", "Secret2!");
        let previous = f.manager.login(&ana()).await.unwrap();

        let err = f
            .manager
            .login(&Credentials::new("beto@x.com", "nope"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Auth);
        assert!(f.manager.state().error().is_some());
        assert!(f.manager.session().is_none());
        assert!(f.store.load().unwrap().is_none());
        assert!(f.manager.restore().await.unwrap().is_none());

        for _ in 0..10 {
            if f.api.calls_to(Endpoint::Logout) > 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(f.api.calls_to(Endpoint::Logout), 1);
        assert!(f.api.current_user(&previous.token).await.is_err());
    }

    #[tokio::test]
    async fn relogin_replaces_persisted_session() {
        let f = fixture();
        f.api.add_user_with_id(8, "Beto", "beto@x.com", "Secret2!");
        f.manager.login(&ana()).await.unwrap();

        let beto = f
            .manager
            .login(&Credentials::new("beto@x.com", "Secret2!"))
            .await
            .unwrap();

        assert_eq!(f.store.load().unwrap(), Some(beto));
    }

    #[tokio::test]
    async fn register_password_mismatch_never_reaches_service() {
        let f = fixture();
        let err = f
            .manager
            .register(&registration("Secret1!", "Secret2!"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(f.api.calls_to(Endpoint::Register), 0);
        assert_eq!(f.manager.state().error(), Some("passwords do not match"));
    }

    #[tokio::test]
    async fn register_authenticates_new_user() {
        let f = fixture();
        let session = f
            .manager
            .register(&registration("Secret1!", "Secret1!"))
            .await
            .unwrap();
        assert_eq!(session.user.name, "Beto");
        assert!(f.manager.is_authenticated());
    }

    #[tokio::test]
    async fn logout_clears_state_store_and_revokes_remotely() {
        let f = fixture();
        let handle = f.manager.handle();
        f.manager.login(&ana()).await.unwrap();

        let revocation = f.manager.logout();

        assert_eq!(f.manager.state(), AuthState::Anonymous);
        assert!(handle.token().is_none());
        assert!(f.store.load().unwrap().is_none());

        revocation.unwrap().await.unwrap();
        assert_eq!(f.api.calls_to(Endpoint::Logout), 1);
        assert!(f.manager.logout().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn login_result_after_logout_is_discarded() {
        let f = fixture();
        f.api.set_latency(Duration::from_millis(50));

        let creds = ana();
        let (result, ()) = tokio::join!(f.manager.login(&creds), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            f.manager.logout();
        });

        assert!(matches!(result, Err(SessionError::Superseded)));
        assert_eq!(f.manager.state(), AuthState::Anonymous);
        assert!(f.store.load().unwrap().is_none());
    }

    #[tokio::test]
    async fn clear_error_is_idempotent() {
        let f = fixture();
        let _ = f.manager.login(&Credentials::new("ana@x.com", "nope")).await;
        f.manager.clear_error();
        assert_eq!(f.manager.state(), AuthState::Anonymous);
        f.manager.clear_error();
        assert_eq!(f.manager.state(), AuthState::Anonymous);
    }

    #[tokio::test]
    async fn clear_error_leaves_authenticated_session_alone() {
        let f = fixture();
        f.manager.login(&ana()).await.unwrap();
        f.manager.clear_error();
        assert!(f.manager.is_authenticated());
    }

    #[tokio::test]
    async fn restore_resumes_valid_session() {
        let f = fixture();
        let session = f.manager.login(&ana()).await.unwrap();

        let restarted = AuthSessionManager::new(
            f.api.clone(),
            Arc::new(MemorySessionStore::with_session(session.clone())),
        );
        let restored = restarted.restore().await.unwrap().unwrap();

        assert_eq!(restored.user.id, session.user.id);
        assert!(restarted.is_authenticated());
    }

    #[tokio::test]
    async fn restore_keeps_voted_flag_monotonic() {
        let f = fixture();
        let mut session = f.manager.login(&ana()).await.unwrap();
        session.user.mark_voted();

        let store = Arc::new(MemorySessionStore::with_session(session));
        let restarted = AuthSessionManager::new(f.api.clone(), store);
        let restored = restarted.restore().await.unwrap().unwrap();
        assert!(restored.user.has_voted);
    }

    #[tokio::test]
    async fn restore_forgets_rejected_token() {
        let f = fixture();
        let session = f.manager.login(&ana()).await.unwrap();
        f.api.revoke_all_tokens();

        let store = Arc::new(MemorySessionStore::with_session(session));
        let restarted = AuthSessionManager::new(f.api.clone(), store.clone());

        assert!(restarted.restore().await.unwrap().is_none());
        assert_eq!(restarted.state(), AuthState::Anonymous);
        assert!(store.load().unwrap().is_none());
    }

    #[tokio::test]
    async fn restore_keeps_persisted_session_when_offline() {
        let f = fixture();
        let session = f.manager.login(&ana()).await.unwrap();
        f.api.set_offline(true);

        let store = Arc::new(MemorySessionStore::with_session(session.clone()));
        let restarted = AuthSessionManager::new(f.api.clone(), store.clone());

        let err = restarted.restore().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transient);
        assert_eq!(restarted.state(), AuthState::Anonymous);
        assert_eq!(store.load().unwrap(), Some(session));
    }

    #[tokio::test]
    async fn restore_without_persisted_session_stays_anonymous() {
        let f = fixture();
        assert!(f.manager.restore().await.unwrap().is_none());
        assert_eq!(f.api.calls_to(Endpoint::CurrentUser), 0);
    }

    #[tokio::test]
    async fn mark_voted_updates_session_and_store() {
        let f = fixture();
        f.manager.login(&ana()).await.unwrap();

        f.manager.mark_voted().unwrap();
        f.manager.mark_voted().unwrap();

        assert!(f.manager.session().unwrap().user.has_voted);
        assert!(f.store.load().unwrap().unwrap().user.has_voted);
    }

    #[tokio::test]
    async fn mark_voted_requires_session() {
        let f = fixture();
        assert!(matches!(
            f.manager.mark_voted(),
            Err(SessionError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn handle_observes_transitions() {
        let f = fixture();
        let mut handle = f.manager.handle();
        f.manager.login(&ana()).await.unwrap();
        assert!(handle.changed().await);
        assert!(handle.is_authenticated());
    }
}
