//! The results synchronizer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};
use voto_client::ElectionApi;
use voto_session::SessionHandle;
use voto_types::{
    CandidateId, Clock, ElectionResults, Notification, Notifier, Timestamp, UserId, Vote,
};

use crate::debounce::ErrorDebouncer;
use crate::guard::InFlightVotes;
use crate::poller::Poller;
use crate::{RefreshOutcome, TallyError, TallySnapshot};

#[derive(Clone, Debug)]
pub struct SyncConfig {
    /// Period between background refreshes while active.
    pub poll_interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
        }
    }
}

/// Owns the cached election tally and the vote-casting path.
///
/// The tally is only ever replaced wholesale by a snapshot fetched from the
/// service; a cast never increments counts locally, it triggers a refresh.
/// Dropping the synchronizer stops background polling.
pub struct ResultsSynchronizer {
    inner: Arc<Inner>,
    poller: Mutex<Option<Poller>>,
    config: SyncConfig,
}

struct Inner {
    api: Arc<dyn ElectionApi>,
    session: SessionHandle,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    cache: watch::Sender<Option<TallySnapshot>>,
    /// Bumped on every (de)activation. A refresh applies only if the
    /// generation it started in is still current.
    generation: AtomicU64,
    in_flight: InFlightVotes,
    /// The last user whose cast this synchronizer saw accepted. Only read
    /// while that user holds the session.
    voted: Mutex<Option<UserId>>,
    refresh_errors: ErrorDebouncer,
}

impl ResultsSynchronizer {
    pub fn new(
        api: Arc<dyn ElectionApi>,
        session: SessionHandle,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        config: SyncConfig,
    ) -> Self {
        let (cache, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                api,
                session,
                notifier,
                clock,
                cache,
                generation: AtomicU64::new(0),
                in_flight: InFlightVotes::new(),
                voted: Mutex::new(None),
                refresh_errors: ErrorDebouncer::new(),
            }),
            poller: Mutex::new(None),
            config,
        }
    }

    // ── Readers ─────────────────────────────────────────────────────────

    /// The cached tally, if one has been fetched.
    pub fn results(&self) -> Option<ElectionResults> {
        self.inner.cache.borrow().as_ref().map(|s| s.results.clone())
    }

    pub fn snapshot(&self) -> Option<TallySnapshot> {
        self.inner.cache.borrow().clone()
    }

    /// Local time the cached tally was fetched.
    pub fn last_fetched(&self) -> Option<Timestamp> {
        self.inner.cache.borrow().as_ref().map(|s| s.fetched_at)
    }

    /// Receive every accepted snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Option<TallySnapshot>> {
        self.inner.cache.subscribe()
    }

    pub fn is_active(&self) -> bool {
        self.lock_poller()
            .as_ref()
            .is_some_and(|poller| !poller.is_finished())
    }

    // ── Lifecycle ───────────────────────────────────────────────────────

    /// Refresh now and then every `poll_interval` until deactivated.
    ///
    /// Activating again restarts the schedule; the previous loop is stopped
    /// first. Must be called from within a tokio runtime.
    pub fn activate(&self) {
        let mut poller = self.lock_poller();
        if let Some(previous) = poller.take() {
            previous.stop();
        }
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let inner = Arc::clone(&self.inner);
        *poller = Some(Poller::start(self.config.poll_interval, move || {
            let inner = Arc::clone(&inner);
            async move {
                let _ = inner.refresh(generation).await;
            }
        }));
        info!(
            interval_secs = self.config.poll_interval.as_secs(),
            "tally polling activated"
        );
    }

    /// Stop polling. Refreshes already in flight are discarded when they land.
    pub fn deactivate(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(poller) = self.lock_poller().take() {
            poller.stop();
            info!("tally polling deactivated");
        }
    }

    // ── Operations ──────────────────────────────────────────────────────

    /// Fetch the tally and replace the cache with it.
    ///
    /// On failure the cached tally is kept as-is and the user is notified,
    /// once per run of identical failures.
    pub async fn refresh(&self) -> Result<RefreshOutcome, TallyError> {
        let generation = self.inner.generation.load(Ordering::SeqCst);
        self.inner.refresh(generation).await
    }

    /// Cast `user_id`'s vote for `candidate_id`.
    ///
    /// The current session must belong to `user_id`, and only one cast per
    /// user may be in flight. A successful cast is followed by a refresh;
    /// a failed one leaves the tally untouched. Casts are never retried.
    ///
    /// The service may accept a vote without echoing it back, hence the
    /// `Option`.
    pub async fn cast_vote(
        &self,
        candidate_id: CandidateId,
        user_id: UserId,
    ) -> Result<Option<Vote>, TallyError> {
        let inner = &self.inner;
        let Some(session) = inner.session.current() else {
            return Err(inner.cast_failed(TallyError::NotAuthenticated));
        };
        if session.user.id != user_id {
            return Err(inner.cast_failed(TallyError::SessionMismatch {
                session: session.user.id,
                requested: user_id,
            }));
        }
        let Some(_slot) = inner.in_flight.acquire(user_id) else {
            debug!(user_id = %user_id, "duplicate cast rejected locally");
            return Err(inner.cast_failed(TallyError::VoteInProgress(user_id)));
        };

        info!(user_id = %user_id, candidate_id = %candidate_id, "casting vote");
        let vote = match inner.api.cast_vote(&session.token, candidate_id, user_id).await {
            Ok(vote) => vote,
            Err(e) => return Err(inner.cast_failed(e.into())),
        };

        *inner.voted.lock().unwrap_or_else(PoisonError::into_inner) = Some(user_id);
        match &vote {
            Some(vote) => info!(user_id = %user_id, vote_id = %vote.id, "vote accepted"),
            None => info!(user_id = %user_id, "vote accepted without receipt"),
        }
        inner
            .notifier
            .notify(Notification::success("Your vote has been recorded"));

        // Failures here are reported by the refresh itself.
        let _ = self.refresh().await;
        Ok(vote)
    }

    /// Ask the service whether `user_id` has voted.
    ///
    /// Uses the session token current at call time. A failure is returned as
    /// an error, never as `false`.
    pub async fn has_user_voted(&self, user_id: UserId) -> Result<bool, TallyError> {
        let inner = &self.inner;
        let Some(session) = inner.session.current() else {
            return Err(inner.check_failed(TallyError::NotAuthenticated));
        };

        match inner.api.has_voted(&session.token, user_id).await {
            Ok(true) => Ok(true),
            Ok(false) => Ok(session.user.id == user_id && inner.remembers_vote(user_id)),
            Err(e) => Err(inner.check_failed(e.into())),
        }
    }

    fn lock_poller(&self) -> std::sync::MutexGuard<'_, Option<Poller>> {
        self.poller.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Inner {
    async fn refresh(&self, generation: u64) -> Result<RefreshOutcome, TallyError> {
        let fetched = self.api.results().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("discarding tally fetched before deactivation");
            return Ok(RefreshOutcome::Discarded);
        }

        let results = match fetched.map_err(TallyError::from).and_then(accept) {
            Ok(results) => results,
            Err(e) => {
                self.refresh_failed(&e);
                return Err(e);
            }
        };
        self.refresh_errors.reset();

        let total_votes = results.total_votes;
        let fetched_at = self.clock.now();
        let mut outcome = RefreshOutcome::Stale;
        self.cache.send_if_modified(|cached| {
            if self.generation.load(Ordering::SeqCst) != generation {
                outcome = RefreshOutcome::Discarded;
                return false;
            }
            if cached.as_ref().is_some_and(|c| !c.is_superseded_by(&results)) {
                return false;
            }
            *cached = Some(TallySnapshot {
                results,
                fetched_at,
            });
            outcome = RefreshOutcome::Applied;
            true
        });

        match outcome {
            RefreshOutcome::Applied => debug!(total_votes, "tally refreshed"),
            RefreshOutcome::Stale => debug!("newer tally already cached, dropping response"),
            RefreshOutcome::Discarded => debug!("discarding tally fetched before deactivation"),
        }
        Ok(outcome)
    }

    fn remembers_vote(&self, user_id: UserId) -> bool {
        *self.voted.lock().unwrap_or_else(PoisonError::into_inner) == Some(user_id)
    }

    fn refresh_failed(&self, error: &TallyError) {
        warn!(error = %error, "tally refresh failed");
        let message = error.user_message();
        if self.refresh_errors.should_report(&message) {
            self.notifier.notify(Notification::error(message));
        }
    }

    fn cast_failed(&self, error: TallyError) -> TallyError {
        warn!(error = %error, "vote not cast");
        self.notifier.notify(Notification::error(error.user_message()));
        error
    }

    fn check_failed(&self, error: TallyError) -> TallyError {
        warn!(error = %error, "could not determine voting status");
        self.notifier
            .notify(Notification::warning(error.user_message()));
        error
    }
}

/// Validate a fetched tally and fill in derived fields.
fn accept(mut results: ElectionResults) -> Result<ElectionResults, TallyError> {
    if !results.is_consistent() {
        return Err(TallyError::InconsistentSnapshot {
            total: results.total_votes,
            counted: results.counted_votes(),
        });
    }
    results.fill_percentages();
    Ok(results)
}
