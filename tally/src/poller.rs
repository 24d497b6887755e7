//! Background revalidation task.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Shortest accepted polling period.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Handle to a running poll loop. Dropping it stops the loop.
pub struct Poller {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl Poller {
    /// Spawn a loop that runs `tick` immediately and then every `period`.
    ///
    /// A tick still running when the poller stops is cancelled. Ticks that
    /// overrun the period push the schedule back rather than bunching up.
    pub fn start<F, Fut>(period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let period = period.max(MIN_POLL_INTERVAL);
        let (shutdown_tx, mut shutdown) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.changed() => break,
                    _ = ticker.tick() => {}
                }
                tokio::select! {
                    biased;
                    _ = shutdown.changed() => break,
                    _ = tick() => {}
                }
            }
            debug!("poll loop stopped");
        });

        Self { shutdown_tx, task }
    }

    /// Signal the loop to stop. Does not wait for it.
    pub fn stop(self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
