//! Notifications delivered through the tracing pipeline.

use tracing::{error, info, warn};
use voto_types::{Notification, NotificationLevel, Notifier};

/// Writes each notification as a log event at a matching level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        let message = notification.message;
        match notification.level {
            NotificationLevel::Success => info!(target: "voto::notify", kind = "success", "{message}"),
            NotificationLevel::Info => info!(target: "voto::notify", "{message}"),
            NotificationLevel::Warning => warn!(target: "voto::notify", "{message}"),
            NotificationLevel::Error => error!(target: "voto::notify", "{message}"),
        }
    }
}
