//! Suppression of repeated refresh failures.

use std::sync::{Mutex, PoisonError};

/// Lets the first failure of a run through and swallows identical repeats
/// until a success ends the run.
#[derive(Default)]
pub struct ErrorDebouncer {
    last: Mutex<Option<String>>,
}

impl ErrorDebouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure; `true` if it should be reported.
    pub fn should_report(&self, message: &str) -> bool {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        if last.as_deref() == Some(message) {
            return false;
        }
        *last = Some(message.to_string());
        true
    }

    /// A success ends the current run of failures.
    pub fn reset(&self) {
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
