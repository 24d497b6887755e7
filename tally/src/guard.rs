//! Per-user exclusion for vote casting.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use voto_types::UserId;

/// Users with a cast currently in flight.
#[derive(Default)]
pub struct InFlightVotes {
    users: Mutex<HashSet<UserId>>,
}

impl InFlightVotes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot for `user`. `None` if a cast is already in flight.
    ///
    /// The slot is released when the returned guard is dropped, including
    /// when the casting future is cancelled.
    pub fn acquire(&self, user: UserId) -> Option<InFlightGuard<'_>> {
        let mut users = self.users.lock().unwrap_or_else(PoisonError::into_inner);
        if !users.insert(user) {
            return None;
        }
        drop(users);
        Some(InFlightGuard { owner: self, user })
    }

    pub fn contains(&self, user: UserId) -> bool {
        self.users
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&user)
    }
}

pub struct InFlightGuard<'a> {
    owner: &'a InFlightVotes,
    user: UserId,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.owner
            .users
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.user);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_until_release() {
        let votes = InFlightVotes::new();
        let ana = UserId::new(7);

        let guard = votes.acquire(ana).unwrap();
        assert!(votes.acquire(ana).is_none());
        assert!(votes.acquire(UserId::new(8)).is_some());
        assert!(votes.contains(ana));

        drop(guard);
        assert!(!votes.contains(ana));
        assert!(votes.acquire(ana).is_some());
    }

    #[test]
    fn refused_acquire_keeps_the_holder_slot() {
        let votes = std::sync::Arc::new(InFlightVotes::new());
        let ana = UserId::new(7);
        let held = votes.acquire(ana).unwrap();

        let (tx, rx) = std::sync::mpsc::channel();
        let contender = std::sync::Arc::clone(&votes);
        std::thread::spawn(move || {
            let refused = contender.acquire(ana).is_none();
            let _ = tx.send(refused);
        });

        let refused = rx
            .recv_timeout(std::time::Duration::from_secs(3))
            .expect("second acquire returned");
        assert!(refused);
        assert!(votes.contains(ana));

        drop(held);
        assert!(!votes.contains(ana));
    }
}
