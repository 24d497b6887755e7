//! Nullable infrastructure for deterministic testing.
//!
//! Every external collaborator of the portal core (the election service,
//! the wall clock, the user notification channel) sits behind a trait.
//! This crate provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically (latency, outages, injected failures)
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod election;
pub mod fixtures;
pub mod notifier;

pub use clock::NullClock;
pub use election::{Endpoint, NullElectionApi, RecordedCall};
pub use notifier::RecordingNotifier;
