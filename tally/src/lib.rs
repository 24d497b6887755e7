//! Live election tally for the voto portal.
//!
//! [`ResultsSynchronizer`] owns the cached [`ElectionResults`] snapshot,
//! keeps it fresh by polling the election service, and is the only path
//! through which a vote is cast.
//!
//! [`ElectionResults`]: voto_types::ElectionResults

pub mod debounce;
pub mod error;
pub mod guard;
pub mod poller;
pub mod snapshot;
pub mod synchronizer;

pub use error::TallyError;
pub use snapshot::{RefreshOutcome, TallySnapshot};
pub use synchronizer::{ResultsSynchronizer, SyncConfig};
