//! The voto portal core, wired together.
//!
//! [`VotingPortal`] owns one of each subsystem and routes the calls between
//! them: the session gates vote casting, a successful cast marks the
//! session user as voted, and the candidate list is served alongside the
//! live tally.

pub mod config;
pub mod error;
pub mod notifier;
pub mod portal;

pub use config::PortalConfig;
pub use error::PortalError;
pub use notifier::LogNotifier;
pub use portal::VotingPortal;
