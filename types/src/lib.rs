//! Fundamental types for the voto portal core.
//!
//! This crate defines the values shared across every other crate in the
//! workspace: users, candidates, votes, election results, credentials,
//! timestamps, the error taxonomy, and the notification/clock seams.

pub mod auth;
pub mod candidate;
pub mod clock;
pub mod error;
pub mod notify;
pub mod results;
pub mod time;
pub mod user;
pub mod vote;

pub use auth::{AuthPayload, Credentials, RegisterData, SessionToken};
pub use candidate::{Candidate, CandidateId};
pub use clock::{Clock, SystemClock};
pub use error::{ErrorKind, ValidationError};
pub use notify::{Notification, NotificationLevel, Notifier};
pub use results::ElectionResults;
pub use time::Timestamp;
pub use user::{User, UserId};
pub use vote::{Vote, VoteId};
