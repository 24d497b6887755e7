//! Candidate browsing for the voto portal.
//!
//! [`CandidateFilterEngine`] holds the ballot as fetched from the election
//! service and derives the visible subset from a [`CandidateFilter`]. The
//! filtered view is recomputed on every read; nothing is cached.

pub mod engine;
pub mod filter;

pub use engine::CandidateFilterEngine;
pub use filter::{CandidateFilter, FilterUpdate};
