//! Election candidates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric candidate identifier assigned by the election service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(u64);

impl CandidateId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for CandidateId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// A candidate on the ballot.
///
/// Everything but `votes` and `percentage` is fixed once fetched. Those two
/// come only from a tally snapshot and are never incremented locally.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
    pub party: String,
    /// Colour tag the party campaigns under (e.g. `"verde"`).
    pub color: String,
    #[serde(default)]
    pub proposals: Vec<String>,
    #[serde(default)]
    pub experience: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub votes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
}

impl Candidate {
    /// Vote count, treating a missing count as zero.
    pub fn vote_count(&self) -> u64 {
        self.votes.unwrap_or(0)
    }
}
