//! Vote receipts.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{CandidateId, Timestamp, UserId};

/// Identifier of an accepted vote.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoteId(u64);

impl VoteId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for VoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Receipt for a vote the service accepted. Created once per user and
/// never mutated or deleted by the client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub id: VoteId,
    pub candidate_id: CandidateId,
    pub user_id: UserId,
    pub timestamp: Timestamp,
    #[serde(default)]
    pub verified: bool,
}
