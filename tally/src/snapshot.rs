//! Cached tally snapshots and the rule for replacing them.

use voto_types::{ElectionResults, Timestamp};

/// The cached tally together with the local time it was fetched.
#[derive(Clone, Debug, PartialEq)]
pub struct TallySnapshot {
    pub results: ElectionResults,
    /// Local clock reading when the response landed.
    pub fetched_at: Timestamp,
}

impl TallySnapshot {
    /// Whether `incoming` may replace this snapshot.
    ///
    /// Responses apply in completion order unless a strictly newer tally
    /// (by the service's `lastUpdated`) is already cached.
    pub fn is_superseded_by(&self, incoming: &ElectionResults) -> bool {
        incoming.last_updated >= self.results.last_updated
    }
}

/// What a refresh did to the cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The fetched tally replaced the cache.
    Applied,
    /// A newer tally was already cached; the response was dropped.
    Stale,
    /// The synchronizer was deactivated while the request was in flight.
    Discarded,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn results(last_updated: u64) -> ElectionResults {
        ElectionResults {
            total_votes: 0,
            candidates: Vec::new(),
            last_updated: Timestamp::from_millis(last_updated),
            is_finalized: false,
        }
    }

    #[test]
    fn older_tally_does_not_supersede() {
        let cached = TallySnapshot {
            results: results(200),
            fetched_at: Timestamp::from_millis(5),
        };
        assert!(cached.is_superseded_by(&results(300)));
        assert!(cached.is_superseded_by(&results(200)));
        assert!(!cached.is_superseded_by(&results(100)));
    }
}
