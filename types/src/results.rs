//! Election tally snapshots.

use serde::{Deserialize, Serialize};

use crate::{Candidate, CandidateId, Timestamp};

/// A complete tally as reported by the election service.
///
/// Snapshots are replaced atomically, never patched: mixing counts from two
/// snapshots would show totals that never existed on the server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionResults {
    pub total_votes: u64,
    pub candidates: Vec<Candidate>,
    /// Server-side time this tally was computed.
    pub last_updated: Timestamp,
    #[serde(default)]
    pub is_finalized: bool,
}

impl ElectionResults {
    /// Sum of every candidate's vote count, `None` if it overflows.
    pub fn counted_votes(&self) -> Option<u64> {
        self.candidates
            .iter()
            .try_fold(0u64, |sum, c| sum.checked_add(c.vote_count()))
    }

    /// Whether `total_votes` agrees with the per-candidate counts.
    pub fn is_consistent(&self) -> bool {
        self.counted_votes() == Some(self.total_votes)
    }

    /// Vote count for one candidate, if the candidate is on the ballot.
    pub fn votes_for(&self, id: CandidateId) -> Option<u64> {
        self.candidates
            .iter()
            .find(|c| c.id == id)
            .map(Candidate::vote_count)
    }

    /// Fill in any missing `percentage` from the counts.
    ///
    /// Percentages the service supplied are kept as-is.
    pub fn fill_percentages(&mut self) {
        let total = self.total_votes;
        for candidate in &mut self.candidates {
            if candidate.percentage.is_none() {
                let share = if total == 0 {
                    0.0
                } else {
                    candidate.vote_count() as f64 * 100.0 / total as f64
                };
                candidate.percentage = Some(share);
            }
        }
    }

    /// Candidates ordered by vote count, highest first. Ties keep ballot order.
    pub fn ranking(&self) -> Vec<&Candidate> {
        let mut ranked: Vec<&Candidate> = self.candidates.iter().collect();
        ranked.sort_by(|a, b| b.vote_count().cmp(&a.vote_count()));
        ranked
    }

    /// The candidate with the most votes, if any votes were cast.
    pub fn leader(&self) -> Option<&Candidate> {
        self.ranking()
            .into_iter()
            .next()
            .filter(|c| c.vote_count() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: u64, votes: u64) -> Candidate {
        Candidate {
            id: CandidateId::new(id),
            name: format!("Candidate {id}"),
            party: "Verde".into(),
            color: "green".into(),
            proposals: Vec::new(),
            experience: String::new(),
            votes: Some(votes),
            percentage: None,
        }
    }

    fn results(counts: &[u64]) -> ElectionResults {
        ElectionResults {
            total_votes: counts.iter().sum(),
            candidates: counts
                .iter()
                .enumerate()
                .map(|(i, v)| candidate(i as u64 + 1, *v))
                .collect(),
            last_updated: Timestamp::from_millis(1_000),
            is_finalized: false,
        }
    }

    #[test]
    fn consistency_checks_total_against_counts() {
        let mut r = results(&[3, 1, 0]);
        assert!(r.is_consistent());
        r.total_votes = 5;
        assert!(!r.is_consistent());
    }

    #[test]
    fn overflowing_counts_are_inconsistent() {
        let mut r = results(&[u64::MAX, 0]);
        r.candidates[1].votes = Some(2);
        assert_eq!(r.counted_votes(), None);
        assert!(!r.is_consistent());
    }

    #[test]
    fn percentages_are_derived_when_missing() {
        let mut r = results(&[3, 1]);
        r.candidates[1].percentage = Some(99.0);
        r.fill_percentages();
        assert_eq!(r.candidates[0].percentage, Some(75.0));
        assert_eq!(r.candidates[1].percentage, Some(99.0));
    }

    #[test]
    fn empty_tally_has_zero_percentages_and_no_leader() {
        let mut r = results(&[0, 0]);
        r.fill_percentages();
        assert_eq!(r.candidates[0].percentage, Some(0.0));
        assert!(r.leader().is_none());
    }

    #[test]
    fn ranking_orders_by_votes_and_keeps_ties_stable() {
        let r = results(&[2, 5, 2]);
        let ids: Vec<u64> = r.ranking().iter().map(|c| c.id.get()).collect();
        assert_eq!(ids, vec![2, 1, 3]);
        assert_eq!(r.leader().map(|c| c.id), Some(CandidateId::new(2)));
    }

    #[test]
    fn decodes_camel_case_payload() {
        let json = r#"{
            "totalVotes": 1,
            "candidates": [{"id":3,"name":"Luz","party":"Verde","color":"green","votes":1}],
            "lastUpdated": 1700000000000,
            "isFinalized": false
        }"#;
        let r: ElectionResults = serde_json::from_str(json).unwrap();
        assert_eq!(r.votes_for(CandidateId::new(3)), Some(1));
        assert_eq!(r.votes_for(CandidateId::new(4)), None);
        assert!(r.is_consistent());
    }
}
