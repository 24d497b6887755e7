//! The candidate filter engine.

use std::collections::BTreeSet;

use tracing::{debug, info};
use voto_client::{ApiError, ElectionApi};
use voto_types::{Candidate, CandidateId};

use crate::{CandidateFilter, FilterUpdate};

/// The ballot plus the filter currently applied to it.
#[derive(Clone, Debug, Default)]
pub struct CandidateFilterEngine {
    candidates: Vec<Candidate>,
    filter: CandidateFilter,
}

impl CandidateFilterEngine {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self {
            candidates,
            filter: CandidateFilter::default(),
        }
    }

    /// Swap in a new ballot. Filters are kept.
    pub fn replace(&mut self, candidates: Vec<Candidate>) {
        self.candidates = candidates;
    }

    /// Fetch the ballot from the service and replace the collection.
    ///
    /// On failure the current collection is kept.
    pub async fn reload(&mut self, api: &dyn ElectionApi) -> Result<usize, ApiError> {
        let candidates = api.candidates().await?;
        let count = candidates.len();
        self.replace(candidates);
        info!(count, "candidates loaded");
        Ok(count)
    }

    /// Candidates passing the current filter, in ballot order.
    pub fn filtered(&self) -> Vec<&Candidate> {
        self.candidates
            .iter()
            .filter(|c| self.filter.matches(c))
            .collect()
    }

    pub fn set_filters(&mut self, update: FilterUpdate) {
        self.filter.apply(update);
        debug!(filter = ?self.filter, "filters updated");
    }

    pub fn clear_filters(&mut self) {
        self.filter = CandidateFilter::default();
    }

    pub fn filters(&self) -> &CandidateFilter {
        &self.filter
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn get(&self, id: CandidateId) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.id == id)
    }

    /// Distinct parties on the ballot, sorted.
    pub fn parties(&self) -> Vec<&str> {
        distinct(self.candidates.iter().map(|c| c.party.as_str()))
    }

    /// Distinct colours on the ballot, sorted.
    pub fn colors(&self) -> Vec<&str> {
        distinct(self.candidates.iter().map(|c| c.color.as_str()))
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    values
        .filter(|v| !v.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
