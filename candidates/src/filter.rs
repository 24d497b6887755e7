//! Filter predicates over candidates.

use voto_types::Candidate;

/// Conjunction of a free-text search and exact party/colour matches.
///
/// Unset fields match every candidate.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CandidateFilter {
    /// Case-insensitive substring of the name or party. Empty matches all.
    pub search_term: String,
    pub party: Option<String>,
    pub color: Option<String>,
}

impl CandidateFilter {
    pub fn matches(&self, candidate: &Candidate) -> bool {
        self.matches_search(candidate)
            && self.party.as_ref().map_or(true, |p| *p == candidate.party)
            && self.color.as_ref().map_or(true, |c| *c == candidate.color)
    }

    fn matches_search(&self, candidate: &Candidate) -> bool {
        if self.search_term.is_empty() {
            return true;
        }
        let needle = self.search_term.to_lowercase();
        candidate.name.to_lowercase().contains(&needle)
            || candidate.party.to_lowercase().contains(&needle)
    }

    pub fn is_empty(&self) -> bool {
        self.search_term.is_empty() && self.party.is_none() && self.color.is_none()
    }

    /// Merge `update` into this filter.
    pub fn apply(&mut self, update: FilterUpdate) {
        if let Some(term) = update.search_term {
            self.search_term = term;
        }
        if let Some(party) = update.party {
            self.party = non_empty(party);
        }
        if let Some(color) = update.color {
            self.color = non_empty(color);
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

/// A partial change to a [`CandidateFilter`].
///
/// Fields left `None` keep their current value. An empty string unsets the
/// field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterUpdate {
    pub search_term: Option<String>,
    pub party: Option<String>,
    pub color: Option<String>,
}

impl FilterUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search_term = Some(term.into());
        self
    }

    pub fn party(mut self, party: impl Into<String>) -> Self {
        self.party = Some(party.into());
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voto_nullables::fixtures::candidate;

    #[test]
    fn search_is_case_insensitive_over_name_and_party() {
        let c = candidate(1, "Lucía Fernández", "Azul", "blue");
        let by = |term: &str| CandidateFilter {
            search_term: term.into(),
            ..Default::default()
        };
        assert!(by("lucía").matches(&c));
        assert!(by("AZU").matches(&c));
        assert!(by("").matches(&c));
        assert!(!by("rojo").matches(&c));
    }

    #[test]
    fn party_and_color_must_match_exactly() {
        let c = candidate(3, "Valentina Ruiz", "Verde", "green");
        let mut filter = CandidateFilter {
            party: Some("Verde".into()),
            ..Default::default()
        };
        assert!(filter.matches(&c));
        filter.color = Some("blue".into());
        assert!(!filter.matches(&c));
        filter.party = Some("Verd".into());
        filter.color = None;
        assert!(!filter.matches(&c));
    }

    #[test]
    fn update_merges_and_empty_string_unsets() {
        let mut filter = CandidateFilter::default();
        filter.apply(FilterUpdate::new().party("Verde").search("va"));
        filter.apply(FilterUpdate::new().color("green"));
        assert_eq!(filter.party.as_deref(), Some("Verde"));
        assert_eq!(filter.search_term, "va");
        assert_eq!(filter.color.as_deref(), Some("green"));

        filter.apply(FilterUpdate::new().party("").search(""));
        assert_eq!(filter.party, None);
        assert_eq!(filter.search_term, "");
        assert_eq!(filter.color.as_deref(), Some("green"));
        assert!(!filter.is_empty());
    }
}
