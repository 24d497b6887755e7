use proptest::prelude::*;

use voto_candidates::{CandidateFilterEngine, FilterUpdate};
use voto_types::Candidate;

const PARTIES: &[&str] = &["Azul", "Rojo", "Verde", "Amarillo"];
const COLORS: &[&str] = &["blue", "red", "green", "yellow"];

fn arb_candidate() -> impl Strategy<Value = Candidate> {
    (
        any::<u64>(),
        "[A-Za-zÁÉáé ]{0,12}",
        prop::sample::select(PARTIES),
        prop::sample::select(COLORS),
    )
        .prop_map(|(id, name, party, color)| {
            voto_nullables::fixtures::candidate(id, &name, party, color)
        })
}

fn arb_update() -> impl Strategy<Value = FilterUpdate> {
    (
        prop::option::of("[a-zA-Z]{0,3}"),
        prop::option::of(prop::sample::select(PARTIES).prop_map(String::from)),
        prop::option::of(prop::sample::select(COLORS).prop_map(String::from)),
    )
        .prop_map(|(search_term, party, color)| FilterUpdate {
            search_term,
            party,
            color,
        })
}

proptest! {
    /// The filtered view is always a subset of the ballot, in ballot order.
    #[test]
    fn filtered_is_ordered_subset(
        ballot in prop::collection::vec(arb_candidate(), 0..30),
        update in arb_update(),
    ) {
        let mut engine = CandidateFilterEngine::new(ballot.clone());
        engine.set_filters(update);
        let view = engine.filtered();

        let mut rest = ballot.iter();
        for candidate in view {
            prop_assert!(rest.any(|c| c == candidate));
        }
    }

    /// With every filter unset the view is the whole ballot.
    #[test]
    fn unset_filters_show_everything(
        ballot in prop::collection::vec(arb_candidate(), 0..30),
        update in arb_update(),
    ) {
        let mut engine = CandidateFilterEngine::new(ballot.clone());
        engine.set_filters(update);
        engine.clear_filters();
        let view: Vec<Candidate> = engine.filtered().into_iter().cloned().collect();
        prop_assert_eq!(view, ballot);
    }

    /// Adding a party filter never grows the view.
    #[test]
    fn adding_a_filter_never_grows_view(
        ballot in prop::collection::vec(arb_candidate(), 0..30),
        first in arb_update(),
        party in prop::sample::select(PARTIES),
    ) {
        let mut engine = CandidateFilterEngine::new(ballot);
        engine.set_filters(FilterUpdate { party: None, ..first });
        let before = engine.filtered().len();

        engine.set_filters(FilterUpdate::new().party(party));
        let after = engine.filtered();

        prop_assert!(after.len() <= before);
        prop_assert!(after.iter().all(|c| c.party == party));
    }
}
