use proptest::prelude::*;
use sib_index::*;
use sib_statemodel::State;

fn any_state() -> impl Strategy<Value = State> {
    prop::sample::select(State::ALL.to_vec())
}

fn criterion() -> impl Strategy<Value = Option<bool>> {
    prop_oneof![Just(None), Just(Some(true)), Just(Some(false))]
}

fn active_not_corrupt() -> EntryType {
    EntryType::destination(State::Active, DestinationFlags::default())
}

#[test]
fn test_and_semantics() {
    let ty = active_not_corrupt();
    assert!(StateFilter::new().active(true).corrupt(false).matches(&ty));
    assert!(!StateFilter::new().active(true).corrupt(true).matches(&ty));
    assert!(StateFilter::new().matches(&ty));
}

#[test]
fn test_or_semantics() {
    let ty = active_not_corrupt();
    assert!(StateFilter::any().active(true).corrupt(true).matches(&ty));
    assert!(!StateFilter::any().active(false).corrupt(true).matches(&ty));
}

#[test]
fn test_absent_type_never_matches() {
    assert!(!StateFilter::new().matches_opt(None::<&EntryType>));
    assert!(!DestinationTypeFilter::new().matches_opt(None));
    assert!(!SubscriptionTypeFilter::new().matches_opt(None));
}

proptest! {
    #[test]
    fn prop_empty_filter_matches_every_state(state in any_state()) {
        prop_assert!(StateFilter::new().matches_state(state));
        prop_assert!(StateFilter::any().matches_state(state));
    }

    #[test]
    fn prop_single_criterion_same_in_both_modes(state in any_state(), expected in any::<bool>()) {
        let and = StateFilter::new().visible(expected);
        let or = StateFilter::any().visible(expected);
        prop_assert_eq!(and.matches_state(state), or.matches_state(state));
        prop_assert_eq!(and.matches_state(state), state.is_visible() == expected);
    }

    #[test]
    fn prop_and_implies_or(
        state in any_state(),
        active in criterion(),
        corrupt in criterion(),
        visible in criterion(),
        delete_pending in criterion(),
    ) {
        let build = |mut filter: StateFilter| {
            filter.active = active;
            filter.corrupt = corrupt;
            filter.visible = visible;
            filter.delete_pending = delete_pending;
            filter
        };
        let and = build(StateFilter::new());
        let or = build(StateFilter::any());
        if and.matches_state(state) {
            prop_assert!(or.matches_state(state));
        }
    }

    #[test]
    fn prop_visible_and_invisible_partition(state in any_state()) {
        let visible = StateFilter::new().visible(true).matches_state(state);
        let invisible = StateFilter::new().invisible(true).matches_state(state);
        prop_assert!(visible != invisible);
    }

    #[test]
    fn prop_subtype_flags_anded(
        state in any_state(),
        queue in any::<bool>(),
        wanted in any::<bool>(),
    ) {
        let ty = EntryType::destination(state, DestinationFlags::default().with_queue(queue));
        let filter = DestinationTypeFilter::new()
            .with_state(StateFilter::any())
            .queue(wanted);
        prop_assert_eq!(filter.matches(&ty), queue == wanted);
    }

    #[test]
    fn prop_wrong_kind_never_matches(state in any_state()) {
        let link = EntryType::link(state, LinkFlags::default());
        let bus = EntryType::foreign_bus(state);
        prop_assert!(!DestinationTypeFilter::new().matches(&link));
        prop_assert!(!DestinationTypeFilter::new().matches(&bus));
        prop_assert!(!LinkTypeFilter::new().matches(&bus));
        prop_assert!(!ForeignBusTypeFilter::default().matches(&link));
    }
}
