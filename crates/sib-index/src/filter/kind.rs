use super::{StateFilter, TypeFilter};
use crate::types::{EntryKind, EntryType, SubscriptionType};

/// `expected` is unset or equals `actual`
#[inline]
fn agrees(expected: Option<bool>, actual: Option<bool>) -> bool {
    expected.map_or(true, |e| actual == Some(e))
}

/// Filter over destination index entries
///
/// The state filter must match first (in whatever mode it uses); each set
/// flag is then required on top of it. Entries of another kind never match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DestinationTypeFilter {
    /// State criteria
    pub state: StateFilter,
    /// Required `queue` flag
    pub queue: Option<bool>,
    /// Required `alias` flag
    pub alias: Option<bool>,
    /// Required `foreign_destination` flag
    pub foreign_destination: Option<bool>,
    /// Required `local` flag
    pub local: Option<bool>,
    /// Required `remote` flag
    pub remote: Option<bool>,
}

impl DestinationTypeFilter {
    /// Filter with no criteria
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the state criteria
    #[inline]
    #[must_use]
    pub fn with_state(mut self, state: StateFilter) -> Self {
        self.state = state;
        self
    }

    /// Require queue flag
    #[inline]
    #[must_use]
    pub fn queue(mut self, expected: bool) -> Self {
        self.queue = Some(expected);
        self
    }

    /// Require alias flag
    #[inline]
    #[must_use]
    pub fn alias(mut self, expected: bool) -> Self {
        self.alias = Some(expected);
        self
    }

    /// Require foreign destination flag
    #[inline]
    #[must_use]
    pub fn foreign_destination(mut self, expected: bool) -> Self {
        self.foreign_destination = Some(expected);
        self
    }

    /// Require local flag
    #[inline]
    #[must_use]
    pub fn local(mut self, expected: bool) -> Self {
        self.local = Some(expected);
        self
    }

    /// Require remote flag
    #[inline]
    #[must_use]
    pub fn remote(mut self, expected: bool) -> Self {
        self.remote = Some(expected);
        self
    }
}

impl TypeFilter<EntryType> for DestinationTypeFilter {
    fn matches(&self, ty: &EntryType) -> bool {
        let EntryKind::Destination(flags) = ty.kind else {
            return false;
        };
        self.state.matches_state(ty.state)
            && agrees(self.queue, flags.queue)
            && agrees(self.alias, flags.alias)
            && agrees(self.foreign_destination, flags.foreign_destination)
            && agrees(self.local, flags.local)
            && agrees(self.remote, flags.remote)
    }
}

/// Filter over link index entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LinkTypeFilter {
    /// State criteria
    pub state: StateFilter,
    /// Required `local` flag
    pub local: Option<bool>,
    /// Required `mq_link` flag
    pub mq_link: Option<bool>,
    /// Required `remote` flag
    pub remote: Option<bool>,
}

impl LinkTypeFilter {
    /// Filter with no criteria
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the state criteria
    #[inline]
    #[must_use]
    pub fn with_state(mut self, state: StateFilter) -> Self {
        self.state = state;
        self
    }

    /// Require local flag
    #[inline]
    #[must_use]
    pub fn local(mut self, expected: bool) -> Self {
        self.local = Some(expected);
        self
    }

    /// Require MQ link flag
    #[inline]
    #[must_use]
    pub fn mq_link(mut self, expected: bool) -> Self {
        self.mq_link = Some(expected);
        self
    }

    /// Require remote flag
    #[inline]
    #[must_use]
    pub fn remote(mut self, expected: bool) -> Self {
        self.remote = Some(expected);
        self
    }
}

impl TypeFilter<EntryType> for LinkTypeFilter {
    fn matches(&self, ty: &EntryType) -> bool {
        let EntryKind::Link(flags) = ty.kind else {
            return false;
        };
        self.state.matches_state(ty.state)
            && agrees(self.local, flags.local)
            && agrees(self.mq_link, flags.mq_link)
            && agrees(self.remote, flags.remote)
    }
}

/// Filter over foreign bus index entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ForeignBusTypeFilter {
    /// State criteria
    pub state: StateFilter,
}

impl ForeignBusTypeFilter {
    /// Filter with the given state criteria
    #[inline]
    #[must_use]
    pub fn new(state: StateFilter) -> Self {
        Self { state }
    }
}

impl TypeFilter<EntryType> for ForeignBusTypeFilter {
    fn matches(&self, ty: &EntryType) -> bool {
        matches!(ty.kind, EntryKind::ForeignBus) && self.state.matches_state(ty.state)
    }
}

/// Filter over subscription index entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubscriptionTypeFilter {
    /// Required `local` flag
    pub local: Option<bool>,
    /// Required `durable` flag
    pub durable: Option<bool>,
}

impl SubscriptionTypeFilter {
    /// Filter with no criteria
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require local flag
    #[inline]
    #[must_use]
    pub fn local(mut self, expected: bool) -> Self {
        self.local = Some(expected);
        self
    }

    /// Require durable flag
    #[inline]
    #[must_use]
    pub fn durable(mut self, expected: bool) -> Self {
        self.durable = Some(expected);
        self
    }
}

impl TypeFilter<SubscriptionType> for SubscriptionTypeFilter {
    fn matches(&self, ty: &SubscriptionType) -> bool {
        self.local.map_or(true, |e| e == ty.local) && self.durable.map_or(true, |e| e == ty.durable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DestinationFlags, LinkFlags};
    use sib_statemodel::State;

    #[test]
    fn destination_filter_requires_flags() {
        let ty = EntryType::destination(
            State::Active,
            DestinationFlags::default().with_queue(true).with_local(true),
        );
        assert!(DestinationTypeFilter::new().queue(true).matches(&ty));
        assert!(!DestinationTypeFilter::new().queue(false).matches(&ty));
        assert!(DestinationTypeFilter::new().local(true).matches(&ty));
        // unset type flag does not satisfy a set criterion
        assert!(!DestinationTypeFilter::new().alias(false).matches(&ty));
    }

    #[test]
    fn subtype_flags_are_anded_over_or_state() {
        let ty = EntryType::destination(State::Active, DestinationFlags::default().with_queue(false));
        let state = StateFilter::any().active(true).corrupt(true);
        assert!(DestinationTypeFilter::new().with_state(state).matches(&ty));
        assert!(!DestinationTypeFilter::new().with_state(state).queue(true).matches(&ty));
    }

    #[test]
    fn wrong_kind_never_matches() {
        let link = EntryType::link(State::Active, LinkFlags::default());
        let bus = EntryType::foreign_bus(State::Active);
        assert!(!DestinationTypeFilter::new().matches(&link));
        assert!(!LinkTypeFilter::new().matches(&bus));
        assert!(!ForeignBusTypeFilter::default().matches(&link));
        assert!(ForeignBusTypeFilter::default().matches(&bus));
    }

    #[test]
    fn link_filter_mq() {
        let mq = EntryType::link(State::Active, LinkFlags::default().with_mq_link(true));
        assert!(LinkTypeFilter::new().mq_link(true).matches(&mq));
        assert!(!LinkTypeFilter::new().mq_link(false).matches(&mq));
        assert!(!LinkTypeFilter::new()
            .with_state(StateFilter::new().corrupt(true))
            .matches(&mq));
    }

    #[test]
    fn subscription_filter() {
        let durable = SubscriptionType {
            local: true,
            durable: true,
        };
        assert!(SubscriptionTypeFilter::new().matches(&durable));
        assert!(SubscriptionTypeFilter::new().durable(true).local(true).matches(&durable));
        assert!(!SubscriptionTypeFilter::new().durable(false).matches(&durable));
        assert!(!SubscriptionTypeFilter::new().local(false).matches(&durable));
    }
}
