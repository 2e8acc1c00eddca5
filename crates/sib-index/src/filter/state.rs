use super::TypeFilter;
use crate::types::EntryType;
use sib_statemodel::State;

/// How the set criteria of a [`StateFilter`] combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Every set criterion must agree
    #[default]
    And,
    /// At least one set criterion must agree
    Or,
}

/// Tri-state criteria over the state predicates
///
/// A criterion is `Some(expected)` or `None` (don't care). With no criteria
/// set the filter matches every state in both modes; in [`MatchMode::Or`]
/// this means an empty disjunction accepts rather than rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StateFilter {
    /// Match mode
    pub mode: MatchMode,
    /// [`State::is_visible`]
    pub visible: Option<bool>,
    /// [`State::is_invisible`]
    pub invisible: Option<bool>,
    /// [`State::is_unreconciled`]
    pub unreconciled: Option<bool>,
    /// [`State::is_delete_pending`]
    pub delete_pending: Option<bool>,
    /// [`State::is_delete_deferred`]
    pub delete_deferred: Option<bool>,
    /// [`State::is_active`]
    pub active: Option<bool>,
    /// [`State::is_cleanup_pending`]
    pub cleanup_pending: Option<bool>,
    /// [`State::is_cleanup_deferred`]
    pub cleanup_deferred: Option<bool>,
    /// [`State::is_in_doubt`]
    pub in_doubt: Option<bool>,
    /// [`State::is_corrupt`]
    pub corrupt: Option<bool>,
    /// [`State::is_reset_on_restart`]
    pub reset_on_restart: Option<bool>,
}

macro_rules! criterion {
    ($($field:ident),* $(,)?) => {
        $(
            #[doc = concat!("Require `", stringify!($field), "` to equal `expected`")]
            #[inline]
            #[must_use]
            pub fn $field(mut self, expected: bool) -> Self {
                self.$field = Some(expected);
                self
            }
        )*
    };
}

impl StateFilter {
    /// Filter with no criteria in [`MatchMode::And`]
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter with no criteria in [`MatchMode::Or`]
    #[inline]
    #[must_use]
    pub fn any() -> Self {
        Self {
            mode: MatchMode::Or,
            ..Self::default()
        }
    }

    /// Visible entries only
    #[inline]
    #[must_use]
    pub fn visible_only() -> Self {
        Self::new().visible(true)
    }

    criterion!(
        visible,
        invisible,
        unreconciled,
        delete_pending,
        delete_deferred,
        active,
        cleanup_pending,
        cleanup_deferred,
        in_doubt,
        corrupt,
        reset_on_restart,
    );

    /// Evaluate against a state
    #[must_use]
    pub fn matches_state(&self, state: State) -> bool {
        let criteria = [
            (self.visible, state.is_visible()),
            (self.invisible, state.is_invisible()),
            (self.unreconciled, state.is_unreconciled()),
            (self.delete_pending, state.is_delete_pending()),
            (self.delete_deferred, state.is_delete_deferred()),
            (self.active, state.is_active()),
            (self.cleanup_pending, state.is_cleanup_pending()),
            (self.cleanup_deferred, state.is_cleanup_deferred()),
            (self.in_doubt, state.is_in_doubt()),
            (self.corrupt, state.is_corrupt()),
            (self.reset_on_restart, state.is_reset_on_restart()),
        ];

        let mut results = criteria
            .into_iter()
            .filter_map(|(expected, actual)| expected.map(|e| e == actual))
            .peekable();

        if results.peek().is_none() {
            return true;
        }

        match self.mode {
            MatchMode::And => results.all(|agrees| agrees),
            MatchMode::Or => results.any(|agrees| agrees),
        }
    }
}

impl TypeFilter<EntryType> for StateFilter {
    fn matches(&self, ty: &EntryType) -> bool {
        self.matches_state(ty.state)
    }
}

impl TypeFilter<State> for StateFilter {
    fn matches(&self, state: &State) -> bool {
        self.matches_state(*state)
    }
}
