//! Type filters
//!
//! Filters are predicates over the type stored with an index entry. Lookups
//! take an optional `&dyn TypeFilter<T>`; `None` accepts every entry.
//!
//! - [`StateFilter`]: tri-state criteria over the [`State`](sib_statemodel::State) predicates
//! - [`DestinationTypeFilter`], [`LinkTypeFilter`], [`ForeignBusTypeFilter`]:
//!   a state filter plus kind specific flags
//! - [`SubscriptionTypeFilter`]: criteria over subscription flags
//! - [`and`], [`or`], [`not`] and plain closures for anything else

mod kind;
mod state;

pub use kind::{DestinationTypeFilter, ForeignBusTypeFilter, LinkTypeFilter, SubscriptionTypeFilter};
pub use state::{MatchMode, StateFilter};

/// Predicate over an entry type
pub trait TypeFilter<T>: Send + Sync {
    /// Whether `ty` satisfies the filter
    fn matches(&self, ty: &T) -> bool;

    /// An absent type never matches
    fn matches_opt(&self, ty: Option<&T>) -> bool {
        ty.is_some_and(|ty| self.matches(ty))
    }
}

impl<T, F> TypeFilter<T> for F
where
    F: Fn(&T) -> bool + Send + Sync,
{
    fn matches(&self, ty: &T) -> bool {
        self(ty)
    }
}

/// Apply an optional filter; `None` accepts everything
#[inline]
pub(crate) fn accepts<T>(filter: Option<&dyn TypeFilter<T>>, ty: &T) -> bool {
    filter.map_or(true, |f| f.matches(ty))
}

/// Both filters match
#[derive(Debug, Clone, Copy)]
pub struct And<A, B>(A, B);

/// Either filter matches
#[derive(Debug, Clone, Copy)]
pub struct Or<A, B>(A, B);

/// Inner filter does not match
#[derive(Debug, Clone, Copy)]
pub struct Not<A>(A);

/// Combine two filters with logical and
#[inline]
#[must_use]
pub fn and<A, B>(a: A, b: B) -> And<A, B> {
    And(a, b)
}

/// Combine two filters with logical or
#[inline]
#[must_use]
pub fn or<A, B>(a: A, b: B) -> Or<A, B> {
    Or(a, b)
}

/// Negate a filter
#[inline]
#[must_use]
pub fn not<A>(a: A) -> Not<A> {
    Not(a)
}

impl<T, A: TypeFilter<T>, B: TypeFilter<T>> TypeFilter<T> for And<A, B> {
    fn matches(&self, ty: &T) -> bool {
        self.0.matches(ty) && self.1.matches(ty)
    }
}

impl<T, A: TypeFilter<T>, B: TypeFilter<T>> TypeFilter<T> for Or<A, B> {
    fn matches(&self, ty: &T) -> bool {
        self.0.matches(ty) || self.1.matches(ty)
    }
}

impl<T, A: TypeFilter<T>> TypeFilter<T> for Not<A> {
    fn matches(&self, ty: &T) -> bool {
        !self.0.matches(ty)
    }
}
