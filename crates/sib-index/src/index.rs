//! Generic keyed index
//!
//! Provides [`Index`], a thread-safe map from UUID to [`Entry`], and the
//! unsynchronized [`Table`] the specialised indexes build on while they
//! already hold their own lock.

use crate::filter::{accepts, TypeFilter};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// One registered object
///
/// `data` is shared with the owner; the index never mutates it. `ty` is
/// owned by the index and replaced only through index methods.
pub struct Entry<H: ?Sized, T> {
    key: Uuid,
    data: Arc<H>,
    ty: T,
}

impl<H: ?Sized, T: Copy> Entry<H, T> {
    /// Create entry
    #[inline]
    #[must_use]
    pub fn new(key: Uuid, data: Arc<H>, ty: T) -> Self {
        Self { key, data, ty }
    }

    /// Primary key
    #[inline]
    #[must_use]
    pub fn key(&self) -> Uuid {
        self.key
    }

    /// Registered object
    #[inline]
    #[must_use]
    pub fn data(&self) -> &Arc<H> {
        &self.data
    }

    /// Type at the time this entry was read
    #[inline]
    #[must_use]
    pub fn entry_type(&self) -> T {
        self.ty
    }
}

impl<H: ?Sized, T: Copy> Clone for Entry<H, T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            data: Arc::clone(&self.data),
            ty: self.ty,
        }
    }
}

impl<H: ?Sized + fmt::Debug, T: fmt::Debug> fmt::Debug for Entry<H, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("key", &self.key)
            .field("data", &self.data)
            .field("ty", &self.ty)
            .finish()
    }
}

/// Primary map without locking
///
/// Callers hold the lock of the index that owns the table.
pub(crate) struct Table<H: ?Sized, T> {
    entries: HashMap<Uuid, Entry<H, T>>,
}

impl<H: ?Sized, T: Copy> Table<H, T> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
        }
    }

    /// Insert, replacing any entry under the same key
    pub(crate) fn add(&mut self, entry: Entry<H, T>) -> Option<Entry<H, T>> {
        self.entries.insert(entry.key, entry)
    }

    pub(crate) fn entry(&self, key: &Uuid) -> Option<&Entry<H, T>> {
        self.entries.get(key)
    }

    pub(crate) fn get(&self, key: &Uuid, filter: Option<&dyn TypeFilter<T>>) -> Option<&Arc<H>> {
        self.entries
            .get(key)
            .filter(|e| accepts(filter, &e.ty))
            .map(|e| &e.data)
    }

    pub(crate) fn type_of(&self, key: &Uuid) -> Option<T> {
        self.entries.get(key).map(|e| e.ty)
    }

    /// Replace the stored type; false if the key is absent
    pub(crate) fn set_type(&mut self, key: &Uuid, ty: T) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.ty = ty;
                true
            }
            None => false,
        }
    }

    pub(crate) fn remove(&mut self, key: &Uuid) -> Option<Entry<H, T>> {
        self.entries.remove(key)
    }

    pub(crate) fn contains_key(&self, key: &Uuid) -> bool {
        self.entries.contains_key(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = &Entry<H, T>> {
        self.entries.values()
    }

    pub(crate) fn snapshot(&self, filter: Option<&dyn TypeFilter<T>>) -> Vec<Arc<H>> {
        self.entries
            .values()
            .filter(|e| accepts(filter, &e.ty))
            .map(|e| Arc::clone(&e.data))
            .collect()
    }
}

/// Thread-safe keyed index
///
/// Every operation takes the single instance lock; there is no finer
/// grained locking. `add` does not check for an existing key: the last
/// write wins and uniqueness is the caller's responsibility.
pub struct Index<H: ?Sized, T> {
    table: Mutex<Table<H, T>>,
}

impl<H: ?Sized, T: Copy> Index<H, T> {
    /// Create empty index
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create empty index with room for `capacity` entries
    #[inline]
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            table: Mutex::new(Table::with_capacity(capacity)),
        }
    }

    /// Insert entry; returns the data it replaced, if any
    pub fn add(&self, entry: Entry<H, T>) -> Option<Arc<H>> {
        self.table.lock().add(entry).map(|old| old.data)
    }

    /// Data under `key` whose type passes `filter`
    #[must_use]
    pub fn get(&self, key: &Uuid, filter: Option<&dyn TypeFilter<T>>) -> Option<Arc<H>> {
        self.table.lock().get(key, filter).cloned()
    }

    /// Copy of the stored type
    #[must_use]
    pub fn get_type(&self, key: &Uuid) -> Option<T> {
        self.table.lock().type_of(key)
    }

    /// Replace the stored type; false if the key is absent
    pub fn set_type(&self, key: &Uuid, ty: T) -> bool {
        self.table.lock().set_type(key, ty)
    }

    /// Remove entry; returns its data
    pub fn remove(&self, key: &Uuid) -> Option<Arc<H>> {
        self.table.lock().remove(key).map(|e| e.data)
    }

    /// Key is present
    #[must_use]
    pub fn contains_key(&self, key: &Uuid) -> bool {
        self.table.lock().contains_key(key)
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.lock().len()
    }

    /// Index has no entries
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All keys
    #[must_use]
    pub fn keys(&self) -> Vec<Uuid> {
        self.table.lock().entries().map(|e| e.key).collect()
    }

    /// Data of every entry whose type passes `filter`, taken under one lock
    #[must_use]
    pub fn snapshot(&self, filter: Option<&dyn TypeFilter<T>>) -> Vec<Arc<H>> {
        self.table.lock().snapshot(filter)
    }
}

impl<H: ?Sized, T: Copy> Default for Index<H, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: ?Sized, T> fmt::Debug for Index<H, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Index")
            .field("len", &self.table.lock().entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::StateFilter;
    use crate::types::{DestinationFlags, EntryType};
    use sib_statemodel::State;

    fn entry(key: Uuid, data: &str, state: State) -> Entry<str, EntryType> {
        Entry::new(
            key,
            Arc::from(data),
            EntryType::destination(state, DestinationFlags::default()),
        )
    }

    #[test]
    fn add_and_get() {
        let index = Index::new();
        let key = Uuid::new_v4();
        assert!(index.add(entry(key, "Q1", State::Active)).is_none());

        assert_eq!(index.get(&key, None).as_deref(), Some("Q1"));
        assert!(index.contains_key(&key));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn add_overwrites_existing_key() {
        let index = Index::new();
        let key = Uuid::new_v4();
        index.add(entry(key, "old", State::Active));
        let replaced = index.add(entry(key, "new", State::Active));

        assert_eq!(replaced.as_deref(), Some("old"));
        assert_eq!(index.get(&key, None).as_deref(), Some("new"));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn filtered_get_hides_non_matching() {
        let index = Index::new();
        let key = Uuid::new_v4();
        index.add(entry(key, "Q1", State::Corrupt));

        let visible = StateFilter::visible_only();
        assert!(index.get(&key, Some(&visible)).is_none());
        let corrupt = StateFilter::new().corrupt(true);
        assert!(index.get(&key, Some(&corrupt)).is_some());
    }

    #[test]
    fn get_type_is_a_snapshot() {
        let index = Index::new();
        let key = Uuid::new_v4();
        index.add(entry(key, "Q1", State::Unreconciled));

        let mut copy = index.get_type(&key).unwrap();
        copy.state = State::Active;
        assert_eq!(index.get_type(&key).unwrap().state, State::Unreconciled);

        assert!(index.set_type(&key, copy));
        assert_eq!(index.get_type(&key).unwrap().state, State::Active);
    }

    #[test]
    fn set_type_on_missing_key() {
        let index: Index<str, EntryType> = Index::new();
        let ty = EntryType::foreign_bus(State::Active);
        assert!(!index.set_type(&Uuid::new_v4(), ty));
    }

    #[test]
    fn remove_returns_data() {
        let index = Index::new();
        let key = Uuid::new_v4();
        index.add(entry(key, "Q1", State::Active));

        assert_eq!(index.remove(&key).as_deref(), Some("Q1"));
        assert!(index.remove(&key).is_none());
        assert!(index.is_empty());
    }

    #[test]
    fn snapshot_filters() {
        let index = Index::new();
        index.add(entry(Uuid::new_v4(), "A", State::Active));
        index.add(entry(Uuid::new_v4(), "B", State::DeletePending));
        index.add(entry(Uuid::new_v4(), "C", State::InDoubt));

        assert_eq!(index.snapshot(None).len(), 3);
        let mut visible: Vec<String> = index
            .snapshot(Some(&StateFilter::visible_only()))
            .iter()
            .map(|s| s.to_string())
            .collect();
        visible.sort();
        assert_eq!(visible, vec!["A", "C"]);
        assert_eq!(index.keys().len(), 3);
    }
}
