use std::fmt::Debug;
use std::hash::Hash;
use std::thread::{self, ThreadId};

use hashbrown::HashMap;
use parking_lot::Mutex;

use crate::errors::{Error, Result};

/// A record that can live in a [`Store`].
pub trait Record: Clone + Default {
    /// The key type this record is stored under.
    type Key: Clone + Eq + Hash + Debug;

    /// The key of this record.
    fn key(&self) -> Self::Key;

    /// A zero-initialized record with only the key fields set.
    fn with_key(key: Self::Key) -> Self;
}

/// A record that supports field-wise merging of a newer partial copy.
///
/// The merge never clears data: optional fields are copied only when set,
/// collections and strings only when non-empty, and plain scalars always.
pub trait Patch {
    fn merge(&mut self, newer: &Self);
}

/// A keyed, optionally size-bounded, in-memory store of records.
///
/// All operations serialize on an internal mutex, held only across
/// non-suspending critical sections. A bounded store evicts by ring-buffer
/// replacement: once full, each insertion overwrites the oldest slot.
pub struct Store<T: Record> {
    inner: Mutex<Inner<T>>,
    mutating: Mutex<Option<ThreadId>>,
    limit: Option<usize>,
}

struct Inner<T: Record> {
    entries: HashMap<T::Key, T>,
    ring: Vec<T::Key>,
    write_index: usize,
}

impl<T: Record> Store<T> {
    /// Creates an unbounded store.
    pub fn new() -> Self {
        Self::with_limit(None)
    }

    /// Creates a store bounded to `limit` entries.
    pub fn bounded(limit: usize) -> Self {
        Self::with_limit(Some(limit))
    }

    fn with_limit(limit: Option<usize>) -> Self {
        Store {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                ring: Vec::new(),
                write_index: 0,
            }),
            mutating: Mutex::new(None),
            limit,
        }
    }

    /// Inserts a record, evicting the oldest insertion if the store is full.
    ///
    /// Fails with [`Error::DuplicateKey`] if the key is already present.
    pub fn put(&self, value: T) -> Result<()> {
        self.guard_reentry();
        let mut inner = self.inner.lock();
        let key = value.key();
        if inner.entries.contains_key(&key) {
            return Err(Error::DuplicateKey);
        }
        if let Some(limit) = self.limit {
            let slot = inner.write_index % limit;
            if inner.ring.len() == limit {
                let evicted = std::mem::replace(&mut inner.ring[slot], key.clone());
                inner.entries.remove(&evicted);
            } else {
                inner.ring.push(key.clone());
            }
            inner.write_index += 1;
        }
        inner.entries.insert(key, value);
        Ok(())
    }

    /// Whether an entry exists under the given key.
    pub fn has(&self, key: &T::Key) -> bool {
        self.guard_reentry();
        self.inner.lock().entries.contains_key(key)
    }

    /// Returns a copy of the entry under the given key, if present.
    pub fn get(&self, key: &T::Key) -> Option<T> {
        self.guard_reentry();
        self.inner.lock().entries.get(key).cloned()
    }

    /// Removes the entry under the given key. Returns whether it existed.
    pub fn remove(&self, key: &T::Key) -> bool {
        self.guard_reentry();
        self.inner.lock().entries.remove(key).is_some()
    }

    /// Removes every known key, returning the subset that was not found.
    pub fn remove_all(&self, keys: &[T::Key]) -> Vec<T::Key> {
        self.guard_reentry();
        let mut inner = self.inner.lock();
        keys.iter()
            .filter(|key| inner.entries.remove(*key).is_none())
            .cloned()
            .collect()
    }

    /// Mutates the entry under `key` in place.
    ///
    /// If the entry is absent and `put_if_missing` is set, a zero-initialized
    /// record with the key fields set is synthesized, mutated and stored;
    /// otherwise the call fails with [`Error::NotFound`].
    ///
    /// The mutator must not call back into this store; doing so panics
    /// instead of deadlocking.
    pub fn update<F>(&self, key: T::Key, mutator: F, put_if_missing: bool) -> Result<()>
    where
        F: FnOnce(&mut T),
    {
        self.guard_reentry();
        let mut inner = self.inner.lock();
        if !inner.entries.contains_key(&key) {
            if !put_if_missing {
                return Err(Error::NotFound);
            }
            let mut synthesized = T::with_key(key.clone());
            self.in_mutator(|| mutator(&mut synthesized));
            inner.entries.insert(key, synthesized);
            return Ok(());
        }
        let entry = inner.entries.get_mut(&key).expect("entry vanished under lock");
        self.in_mutator(|| mutator(entry));
        Ok(())
    }

    /// Copies the set fields of `value` onto the stored entry with the same
    /// key, per the [`Patch`] merge rules.
    pub fn patch(&self, value: T, put_if_missing: bool) -> Result<()>
    where
        T: Patch,
    {
        self.update(value.key(), |entry| entry.merge(&value), put_if_missing)
    }

    /// A snapshot of all entries.
    pub fn values(&self) -> Vec<T> {
        self.guard_reentry();
        self.inner.lock().entries.values().cloned().collect()
    }

    /// The number of cached entries.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn in_mutator<R, F: FnOnce() -> R>(&self, f: F) -> R {
        *self.mutating.lock() = Some(thread::current().id());
        let result = f();
        *self.mutating.lock() = None;
        result
    }

    fn guard_reentry(&self) {
        if *self.mutating.lock() == Some(thread::current().id()) {
            panic!("cache mutator called back into its own store");
        }
    }
}

impl<T: Record> Default for Store<T> {
    fn default() -> Self {
        Store::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Default, Debug, PartialEq)]
    struct Entry {
        id: u64,
        name: String,
        tags: Vec<String>,
        flagged: bool,
    }

    impl Record for Entry {
        type Key = u64;

        fn key(&self) -> u64 {
            self.id
        }

        fn with_key(key: u64) -> Self {
            Entry { id: key, ..Default::default() }
        }
    }

    impl Patch for Entry {
        fn merge(&mut self, newer: &Self) {
            if !newer.name.is_empty() {
                self.name = newer.name.clone();
            }
            if !newer.tags.is_empty() {
                self.tags = newer.tags.clone();
            }
            self.flagged = newer.flagged;
        }
    }

    fn entry(id: u64, name: &str) -> Entry {
        Entry { id, name: name.to_string(), ..Default::default() }
    }

    #[test]
    fn duplicate_puts_fail() {
        let store = Store::new();
        store.put(entry(1, "a")).unwrap();
        assert_eq!(store.put(entry(1, "b")), Err(Error::DuplicateKey));
        assert_eq!(store.get(&1).unwrap().name, "a");
    }

    #[test]
    fn update_synthesizes_the_record_when_allowed() {
        let store: Store<Entry> = Store::new();
        assert_eq!(store.update(9, |e| e.name.push('x'), false), Err(Error::NotFound));
        store.update(9, |e| e.name.push('x'), true).unwrap();
        let stored = store.get(&9).unwrap();
        assert_eq!(stored.id, 9);
        assert_eq!(stored.name, "x");
    }

    #[test]
    fn bounded_stores_evict_the_oldest_insertion() {
        let store = Store::bounded(3);
        for id in 1..=3 {
            store.put(entry(id, "x")).unwrap();
        }
        store.put(entry(4, "x")).unwrap();
        assert!(!store.has(&1));
        assert!(store.has(&2) && store.has(&3) && store.has(&4));
        store.put(entry(5, "x")).unwrap();
        assert!(!store.has(&2));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn patch_never_clears_populated_fields() {
        let store = Store::new();
        store
            .put(Entry {
                id: 1,
                name: "keep".to_string(),
                tags: vec!["a".to_string()],
                flagged: true,
            })
            .unwrap();
        store.patch(Entry { id: 1, flagged: true, ..Default::default() }, false).unwrap();
        let stored = store.get(&1).unwrap();
        assert_eq!(stored.name, "keep");
        assert_eq!(stored.tags, vec!["a".to_string()]);
    }

    #[test]
    fn patch_can_create_missing_entries() {
        let store: Store<Entry> = Store::new();
        assert_eq!(store.patch(entry(2, "new"), false), Err(Error::NotFound));
        store.patch(entry(2, "new"), true).unwrap();
        assert_eq!(store.get(&2).unwrap().name, "new");
    }

    #[test]
    fn remove_all_reports_unknown_keys() {
        let store = Store::new();
        store.put(entry(1, "a")).unwrap();
        store.put(entry(2, "b")).unwrap();
        let missing = store.remove_all(&[1, 2, 3]);
        assert_eq!(missing, vec![3]);
        assert!(store.is_empty());
    }

    #[test]
    #[should_panic(expected = "called back into its own store")]
    fn reentrant_mutators_panic_instead_of_deadlocking() {
        let store: Store<Entry> = Store::new();
        store.put(entry(1, "a")).unwrap();
        store.update(1, |_| { store.has(&1); }, false).unwrap();
    }
}
