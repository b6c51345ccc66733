//! Key-addressed storage over a slot arena, shared by the dictionary and set
//! kinds.
//!
//! Entries live in a [`SlotArena`]; a key index (hash or ordered) maps each
//! key to its slot. The slot number is the persisted item key, so reuse of a
//! freed slot turns a remove-then-add into a single overwrite.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use ospace_state::Subcategory;

use crate::arena::SlotArena;
use crate::collections::compare::SetComparison;
use crate::tracker::{DirtyTracker, EntryKey, EntryName};

/// Key -> slot lookup.
pub(crate) trait SlotIndex<K>: Default {
    fn slot(&self, key: &K) -> Option<usize>;
    fn insert(&mut self, key: K, slot: usize);
    fn remove(&mut self, key: &K) -> Option<usize>;
    fn clear(&mut self);
}

impl<K: Hash + Eq> SlotIndex<K> for HashMap<K, usize> {
    fn slot(&self, key: &K) -> Option<usize> {
        self.get(key).copied()
    }

    fn insert(&mut self, key: K, slot: usize) {
        HashMap::insert(self, key, slot);
    }

    fn remove(&mut self, key: &K) -> Option<usize> {
        HashMap::remove(self, key)
    }

    fn clear(&mut self) {
        HashMap::clear(self);
    }
}

impl<K: Ord> SlotIndex<K> for BTreeMap<K, usize> {
    fn slot(&self, key: &K) -> Option<usize> {
        self.get(key).copied()
    }

    fn insert(&mut self, key: K, slot: usize) {
        BTreeMap::insert(self, key, slot);
    }

    fn remove(&mut self, key: &K) -> Option<usize> {
        BTreeMap::remove(self, key)
    }

    fn clear(&mut self) {
        BTreeMap::clear(self);
    }
}

#[derive(Debug)]
pub(crate) struct KeyedSlots<K, V, I> {
    pub arena: SlotArena<(K, V)>,
    pub index: I,
}

impl<K: Clone, V, I: SlotIndex<K>> KeyedSlots<K, V, I> {
    pub fn new() -> Self {
        Self {
            arena: SlotArena::new(),
            index: I::default(),
        }
    }

    /// Rebuild from persisted `(slot, (key, value))` pairs.
    pub fn restore(pairs: Vec<(usize, (K, V))>) -> Self {
        let mut index = I::default();
        for (slot, (key, _)) in &pairs {
            index.insert(key.clone(), *slot);
        }
        Self {
            arena: SlotArena::from_entries(pairs),
            index,
        }
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.index.slot(key).is_some()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        let slot = self.index.slot(key)?;
        self.arena.get(slot).map(|(_, v)| v)
    }

    pub fn entry(&self, slot: usize) -> Option<&(K, V)> {
        self.arena.get(slot)
    }

    /// Store a key known to be absent.
    pub fn add(&mut self, key: K, value: V, tracker: &mut DirtyTracker) -> usize {
        let slot = self.arena.insert((key.clone(), value));
        self.index.insert(key, slot);
        tracker.mark_item(slot);
        slot
    }

    /// Mutable access to the value of a present key. Marks its slot.
    pub fn value_mut(&mut self, key: &K, tracker: &mut DirtyTracker) -> Option<&mut V> {
        let slot = self.index.slot(key)?;
        tracker.mark_item(slot);
        self.arena.get_mut(slot).map(|(_, v)| v)
    }

    /// Overwrite the value of a present key, returning the old value.
    pub fn replace(&mut self, key: &K, value: V, tracker: &mut DirtyTracker) -> Option<V> {
        let old = self.value_mut(key, tracker)?;
        Some(std::mem::replace(old, value))
    }

    pub fn remove(&mut self, key: &K, tracker: &mut DirtyTracker) -> Option<(K, V)> {
        let slot = self.index.remove(key)?;
        tracker.mark_item(slot);
        self.arena.remove(slot)
    }

    pub fn clear(&mut self, tracker: &mut DirtyTracker) {
        for slot in self.arena.indices() {
            tracker.mark_item(slot);
        }
        self.arena.clear();
        self.index.clear();
    }

    /// Iterate in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &(K, V)> + '_ {
        self.arena.iter().map(|(_, kv)| kv)
    }

    pub fn live_keys(&self) -> Vec<EntryKey> {
        self.arena.indices().map(EntryKey::item).collect()
    }

    /// The entry behind an `items/<slot>` key, if live.
    pub fn entry_for(&self, key: &EntryKey) -> Option<&(K, V)> {
        match (&key.sub, &key.name) {
            (Subcategory::Items, EntryName::Slot(slot)) => {
                self.arena.get(usize::try_from(*slot).ok()?)
            }
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Set algebra over member-only slots
// ---------------------------------------------------------------------------

/// Distinct elements of `other` in first-seen order, deduplicated with the
/// same index type the set uses.
fn distinct<T: Clone, I: SlotIndex<T>>(other: impl IntoIterator<Item = T>) -> (Vec<T>, I) {
    let mut seen = I::default();
    let mut out = Vec::new();
    for value in other {
        if seen.slot(&value).is_none() {
            seen.insert(value.clone(), out.len());
            out.push(value);
        }
    }
    (out, seen)
}

impl<T: Clone, I: SlotIndex<T>> KeyedSlots<T, (), I> {
    /// Add a member. Returns `false` if already present.
    pub fn add_member(&mut self, value: T, tracker: &mut DirtyTracker) -> bool {
        if self.contains(&value) {
            return false;
        }
        self.add(value, (), tracker);
        true
    }

    /// Remove every member for which `remove` returns `true`, in slot order.
    pub fn remove_where(
        &mut self,
        mut remove: impl FnMut(&T) -> bool,
        tracker: &mut DirtyTracker,
    ) -> usize {
        let doomed: Vec<T> = self
            .iter()
            .filter(|(v, _)| remove(v))
            .map(|(v, _)| v.clone())
            .collect();
        for value in &doomed {
            self.remove(value, tracker);
        }
        doomed.len()
    }

    pub fn union_with(&mut self, other: impl IntoIterator<Item = T>, tracker: &mut DirtyTracker) {
        for value in other {
            self.add_member(value, tracker);
        }
    }

    pub fn intersect_with(&mut self, other: impl IntoIterator<Item = T>, tracker: &mut DirtyTracker) {
        let (_, keep) = distinct::<T, I>(other);
        self.remove_where(|v| keep.slot(v).is_none(), tracker);
    }

    pub fn except_with(&mut self, other: impl IntoIterator<Item = T>, tracker: &mut DirtyTracker) {
        for value in other {
            self.remove(&value, tracker);
        }
    }

    pub fn symmetric_except_with(
        &mut self,
        other: impl IntoIterator<Item = T>,
        tracker: &mut DirtyTracker,
    ) {
        let (values, _) = distinct::<T, I>(other);
        for value in values {
            if self.remove(&value, tracker).is_none() {
                self.add(value, (), tracker);
            }
        }
    }

    pub fn compare(&self, other: impl IntoIterator<Item = T>) -> SetComparison {
        let (values, _) = distinct::<T, I>(other);
        SetComparison {
            self_len: self.len(),
            other_len: values.len(),
            common: values.iter().filter(|v| self.contains(v)).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Hashed = KeyedSlots<i32, &'static str, HashMap<i32, usize>>;

    #[test]
    fn remove_then_add_reuses_slot() {
        let mut tracker = DirtyTracker::new(true);
        let mut keyed = Hashed::new();
        for k in [2, 3, 5, 7] {
            keyed.add(k, "v", &mut tracker);
        }
        assert_eq!(keyed.remove(&5, &mut tracker), Some((5, "v")));
        assert_eq!(keyed.add(11, "w", &mut tracker), 2);
        assert_eq!(keyed.get(&11), Some(&"w"));
        assert!(!keyed.contains(&5));
    }

    #[test]
    fn restore_rebuilds_index() {
        let keyed = Hashed::restore(vec![(0, (1, "a")), (3, (4, "d"))]);
        assert_eq!(keyed.len(), 2);
        assert_eq!(keyed.get(&4), Some(&"d"));
        assert_eq!(keyed.entry(3), Some(&(4, "d")));
        assert_eq!(keyed.arena.next_index(), 1);
    }

    #[test]
    fn replace_keeps_slot() {
        let mut tracker = DirtyTracker::new(true);
        let mut keyed: KeyedSlots<&str, i32, BTreeMap<&str, usize>> = KeyedSlots::new();
        keyed.add("a", 1, &mut tracker);
        assert_eq!(keyed.replace(&"a", 2, &mut tracker), Some(1));
        assert_eq!(keyed.replace(&"b", 2, &mut tracker), None);
        assert_eq!(keyed.live_keys(), vec![EntryKey::item(0)]);
    }

    // -----------------------------------------------------------------------
    // Set algebra
    // -----------------------------------------------------------------------

    type Members = KeyedSlots<i32, (), HashMap<i32, usize>>;

    fn members(values: &[i32]) -> (Members, DirtyTracker) {
        let mut tracker = DirtyTracker::new(true);
        let mut set = Members::new();
        for v in values {
            set.add_member(*v, &mut tracker);
        }
        (set, tracker)
    }

    fn sorted(set: &Members) -> Vec<i32> {
        let mut out: Vec<i32> = set.iter().map(|(v, _)| *v).collect();
        out.sort();
        out
    }

    #[test]
    fn union_and_intersect() {
        let (mut set, mut tracker) = members(&[1, 2, 3]);
        set.union_with([3, 4, 4], &mut tracker);
        assert_eq!(sorted(&set), vec![1, 2, 3, 4]);
        set.intersect_with([2, 4, 9], &mut tracker);
        assert_eq!(sorted(&set), vec![2, 4]);
    }

    #[test]
    fn symmetric_except_ignores_duplicate_input() {
        let (mut set, mut tracker) = members(&[1, 2]);
        set.symmetric_except_with([2, 3, 3], &mut tracker);
        assert_eq!(sorted(&set), vec![1, 3]);
    }

    #[test]
    fn operations_against_own_snapshot() {
        let (mut set, mut tracker) = members(&[1, 2, 3]);
        let snapshot: Vec<i32> = sorted(&set);
        set.union_with(snapshot.clone(), &mut tracker);
        set.intersect_with(snapshot.clone(), &mut tracker);
        assert_eq!(sorted(&set), snapshot);
        assert!(set.compare(snapshot.clone()).set_equals());

        set.symmetric_except_with(snapshot.clone(), &mut tracker);
        assert_eq!(set.len(), 0);

        let (mut set, mut tracker) = members(&[1, 2, 3]);
        set.except_with(snapshot, &mut tracker);
        assert_eq!(set.len(), 0);
    }

    #[test]
    fn compare_counts_distinct_input() {
        let (set, _) = members(&[1, 2]);
        let cmp = set.compare([1, 1, 5]);
        assert_eq!(
            cmp,
            SetComparison {
                self_len: 2,
                other_len: 2,
                common: 1
            }
        );
    }

    #[test]
    fn remove_where_counts_removals() {
        let (mut set, mut tracker) = members(&[1, 2, 3, 4]);
        assert_eq!(set.remove_where(|v| v % 2 == 0, &mut tracker), 2);
        assert_eq!(sorted(&set), vec![1, 3]);
    }
}
