use std::collections::HashMap;

use ospace_state::{Subcategory, ValueCodec};

use crate::artifact::{impl_artifact, ArtifactCore, ArtifactKind, HashElement, Restore, StoredEntries};
use crate::collections::keyed::KeyedSlots;
use crate::error::SpaceResult;
use crate::tracker::{EntryKey, EntrySource};

/// Unordered set of unique elements, one element per `items/<slot>`.
///
/// The set-algebra operations accept any sequence. To combine a set with
/// itself, pass a snapshot: `set.union_with(set.to_vec())`.
#[derive(Debug)]
pub struct PersistedSet<T: HashElement> {
    core: ArtifactCore,
    members: KeyedSlots<T, (), HashMap<T, usize>>,
}

impl<T: HashElement> PersistedSet<T> {
    pub(crate) fn new(core: ArtifactCore) -> Self {
        Self {
            core,
            members: KeyedSlots::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.len() == 0
    }

    /// Add an element. Returns `false` if it was already present.
    pub fn add(&mut self, value: T) -> bool {
        self.members.add_member(value, &mut self.core.tracker)
    }

    /// Remove an element. Returns `false` if it was absent.
    pub fn remove(&mut self, value: &T) -> bool {
        self.members.remove(value, &mut self.core.tracker).is_some()
    }

    /// Remove every element matching `predicate`; returns how many.
    pub fn remove_where(&mut self, predicate: impl FnMut(&T) -> bool) -> usize {
        self.members.remove_where(predicate, &mut self.core.tracker)
    }

    pub fn contains(&self, value: &T) -> bool {
        self.members.contains(value)
    }

    pub fn clear(&mut self) {
        self.members.clear(&mut self.core.tracker);
    }

    /// Elements in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.members.iter().map(|(v, _)| v)
    }

    /// A snapshot of the elements in slot order.
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }

    pub fn union_with(&mut self, other: impl IntoIterator<Item = T>) {
        self.members.union_with(other, &mut self.core.tracker);
    }

    pub fn intersect_with(&mut self, other: impl IntoIterator<Item = T>) {
        self.members.intersect_with(other, &mut self.core.tracker);
    }

    pub fn except_with(&mut self, other: impl IntoIterator<Item = T>) {
        self.members.except_with(other, &mut self.core.tracker);
    }

    /// Keep the elements in exactly one of `self` and `other`.
    pub fn symmetric_except_with(&mut self, other: impl IntoIterator<Item = T>) {
        self.members
            .symmetric_except_with(other, &mut self.core.tracker);
    }

    pub fn set_equals(&self, other: impl IntoIterator<Item = T>) -> bool {
        self.members.compare(other).set_equals()
    }

    pub fn is_subset_of(&self, other: impl IntoIterator<Item = T>) -> bool {
        self.members.compare(other).is_subset()
    }

    pub fn is_proper_subset_of(&self, other: impl IntoIterator<Item = T>) -> bool {
        self.members.compare(other).is_proper_subset()
    }

    pub fn is_superset_of(&self, other: impl IntoIterator<Item = T>) -> bool {
        self.members.compare(other).is_superset()
    }

    pub fn is_proper_superset_of(&self, other: impl IntoIterator<Item = T>) -> bool {
        self.members.compare(other).is_proper_superset()
    }

    pub fn overlaps(&self, other: impl IntoIterator<Item = T>) -> bool {
        self.members.compare(other).overlaps()
    }
}

impl<T: HashElement> EntrySource for PersistedSet<T> {
    fn live_keys(&self) -> Vec<EntryKey> {
        self.members.live_keys()
    }

    fn encode_entry(&self, key: &EntryKey, codec: ValueCodec) -> SpaceResult<Option<Vec<u8>>> {
        match self.members.entry_for(key) {
            Some((value, _)) => self.core.encode(codec, value),
            None => Ok(None),
        }
    }
}

impl<T: HashElement> Restore for PersistedSet<T> {
    const KIND: ArtifactKind = ArtifactKind::Set;

    fn restore(core: ArtifactCore, stored: &StoredEntries) -> SpaceResult<Self> {
        let slots = stored.slots::<T>(Subcategory::Items)?;
        Ok(Self {
            core,
            members: KeyedSlots::restore(slots.into_iter().map(|(s, v)| (s, (v, ()))).collect()),
        })
    }
}

impl_artifact!(PersistedSet<T: HashElement>);

#[cfg(test)]
mod tests {
    use super::*;

    fn set(values: &[i32]) -> PersistedSet<i32> {
        let mut s = PersistedSet::new(ArtifactCore::new("s", true));
        for v in values {
            s.add(*v);
        }
        s
    }

    fn sorted(s: &PersistedSet<i32>) -> Vec<i32> {
        let mut v = s.to_vec();
        v.sort();
        v
    }

    // -----------------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------------

    #[test]
    fn add_reports_novelty() {
        let mut s = set(&[1]);
        assert!(!s.add(1));
        assert!(s.add(2));
        assert_eq!(s.len(), 2);
        assert!(s.remove(&1));
        assert!(!s.remove(&1));
    }

    #[test]
    fn elements_encode_bare() {
        let s = set(&[42]);
        assert_eq!(
            s.encode_entry(&EntryKey::item(0), ValueCodec::Json).unwrap(),
            Some(b"42".to_vec())
        );
    }

    #[test]
    fn remove_where_filters() {
        let mut s = set(&[1, 2, 3, 4, 5]);
        assert_eq!(s.remove_where(|v| *v > 3), 2);
        assert_eq!(sorted(&s), vec![1, 2, 3]);
    }

    // -----------------------------------------------------------------------
    // Predicates
    // -----------------------------------------------------------------------

    #[test]
    fn predicates_do_not_mutate() {
        let s = set(&[1, 2, 3]);
        assert!(s.set_equals([3, 2, 1, 1]));
        assert!(s.is_subset_of([1, 2, 3, 4]));
        assert!(s.is_proper_subset_of([1, 2, 3, 4]));
        assert!(!s.is_proper_subset_of([1, 2, 3]));
        assert!(s.is_superset_of([2]));
        assert!(s.is_proper_superset_of([2, 3]));
        assert!(s.overlaps([9, 3]));
        assert!(!s.overlaps([9]));
        assert_eq!(sorted(&s), vec![1, 2, 3]);
    }

    #[test]
    fn empty_set_predicates() {
        let s = set(&[]);
        assert!(s.is_subset_of(Vec::<i32>::new()));
        assert!(s.is_subset_of([1]));
        assert!(s.is_superset_of(Vec::<i32>::new()));
        assert!(!s.overlaps(Vec::<i32>::new()));
    }

    // -----------------------------------------------------------------------
    // Algebra
    // -----------------------------------------------------------------------

    #[test]
    fn with_own_snapshot() {
        let mut s = set(&[1, 2, 3]);
        s.union_with(s.to_vec());
        s.intersect_with(s.to_vec());
        assert_eq!(sorted(&s), vec![1, 2, 3]);

        s.except_with(s.to_vec());
        assert!(s.is_empty());

        let mut s = set(&[1, 2, 3]);
        s.symmetric_except_with(s.to_vec());
        assert!(s.is_empty());
    }

    #[test]
    fn symmetric_except() {
        let mut s = set(&[1, 2, 3]);
        s.symmetric_except_with([3, 4, 4]);
        assert_eq!(sorted(&s), vec![1, 2, 4]);
    }
}
