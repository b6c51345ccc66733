use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use ospace_state::{Subcategory, ValueCodec};

use crate::artifact::{impl_artifact, ArtifactCore, ArtifactKind, OrdElement, Restore, StoredEntries};
use crate::collections::keyed::KeyedSlots;
use crate::error::{SpaceError, SpaceResult};
use crate::tracker::{EntryKey, EntrySource};

/// Ordered set. Enumerates in ascending order; slots are still assigned by
/// the free list, so the persisted layout is the same as [`PersistedSet`].
///
/// [`PersistedSet`]: crate::PersistedSet
#[derive(Debug)]
pub struct PersistedSortedSet<T: OrdElement> {
    core: ArtifactCore,
    members: KeyedSlots<T, (), BTreeMap<T, usize>>,
}

impl<T: OrdElement> PersistedSortedSet<T> {
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

    pub fn add(&mut self, value: T) -> bool {
        self.members.add_member(value, &mut self.core.tracker)
    }

    pub fn remove(&mut self, value: &T) -> bool {
        self.members.remove(value, &mut self.core.tracker).is_some()
    }

    pub fn remove_where(&mut self, predicate: impl FnMut(&T) -> bool) -> usize {
        self.members.remove_where(predicate, &mut self.core.tracker)
    }

    pub fn contains(&self, value: &T) -> bool {
        self.members.contains(value)
    }

    pub fn clear(&mut self) {
        self.members.clear(&mut self.core.tracker);
    }

    /// Elements in ascending order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + '_ {
        self.members.index.keys()
    }

    /// Elements in descending order.
    pub fn reverse(&self) -> impl Iterator<Item = &T> + '_ {
        self.iter().rev()
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }

    pub fn first(&self) -> Option<&T> {
        self.members.index.keys().next()
    }

    pub fn last(&self) -> Option<&T> {
        self.members.index.keys().next_back()
    }

    /// A live view of the elements in `[low, high]`.
    ///
    /// Fails with `InvalidArgument` if `low > high`.
    pub fn view_between(&mut self, low: T, high: T) -> SpaceResult<SortedSetView<'_, T>> {
        if low > high {
            return Err(SpaceError::invalid(format!(
                "view lower bound is above upper bound in {}",
                self.core.id
            )));
        }
        Ok(SortedSetView {
            set: self,
            bounds: low..=high,
        })
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

impl<T: OrdElement + Default> PersistedSortedSet<T> {
    /// The smallest element, or `T::default()` when empty.
    pub fn min(&self) -> T {
        self.first().cloned().unwrap_or_default()
    }

    /// The largest element, or `T::default()` when empty.
    pub fn max(&self) -> T {
        self.last().cloned().unwrap_or_default()
    }
}

/// The elements of a [`PersistedSortedSet`] within inclusive bounds.
///
/// Reads see the parent's current contents. Additions and removals through
/// the view go to the parent; additions outside the bounds fail with
/// `OutOfRange`.
#[derive(Debug)]
pub struct SortedSetView<'a, T: OrdElement> {
    set: &'a mut PersistedSortedSet<T>,
    bounds: RangeInclusive<T>,
}

impl<'a, T: OrdElement> SortedSetView<'a, T> {
    pub fn lower(&self) -> &T {
        self.bounds.start()
    }

    pub fn upper(&self) -> &T {
        self.bounds.end()
    }

    fn in_bounds(&self, value: &T) -> bool {
        self.bounds.contains(value)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + '_ {
        self.set.members.index.range(self.bounds.clone()).map(|(v, _)| v)
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    pub fn contains(&self, value: &T) -> bool {
        self.in_bounds(value) && self.set.contains(value)
    }

    pub fn first(&self) -> Option<&T> {
        self.iter().next()
    }

    pub fn last(&self) -> Option<&T> {
        self.iter().next_back()
    }

    /// Add through to the parent set.
    pub fn add(&mut self, value: T) -> SpaceResult<bool> {
        if !self.in_bounds(&value) {
            return Err(SpaceError::out_of_range(
                &self.set.core.id,
                "value",
                "outside the view bounds",
            ));
        }
        Ok(self.set.add(value))
    }

    /// Remove from the parent set. Values outside the bounds are not in the
    /// view, so removing them returns `false`.
    pub fn remove(&mut self, value: &T) -> bool {
        self.in_bounds(value) && self.set.remove(value)
    }

    /// Remove every element within the bounds from the parent set.
    pub fn clear(&mut self) {
        let doomed: Vec<T> = self.iter().cloned().collect();
        for value in &doomed {
            self.set.remove(value);
        }
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}

impl<'a, T: OrdElement + Default> SortedSetView<'a, T> {
    /// The smallest element in the view, or `T::default()` when empty.
    pub fn min(&self) -> T {
        self.first().cloned().unwrap_or_default()
    }

    /// The largest element in the view, or `T::default()` when empty.
    pub fn max(&self) -> T {
        self.last().cloned().unwrap_or_default()
    }
}

impl<T: OrdElement> EntrySource for PersistedSortedSet<T> {
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

impl<T: OrdElement> Restore for PersistedSortedSet<T> {
    const KIND: ArtifactKind = ArtifactKind::SortedSet;

    fn restore(core: ArtifactCore, stored: &StoredEntries) -> SpaceResult<Self> {
        let slots = stored.slots::<T>(Subcategory::Items)?;
        Ok(Self {
            core,
            members: KeyedSlots::restore(slots.into_iter().map(|(s, v)| (s, (v, ()))).collect()),
        })
    }
}

impl_artifact!(PersistedSortedSet<T: OrdElement>);
