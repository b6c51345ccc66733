use ospace_state::{Subcategory, ValueCodec};

use crate::artifact::{impl_artifact, ArtifactCore, ArtifactKind, Element, Restore, StoredEntries};
use crate::error::{SpaceError, SpaceResult};
use crate::tracker::{EntryKey, EntryName, EntrySource};

const LENGTH: &str = "length";

/// Index-addressed growable list.
///
/// Element `i` is persisted at `items/i`, so the slot of an element is its
/// position. Inserting or removing at position `p` rewrites every slot from
/// `p` to the end; a removal additionally deletes the old last slot. The
/// `metadata/length` entry is written on creation, even when empty, and on
/// every length change.
#[derive(Debug)]
pub struct PersistedList<T: Element> {
    core: ArtifactCore,
    values: Vec<T>,
}

impl<T: Element> PersistedList<T> {
    pub(crate) fn new(mut core: ArtifactCore) -> Self {
        core.tracker.mark_metadata(LENGTH);
        Self {
            core,
            values: Vec::new(),
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the list has no elements.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn check(&self, index: usize, bound: usize) -> SpaceResult<()> {
        if index >= bound {
            return Err(SpaceError::out_of_range(
                &self.core.id,
                "index",
                format!("{index} not in [0, {bound})"),
            ));
        }
        Ok(())
    }

    /// Read the element at `index`.
    pub fn get(&self, index: usize) -> SpaceResult<&T> {
        self.check(index, self.values.len())?;
        Ok(&self.values[index])
    }

    /// Overwrite the element at `index`.
    pub fn set(&mut self, index: usize, value: T) -> SpaceResult<()> {
        self.check(index, self.values.len())?;
        self.values[index] = value;
        self.core.tracker.mark_item(index);
        Ok(())
    }

    /// Append an element.
    pub fn add(&mut self, value: T) {
        self.values.push(value);
        self.core.tracker.mark_item(self.values.len() - 1);
        self.core.tracker.mark_metadata(LENGTH);
    }

    /// Insert at `index`; `index == len()` appends.
    pub fn insert(&mut self, index: usize, value: T) -> SpaceResult<()> {
        self.check(index, self.values.len() + 1)?;
        self.values.insert(index, value);
        self.core.tracker.mark_items(index..self.values.len());
        self.core.tracker.mark_metadata(LENGTH);
        Ok(())
    }

    /// Remove and return the element at `index`.
    pub fn remove_at(&mut self, index: usize) -> SpaceResult<T> {
        self.check(index, self.values.len())?;
        let old_len = self.values.len();
        let value = self.values.remove(index);
        self.core.tracker.mark_items(index..old_len);
        self.core.tracker.mark_metadata(LENGTH);
        Ok(value)
    }

    /// Remove every element.
    pub fn clear(&mut self) {
        self.core.tracker.mark_items(0..self.values.len());
        self.core.tracker.mark_metadata(LENGTH);
        self.values.clear();
    }

    /// Iterate in index order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.values.iter()
    }

    /// View the elements as a slice.
    pub fn as_slice(&self) -> &[T] {
        &self.values
    }
}

impl<T: Element + PartialEq> PersistedList<T> {
    /// Position of the first element equal to `value`.
    pub fn index_of(&self, value: &T) -> Option<usize> {
        self.values.iter().position(|v| v == value)
    }

    /// Returns `true` if some element equals `value`.
    pub fn contains(&self, value: &T) -> bool {
        self.index_of(value).is_some()
    }

    /// Remove the first element equal to `value`.
    pub fn remove(&mut self, value: &T) -> bool {
        match self.index_of(value) {
            Some(index) => self.remove_at(index).is_ok(),
            None => false,
        }
    }
}

impl<T: Element> EntrySource for PersistedList<T> {
    fn live_keys(&self) -> Vec<EntryKey> {
        let mut keys: Vec<EntryKey> = (0..self.values.len()).map(EntryKey::item).collect();
        keys.push(EntryKey::metadata(LENGTH));
        keys
    }

    fn encode_entry(&self, key: &EntryKey, codec: ValueCodec) -> SpaceResult<Option<Vec<u8>>> {
        match (&key.sub, &key.name) {
            (Subcategory::Items, EntryName::Slot(slot)) => match self.values.get(*slot as usize) {
                Some(value) => self.core.encode(codec, value),
                None => Ok(None),
            },
            (Subcategory::Metadata, EntryName::Named(name)) if name == LENGTH => {
                self.core.encode(codec, &(self.values.len() as u64))
            }
            _ => Ok(None),
        }
    }
}

impl<T: Element> Restore for PersistedList<T> {
    const KIND: ArtifactKind = ArtifactKind::List;

    fn restore(core: ArtifactCore, stored: &StoredEntries) -> SpaceResult<Self> {
        let length: u64 = stored.require_metadata(LENGTH)?;
        let values: Vec<T> = stored.dense(Subcategory::Items)?;
        if values.len() as u64 != length {
            return Err(stored.corrupt(format!(
                "list length {length} but {} items",
                values.len()
            )));
        }
        Ok(Self { core, values })
    }
}

impl_artifact!(PersistedList<T: Element>);

impl<'a, T: Element> IntoIterator for &'a PersistedList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
