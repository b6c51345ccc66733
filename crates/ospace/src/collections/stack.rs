use ospace_state::{Subcategory, ValueCodec};

use crate::artifact::{impl_artifact, ArtifactCore, ArtifactKind, Element, Restore, StoredEntries};
use crate::error::{SpaceError, SpaceResult};
use crate::tracker::{EntryKey, EntryName, EntrySource};

/// LIFO stack. The bottom element lives at `items/0`, the top at
/// `items/len-1`; a push writes one slot and a pop deletes one.
#[derive(Debug)]
pub struct PersistedStack<T: Element> {
    core: ArtifactCore,
    values: Vec<T>,
}

impl<T: Element> PersistedStack<T> {
    pub(crate) fn new(core: ArtifactCore) -> Self {
        Self {
            core,
            values: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Push onto the top.
    pub fn push(&mut self, value: T) {
        self.values.push(value);
        self.core.tracker.mark_item(self.values.len() - 1);
    }

    /// Pop the top element.
    pub fn pop(&mut self) -> SpaceResult<T> {
        self.try_pop()
            .ok_or_else(|| SpaceError::empty(&self.core.id))
    }

    /// Pop the top element, or `None` when empty.
    pub fn try_pop(&mut self) -> Option<T> {
        let value = self.values.pop()?;
        self.core.tracker.mark_item(self.values.len());
        Some(value)
    }

    /// The top element.
    pub fn peek(&self) -> SpaceResult<&T> {
        self.values
            .last()
            .ok_or_else(|| SpaceError::empty(&self.core.id))
    }

    /// Remove every element.
    pub fn clear(&mut self) {
        self.core.tracker.mark_items(0..self.values.len());
        self.values.clear();
    }

    /// Iterate from top to bottom, the order `pop` would yield.
    pub fn iter(&self) -> std::iter::Rev<std::slice::Iter<'_, T>> {
        self.values.iter().rev()
    }
}

impl<T: Element + PartialEq> PersistedStack<T> {
    pub fn contains(&self, value: &T) -> bool {
        self.values.contains(value)
    }
}

impl<T: Element> EntrySource for PersistedStack<T> {
    fn live_keys(&self) -> Vec<EntryKey> {
        (0..self.values.len()).map(EntryKey::item).collect()
    }

    fn encode_entry(&self, key: &EntryKey, codec: ValueCodec) -> SpaceResult<Option<Vec<u8>>> {
        match (&key.sub, &key.name) {
            (Subcategory::Items, EntryName::Slot(slot)) => match self.values.get(*slot as usize) {
                Some(value) => self.core.encode(codec, value),
                None => Ok(None),
            },
            _ => Ok(None),
        }
    }
}

impl<T: Element> Restore for PersistedStack<T> {
    const KIND: ArtifactKind = ArtifactKind::Stack;

    fn restore(core: ArtifactCore, stored: &StoredEntries) -> SpaceResult<Self> {
        Ok(Self {
            core,
            values: stored.dense(Subcategory::Items)?,
        })
    }
}

impl_artifact!(PersistedStack<T: Element>);
