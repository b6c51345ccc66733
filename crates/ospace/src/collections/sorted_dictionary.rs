use std::collections::BTreeMap;

use ospace_state::{Subcategory, ValueCodec};

use crate::artifact::{
    impl_artifact, ArtifactCore, ArtifactKind, Element, OrdElement, Restore, StoredEntries,
};
use crate::collections::keyed::KeyedSlots;
use crate::error::{SpaceError, SpaceResult};
use crate::tracker::{EntryKey, EntrySource};

/// Ordered dictionary.
///
/// Enumeration is in ascending key order. Persistence is identical to
/// [`PersistedDictionary`](crate::PersistedDictionary): slots are assigned
/// by the free list, not by key order.
#[derive(Debug)]
pub struct PersistedSortedDictionary<K: OrdElement, V: Element> {
    core: ArtifactCore,
    entries: KeyedSlots<K, V, BTreeMap<K, usize>>,
}

impl<K: OrdElement, V: Element> PersistedSortedDictionary<K, V> {
    pub(crate) fn new(core: ArtifactCore) -> Self {
        Self {
            core,
            entries: KeyedSlots::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.len() == 0
    }

    /// Add a new entry. Fails with `DuplicateKey` if `key` is present.
    pub fn add(&mut self, key: K, value: V) -> SpaceResult<()> {
        if self.entries.contains(&key) {
            return Err(SpaceError::duplicate_key(&self.core.id));
        }
        self.entries.add(key, value, &mut self.core.tracker);
        Ok(())
    }

    /// Add or overwrite an entry, returning the previous value.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if self.entries.contains(&key) {
            return self.entries.replace(&key, value, &mut self.core.tracker);
        }
        self.entries.add(key, value, &mut self.core.tracker);
        None
    }

    pub fn get(&self, key: &K) -> SpaceResult<&V> {
        self.try_get(key)
            .ok_or_else(|| SpaceError::key_not_found(&self.core.id))
    }

    pub fn try_get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn update(&mut self, key: &K, f: impl FnOnce(&mut V)) -> SpaceResult<()> {
        let value = self
            .entries
            .value_mut(key, &mut self.core.tracker)
            .ok_or_else(|| SpaceError::key_not_found(&self.core.id))?;
        f(value);
        Ok(())
    }

    pub fn remove(&mut self, key: &K) -> bool {
        self.entries.remove(key, &mut self.core.tracker).is_some()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear(&mut self.core.tracker);
    }

    /// Entries in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.entries
            .index
            .values()
            .filter_map(|slot| self.entries.entry(*slot))
            .map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    /// The entry with the smallest key.
    pub fn first(&self) -> Option<(&K, &V)> {
        self.iter().next()
    }

    /// The entry with the largest key.
    pub fn last(&self) -> Option<(&K, &V)> {
        let (_, slot) = self.entries.index.iter().next_back()?;
        self.entries.entry(*slot).map(|(k, v)| (k, v))
    }
}

impl<K: OrdElement, V: Element + PartialEq> PersistedSortedDictionary<K, V> {
    pub fn contains(&self, key: &K, value: &V) -> bool {
        self.entries.get(key) == Some(value)
    }

    pub fn contains_value(&self, value: &V) -> bool {
        self.values().any(|v| v == value)
    }
}

impl<K: OrdElement, V: Element> EntrySource for PersistedSortedDictionary<K, V> {
    fn live_keys(&self) -> Vec<EntryKey> {
        self.entries.live_keys()
    }

    fn encode_entry(&self, key: &EntryKey, codec: ValueCodec) -> SpaceResult<Option<Vec<u8>>> {
        match self.entries.entry_for(key) {
            Some(pair) => self.core.encode(codec, pair),
            None => Ok(None),
        }
    }
}

impl<K: OrdElement, V: Element> Restore for PersistedSortedDictionary<K, V> {
    const KIND: ArtifactKind = ArtifactKind::SortedDictionary;

    fn restore(core: ArtifactCore, stored: &StoredEntries) -> SpaceResult<Self> {
        let pairs = stored.slots::<(K, V)>(Subcategory::Items)?;
        Ok(Self {
            core,
            entries: KeyedSlots::restore(pairs),
        })
    }
}

impl_artifact!(PersistedSortedDictionary<K: OrdElement, V: Element>);
