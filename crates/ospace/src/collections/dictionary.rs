use std::collections::HashMap;

use ospace_state::{Subcategory, ValueCodec};

use crate::artifact::{
    impl_artifact, ArtifactCore, ArtifactKind, Element, HashElement, Restore, StoredEntries,
};
use crate::collections::keyed::KeyedSlots;
use crate::error::{SpaceError, SpaceResult};
use crate::tracker::{EntryKey, EntrySource};

/// Hash dictionary. Each entry occupies one slot, persisted as
/// `items/<slot>` holding the `(key, value)` pair. Removed slots are reused
/// by later additions, most recently freed first.
#[derive(Debug)]
pub struct PersistedDictionary<K: HashElement, V: Element> {
    core: ArtifactCore,
    entries: KeyedSlots<K, V, HashMap<K, usize>>,
}

impl<K: HashElement, V: Element> PersistedDictionary<K, V> {
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

    /// Read the value for `key`. Fails with `KeyNotFound` if absent.
    pub fn get(&self, key: &K) -> SpaceResult<&V> {
        self.try_get(key)
            .ok_or_else(|| SpaceError::key_not_found(&self.core.id))
    }

    pub fn try_get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    /// Modify the value for `key` in place.
    pub fn update(&mut self, key: &K, f: impl FnOnce(&mut V)) -> SpaceResult<()> {
        let value = self
            .entries
            .value_mut(key, &mut self.core.tracker)
            .ok_or_else(|| SpaceError::key_not_found(&self.core.id))?;
        f(value);
        Ok(())
    }

    /// Remove the entry for `key`. Returns `false` if it was absent.
    pub fn remove(&mut self, key: &K) -> bool {
        self.entries.remove(key, &mut self.core.tracker).is_some()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear(&mut self.core.tracker);
    }

    /// Entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.entries.iter().map(|(_, v)| v)
    }
}

impl<K: HashElement, V: Element + PartialEq> PersistedDictionary<K, V> {
    /// Returns `true` if `key` maps to `value`.
    pub fn contains(&self, key: &K, value: &V) -> bool {
        self.entries.get(key) == Some(value)
    }

    pub fn contains_value(&self, value: &V) -> bool {
        self.values().any(|v| v == value)
    }
}

impl<K: HashElement, V: Element> EntrySource for PersistedDictionary<K, V> {
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

impl<K: HashElement, V: Element> Restore for PersistedDictionary<K, V> {
    const KIND: ArtifactKind = ArtifactKind::Dictionary;

    fn restore(core: ArtifactCore, stored: &StoredEntries) -> SpaceResult<Self> {
        let pairs = stored.slots::<(K, V)>(Subcategory::Items)?;
        Ok(Self {
            core,
            entries: KeyedSlots::restore(pairs),
        })
    }
}

impl_artifact!(PersistedDictionary<K: HashElement, V: Element>);
