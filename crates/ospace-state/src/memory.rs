use std::collections::BTreeMap;
use std::sync::RwLock;

use tracing::trace;

use crate::edit::{EditKind, StateChangeSet};
use crate::error::{StateError, StateResult};
use crate::traits::{StateReader, StateWriter};

type Categories = BTreeMap<String, BTreeMap<String, Vec<u8>>>;

/// In-memory, map-based state store.
///
/// Implements both [`StateWriter`] and [`StateReader`], so a space can save
/// into it and a fresh space can load back out of it. Intended for tests and
/// embedding. Empty categories are pruned so `categories()` only reports
/// categories that hold keys.
pub struct InMemoryStateStore {
    categories: RwLock<Categories>,
}

impl InMemoryStateStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            categories: RwLock::new(BTreeMap::new()),
        }
    }

    /// Total number of keys across all categories.
    pub fn len(&self) -> usize {
        self.categories
            .read()
            .map(|map| map.values().map(BTreeMap::len).sum())
            .unwrap_or(0)
    }

    /// Returns `true` if the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove everything from the store.
    pub fn clear(&self) -> StateResult<()> {
        self.categories
            .write()
            .map_err(|_| StateError::LockPoisoned)?
            .clear();
        Ok(())
    }

    /// Every `(category, key)` pair, sorted.
    pub fn all_keys(&self) -> StateResult<Vec<(String, String)>> {
        let map = self.categories.read().map_err(|_| StateError::LockPoisoned)?;
        Ok(map
            .iter()
            .flat_map(|(category, keys)| {
                keys.keys().map(move |key| (category.clone(), key.clone()))
            })
            .collect())
    }
}

impl Default for InMemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

fn check_key(category: &str, key: &str) -> StateResult<()> {
    if category.is_empty() || key.is_empty() {
        return Err(StateError::InvalidKey {
            category: category.to_string(),
            key: key.to_string(),
            reason: "category and key must be non-empty".into(),
        });
    }
    Ok(())
}

fn insert_into(map: &mut Categories, category: &str, key: &str, value: &[u8]) {
    map.entry(category.to_string())
        .or_default()
        .insert(key.to_string(), value.to_vec());
}

fn remove_from(map: &mut Categories, category: &str, key: &str) {
    if let Some(keys) = map.get_mut(category) {
        keys.remove(key);
        if keys.is_empty() {
            map.remove(category);
        }
    }
}

impl StateWriter for InMemoryStateStore {
    fn add_or_update(&self, category: &str, key: &str, value: &[u8]) -> StateResult<()> {
        check_key(category, key)?;
        let mut map = self.categories.write().map_err(|_| StateError::LockPoisoned)?;
        insert_into(&mut map, category, key, value);
        Ok(())
    }

    fn delete(&self, category: &str, key: &str) -> StateResult<()> {
        check_key(category, key)?;
        let mut map = self.categories.write().map_err(|_| StateError::LockPoisoned)?;
        remove_from(&mut map, category, key);
        Ok(())
    }

    /// Applies the whole set under one write lock. Every edit is validated
    /// first, so a rejected set leaves the store untouched.
    fn apply(&self, changes: &StateChangeSet) -> StateResult<()> {
        for edit in changes {
            check_key(&edit.category, &edit.key)?;
            if edit.kind == EditKind::AddOrUpdate && edit.value.is_none() {
                return Err(StateError::MissingValue {
                    category: edit.category.clone(),
                    key: edit.key.clone(),
                });
            }
        }
        let mut map = self.categories.write().map_err(|_| StateError::LockPoisoned)?;
        for edit in changes {
            match (&edit.kind, &edit.value) {
                (EditKind::AddOrUpdate, Some(value)) => {
                    insert_into(&mut map, &edit.category, &edit.key, value)
                }
                _ => remove_from(&mut map, &edit.category, &edit.key),
            }
        }
        trace!(edits = changes.len(), "change set applied");
        Ok(())
    }
}

impl StateReader for InMemoryStateStore {
    fn categories(&self) -> StateResult<Vec<String>> {
        let map = self.categories.read().map_err(|_| StateError::LockPoisoned)?;
        Ok(map.keys().cloned().collect())
    }

    fn keys(&self, category: &str) -> StateResult<Vec<String>> {
        let map = self.categories.read().map_err(|_| StateError::LockPoisoned)?;
        Ok(map
            .get(category)
            .map(|keys| keys.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn read(&self, category: &str, key: &str) -> StateResult<Option<Vec<u8>>> {
        let map = self.categories.read().map_err(|_| StateError::LockPoisoned)?;
        Ok(map.get(category).and_then(|keys| keys.get(key)).cloned())
    }
}

impl std::fmt::Debug for InMemoryStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStateStore")
            .field("key_count", &self.len())
            .finish()
    }
}
