use crate::edit::{Edit, EditKind, StateChangeSet};
use crate::error::{StateError, StateResult};

/// Sink for the edits produced by a save.
///
/// Implementations must apply edits in the order given. The writer never
/// interprets values; it is a pure `(category, key) -> bytes` store.
pub trait StateWriter: Send + Sync {
    /// Create or overwrite the value at `category/key`.
    fn add_or_update(&self, category: &str, key: &str, value: &[u8]) -> StateResult<()>;

    /// Remove `category/key`. Deleting an absent key is not an error.
    fn delete(&self, category: &str, key: &str) -> StateResult<()>;

    /// Apply a whole change set.
    ///
    /// Default implementation applies each edit in turn. Backends may
    /// override to batch the writes.
    fn apply(&self, changes: &StateChangeSet) -> StateResult<()> {
        for edit in changes {
            self.apply_edit(edit)?;
        }
        Ok(())
    }

    /// Apply a single edit.
    fn apply_edit(&self, edit: &Edit) -> StateResult<()> {
        match edit.kind {
            EditKind::AddOrUpdate => {
                let value = edit.value.as_deref().ok_or_else(|| StateError::MissingValue {
                    category: edit.category.clone(),
                    key: edit.key.clone(),
                })?;
                self.add_or_update(&edit.category, &edit.key, value)
            }
            EditKind::Delete => self.delete(&edit.category, &edit.key),
        }
    }
}

/// Source of previously written state.
pub trait StateReader: Send + Sync {
    /// All categories that currently hold at least one key.
    fn categories(&self) -> StateResult<Vec<String>>;

    /// Keys within a category. An unknown category yields an empty list.
    fn keys(&self, category: &str) -> StateResult<Vec<String>>;

    /// Read one value. Returns `Ok(None)` if the key does not exist.
    fn read(&self, category: &str, key: &str) -> StateResult<Option<Vec<u8>>>;

    /// All `(key, value)` pairs of a category.
    ///
    /// Default implementation calls `keys()` then `read()` for each key.
    fn entries(&self, category: &str) -> StateResult<Vec<(String, Vec<u8>)>> {
        let mut out = Vec::new();
        for key in self.keys(category)? {
            if let Some(value) = self.read(category, &key)? {
                out.push((key, value));
            }
        }
        Ok(out)
    }
}
