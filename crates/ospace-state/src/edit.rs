//! Edits emitted by a save and the change set that groups them.
//!
//! A save produces an ordered [`StateChangeSet`]. Each [`Edit`] is either an
//! `AddOrUpdate` carrying an encoded value or a key-only `Delete`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The two operations a state writer understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EditKind {
    AddOrUpdate,
    Delete,
}

impl fmt::Display for EditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddOrUpdate => write!(f, "AddOrUpdate"),
            Self::Delete => write!(f, "Delete"),
        }
    }
}

/// A single write or delete against the backing store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edit {
    /// The operation.
    pub kind: EditKind,
    /// Full category path, e.g. `state/item/foo/items`.
    pub category: String,
    /// Key within the category, e.g. `"2"` or `"length"`.
    pub key: String,
    /// Encoded value; `None` for deletes.
    pub value: Option<Vec<u8>>,
}

impl Edit {
    /// Build an `AddOrUpdate` edit.
    pub fn add_or_update(
        category: impl Into<String>,
        key: impl Into<String>,
        value: Vec<u8>,
    ) -> Self {
        Self {
            kind: EditKind::AddOrUpdate,
            category: category.into(),
            key: key.into(),
            value: Some(value),
        }
    }

    /// Build a `Delete` edit.
    pub fn delete(category: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            kind: EditKind::Delete,
            category: category.into(),
            key: key.into(),
            value: None,
        }
    }

    /// Returns `true` if this edit removes a key.
    pub fn is_delete(&self) -> bool {
        self.kind == EditKind::Delete
    }
}

impl fmt::Display for Edit {
    /// Renders as `AddOrUpdate(state/index, foo)` without the value bytes.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}, {})", self.kind, self.category, self.key)
    }
}

/// The ordered list of edits produced by one save.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChangeSet {
    /// The edits, in emission order.
    pub edits: Vec<Edit>,
}

impl StateChangeSet {
    /// Create an empty change set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the save had nothing to write.
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Number of edits.
    pub fn len(&self) -> usize {
        self.edits.len()
    }

    /// Append an edit.
    pub fn push(&mut self, edit: Edit) {
        self.edits.push(edit);
    }

    /// Iterate over the edits in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Edit> {
        self.edits.iter()
    }

    /// Number of `AddOrUpdate` edits.
    pub fn writes(&self) -> usize {
        self.edits.iter().filter(|e| !e.is_delete()).count()
    }

    /// Number of `Delete` edits.
    pub fn deletes(&self) -> usize {
        self.edits.iter().filter(|e| e.is_delete()).count()
    }

    /// Human-readable form of every edit, used heavily by tests.
    pub fn describe(&self) -> Vec<String> {
        self.edits.iter().map(ToString::to_string).collect()
    }
}

impl Extend<Edit> for StateChangeSet {
    fn extend<I: IntoIterator<Item = Edit>>(&mut self, iter: I) {
        self.edits.extend(iter);
    }
}

impl IntoIterator for StateChangeSet {
    type Item = Edit;
    type IntoIter = std::vec::IntoIter<Edit>;

    fn into_iter(self) -> Self::IntoIter {
        self.edits.into_iter()
    }
}

impl<'a> IntoIterator for &'a StateChangeSet {
    type Item = &'a Edit;
    type IntoIter = std::slice::Iter<'a, Edit>;

    fn into_iter(self) -> Self::IntoIter {
        self.edits.iter()
    }
}
