//! Dirty tracking for differential saves.
//!
//! Every artifact owns a [`DirtyTracker`] holding two key sets:
//!
//! - `persisted` -- keys present in the backing store as of the last save
//!   (or load)
//! - `dirty` -- keys touched since then
//!
//! A differential save looks at each dirty key once: if the key is live it is
//! written, if it is gone but persisted it is deleted, otherwise nothing is
//! emitted. Remove-then-reuse of the same slot therefore collapses into one
//! write, and add-then-remove of a never-saved slot collapses into nothing.

use std::collections::BTreeSet;
use std::fmt;

use ospace_state::{EditKind, Subcategory, ValueCodec};

use crate::error::SpaceResult;

/// The key of an entry inside one subcategory.
///
/// Slot keys sort before named keys, and slot keys sort numerically.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntryName {
    Slot(u64),
    Named(String),
}

impl EntryName {
    /// Parse a persisted key. Canonical decimal strings become slots.
    pub fn parse(key: &str) -> Self {
        match key.parse::<u64>() {
            Ok(slot) if slot.to_string() == key => Self::Slot(slot),
            _ => Self::Named(key.to_string()),
        }
    }

    /// The slot number, if this is a slot key.
    pub fn slot(&self) -> Option<u64> {
        match self {
            Self::Slot(slot) => Some(*slot),
            Self::Named(_) => None,
        }
    }
}

impl fmt::Display for EntryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Slot(slot) => write!(f, "{slot}"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

/// A `(subcategory, key)` pair identifying one persisted entry of an
/// artifact.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryKey {
    pub sub: Subcategory,
    pub name: EntryName,
}

impl EntryKey {
    pub fn slot(sub: Subcategory, slot: impl Into<u64>) -> Self {
        Self {
            sub,
            name: EntryName::Slot(slot.into()),
        }
    }

    pub fn named(sub: Subcategory, name: &str) -> Self {
        Self {
            sub,
            name: EntryName::Named(name.to_string()),
        }
    }

    pub fn item(slot: usize) -> Self {
        Self::slot(Subcategory::Items, slot as u64)
    }

    pub fn data(slot: usize) -> Self {
        Self::slot(Subcategory::Data, slot as u64)
    }

    pub fn links(slot: usize) -> Self {
        Self::slot(Subcategory::Metadata, slot as u64)
    }

    pub fn metadata(name: &str) -> Self {
        Self::named(Subcategory::Metadata, name)
    }
}

/// Anything whose live entries can be enumerated and encoded.
pub(crate) trait EntrySource {
    /// Every live entry key.
    fn live_keys(&self) -> Vec<EntryKey>;

    /// The encoded value of a live entry, or `None` if the key is not live.
    fn encode_entry(&self, key: &EntryKey, codec: ValueCodec) -> SpaceResult<Option<Vec<u8>>>;
}

/// An edit relative to one artifact, before category names are resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct EntryEdit {
    pub kind: EditKind,
    pub key: EntryKey,
    pub value: Option<Vec<u8>>,
}

/// Per-artifact record of what changed since the last save.
#[derive(Clone, Debug, Default)]
pub struct DirtyTracker {
    enabled: bool,
    dirty: BTreeSet<EntryKey>,
    persisted: BTreeSet<EntryKey>,
}

impl DirtyTracker {
    /// A tracker for a freshly created artifact. Disabled trackers ignore
    /// every mark (volatile spaces).
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Default::default()
        }
    }

    /// A tracker for an artifact read back from the backing store.
    pub fn loaded(persisted: BTreeSet<EntryKey>) -> Self {
        Self {
            enabled: true,
            dirty: BTreeSet::new(),
            persisted,
        }
    }

    /// Record that `key` must be reconsidered on the next save.
    pub fn mark(&mut self, key: EntryKey) {
        if self.enabled {
            self.dirty.insert(key);
        }
    }

    /// Mark an item slot.
    pub fn mark_item(&mut self, slot: usize) {
        self.mark(EntryKey::item(slot));
    }

    /// Mark a range of item slots.
    pub fn mark_items(&mut self, slots: std::ops::Range<usize>) {
        for slot in slots {
            self.mark_item(slot);
        }
    }

    /// Mark a named metadata entry.
    pub fn mark_metadata(&mut self, name: &str) {
        self.mark(EntryKey::metadata(name));
    }

    /// Returns `true` if a differential save may have something to emit.
    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Keys currently present in the backing store.
    pub fn persisted(&self) -> &BTreeSet<EntryKey> {
        &self.persisted
    }

    /// Adopt keys left behind by a deleted artifact with the same id.
    ///
    /// They are still in the backing store, so they count as persisted and
    /// are marked dirty: the next differential save rewrites the ones that
    /// are live again and deletes the rest.
    pub fn inherit(&mut self, keys: BTreeSet<EntryKey>) {
        if !self.enabled {
            return;
        }
        self.dirty.extend(keys.iter().cloned());
        self.persisted.extend(keys);
    }

    /// Edits for a differential save, in key order.
    pub(crate) fn differential<S>(&self, source: &S, codec: ValueCodec) -> SpaceResult<Vec<EntryEdit>>
    where
        S: EntrySource + ?Sized,
    {
        let mut edits = Vec::new();
        for key in &self.dirty {
            match source.encode_entry(key, codec)? {
                Some(value) => edits.push(EntryEdit {
                    kind: EditKind::AddOrUpdate,
                    key: key.clone(),
                    value: Some(value),
                }),
                None if self.persisted.contains(key) => edits.push(EntryEdit {
                    kind: EditKind::Delete,
                    key: key.clone(),
                    value: None,
                }),
                None => {}
            }
        }
        Ok(edits)
    }

    /// Edits for a full save: every live entry, in key order.
    pub(crate) fn full<S>(&self, source: &S, codec: ValueCodec) -> SpaceResult<Vec<EntryEdit>>
    where
        S: EntrySource + ?Sized,
    {
        let keys: BTreeSet<EntryKey> = source.live_keys().into_iter().collect();
        let mut edits = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(value) = source.encode_entry(&key, codec)? {
                edits.push(EntryEdit {
                    kind: EditKind::AddOrUpdate,
                    key,
                    value: Some(value),
                });
            }
        }
        Ok(edits)
    }

    /// Fold a successful save back into the tracker.
    pub(crate) fn commit(&mut self, edits: &[EntryEdit], full: bool) {
        if !self.enabled {
            return;
        }
        if full {
            self.persisted.clear();
        }
        for edit in edits {
            match edit.kind {
                EditKind::AddOrUpdate => {
                    self.persisted.insert(edit.key.clone());
                }
                EditKind::Delete => {
                    self.persisted.remove(&edit.key);
                }
            }
        }
        self.dirty.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    /// Minimal source: a map of live keys to raw bytes.
    struct Live(BTreeMap<EntryKey, Vec<u8>>);

    impl EntrySource for Live {
        fn live_keys(&self) -> Vec<EntryKey> {
            self.0.keys().cloned().collect()
        }

        fn encode_entry(&self, key: &EntryKey, _: ValueCodec) -> SpaceResult<Option<Vec<u8>>> {
            Ok(self.0.get(key).cloned())
        }
    }

    fn live(keys: &[EntryKey]) -> Live {
        Live(keys.iter().map(|k| (k.clone(), vec![1])).collect())
    }

    fn kinds(edits: &[EntryEdit]) -> Vec<(EditKind, String)> {
        edits
            .iter()
            .map(|e| (e.kind, format!("{}/{}", e.key.sub, e.key.name)))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Entry keys
    // -----------------------------------------------------------------------

    #[test]
    fn entry_name_parse() {
        assert_eq!(EntryName::parse("12"), EntryName::Slot(12));
        assert_eq!(EntryName::parse("length"), EntryName::Named("length".into()));
        assert_eq!(EntryName::parse("007"), EntryName::Named("007".into()));
        assert_eq!(EntryName::parse("-1"), EntryName::Named("-1".into()));
    }

    #[test]
    fn keys_sort_by_subcategory_then_slot() {
        let mut keys = vec![
            EntryKey::metadata("length"),
            EntryKey::item(10),
            EntryKey::links(0),
            EntryKey::item(2),
            EntryKey::data(1),
        ];
        keys.sort();
        let rendered: Vec<String> = keys
            .iter()
            .map(|k| format!("{}/{}", k.sub, k.name))
            .collect();
        assert_eq!(
            rendered,
            vec!["items/2", "items/10", "data/1", "metadata/0", "metadata/length"]
        );
    }

    // -----------------------------------------------------------------------
    // Differential
    // -----------------------------------------------------------------------

    #[test]
    fn dirty_live_key_is_written() {
        let mut tracker = DirtyTracker::new(true);
        tracker.mark_item(0);
        let edits = tracker.differential(&live(&[EntryKey::item(0)]), ValueCodec::Json).unwrap();
        assert_eq!(kinds(&edits), vec![(EditKind::AddOrUpdate, "items/0".into())]);
    }

    #[test]
    fn dead_never_persisted_key_is_silent() {
        let mut tracker = DirtyTracker::new(true);
        tracker.mark_item(3);
        let edits = tracker.differential(&live(&[]), ValueCodec::Json).unwrap();
        assert!(edits.is_empty());
    }

    #[test]
    fn dead_persisted_key_is_deleted() {
        let mut tracker = DirtyTracker::loaded([EntryKey::item(1)].into_iter().collect());
        tracker.mark_item(1);
        let edits = tracker.differential(&live(&[]), ValueCodec::Json).unwrap();
        assert_eq!(kinds(&edits), vec![(EditKind::Delete, "items/1".into())]);

        tracker.commit(&edits, false);
        assert!(tracker.persisted().is_empty());
        assert!(!tracker.is_dirty());
    }

    #[test]
    fn disabled_tracker_ignores_marks() {
        let mut tracker = DirtyTracker::new(false);
        tracker.mark_item(0);
        tracker.inherit([EntryKey::item(5)].into_iter().collect());
        assert!(!tracker.is_dirty());
        assert!(tracker.persisted().is_empty());
    }

    // -----------------------------------------------------------------------
    // Full + commit
    // -----------------------------------------------------------------------

    #[test]
    fn full_save_ignores_dirty_state() {
        let tracker = DirtyTracker::new(true);
        let source = live(&[EntryKey::metadata("length"), EntryKey::item(0)]);
        let edits = tracker.full(&source, ValueCodec::Json).unwrap();
        assert_eq!(
            kinds(&edits),
            vec![
                (EditKind::AddOrUpdate, "items/0".into()),
                (EditKind::AddOrUpdate, "metadata/length".into()),
            ]
        );
    }

    #[test]
    fn full_commit_replaces_persisted_set() {
        let mut tracker = DirtyTracker::loaded([EntryKey::item(7)].into_iter().collect());
        let source = live(&[EntryKey::item(0)]);
        let edits = tracker.full(&source, ValueCodec::Json).unwrap();
        tracker.commit(&edits, true);
        assert_eq!(
            tracker.persisted().iter().cloned().collect::<Vec<_>>(),
            vec![EntryKey::item(0)]
        );
    }

    #[test]
    fn inherited_keys_are_rewritten_or_deleted() {
        let mut tracker = DirtyTracker::new(true);
        tracker.inherit([EntryKey::item(0), EntryKey::item(1)].into_iter().collect());
        tracker.mark_item(0);
        let edits = tracker.differential(&live(&[EntryKey::item(0)]), ValueCodec::Json).unwrap();
        assert_eq!(
            kinds(&edits),
            vec![
                (EditKind::AddOrUpdate, "items/0".into()),
                (EditKind::Delete, "items/1".into()),
            ]
        );
    }
}
