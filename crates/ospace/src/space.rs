//! The object space: a registry of named artifacts sharing one id namespace.
//!
//! ```text
//!   ObjectSpace
//!     entries:    id -> (creation seq, index state, Box<dyn Persistable>)
//!     tombstones: deleted ids whose keys are still in the backing store
//! ```
//!
//! A save walks artifacts in creation order, then tombstones. For each
//! artifact it emits the index edit (if any) followed by the artifact's own
//! edits in key order. The space only commits the result into the dirty
//! trackers once the edits have been produced (and, for
//! [`save_to`](ObjectSpace::save_to), applied) without error.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use ospace_state::{Edit, KeySpace, StateChangeSet, StateReader, StateWriter};
use tracing::{debug, info, warn};

use crate::artifact::{
    Artifact, ArtifactCore, ArtifactKind, Element, HashElement, OrdElement, Persistable, RawArtifact,
    Restore, StoredEntries,
};
use crate::collections::{
    PersistedArray, PersistedDictionary, PersistedLinkedList, PersistedList, PersistedQueue,
    PersistedSet, PersistedSortedDictionary, PersistedSortedSet, PersistedStack, PersistedValue,
};
use crate::config::SpaceConfig;
use crate::error::{SpaceError, SpaceResult};
use crate::tracker::{EntryEdit, EntryKey, EntryName};

struct Entry {
    seq: u64,
    /// The index entry must be (re)written on the next differential save.
    index_dirty: bool,
    /// The index entry is present in the backing store.
    index_persisted: bool,
    artifact: Box<dyn Persistable>,
}

/// A deleted artifact whose keys have not yet been deleted from the backing
/// store.
struct Tombstone {
    id: String,
    index_persisted: bool,
    keys: BTreeSet<EntryKey>,
}

/// Edits computed by a save, kept per artifact until they are committed.
struct PreparedSave {
    changes: StateChangeSet,
    per_artifact: Vec<(String, Vec<EntryEdit>)>,
    full: bool,
}

/// A registry of named, persisted collection artifacts.
pub struct ObjectSpace {
    config: SpaceConfig,
    keys: KeySpace,
    entries: HashMap<String, Entry>,
    tombstones: Vec<Tombstone>,
    next_seq: u64,
}

impl ObjectSpace {
    /// A persisted space with the default configuration.
    pub fn new() -> Self {
        Self::with_config(SpaceConfig::default())
    }

    /// A volatile space: same artifact behaviour, saves and loads do nothing.
    pub fn volatile() -> Self {
        Self::with_config(SpaceConfig::volatile())
    }

    pub fn with_config(config: SpaceConfig) -> Self {
        Self {
            keys: config.key_space(),
            config,
            entries: HashMap::new(),
            tombstones: Vec::new(),
            next_seq: 0,
        }
    }

    pub fn config(&self) -> &SpaceConfig {
        &self.config
    }

    /// Number of live artifacts.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Live artifact ids in creation (or load) order.
    pub fn ids(&self) -> Vec<&str> {
        let mut entries: Vec<(&String, &Entry)> = self.entries.iter().collect();
        entries.sort_by_key(|(_, entry)| entry.seq);
        entries.into_iter().map(|(id, _)| id.as_str()).collect()
    }

    /// The kind registered under `id`, if any.
    pub fn kind_of(&self, id: &str) -> Option<ArtifactKind> {
        self.entries.get(id).map(|entry| entry.artifact.kind())
    }

    /// Returns `true` if a differential save would emit at least one edit.
    pub fn has_pending_changes(&self) -> bool {
        !self.tombstones.is_empty()
            || self
                .entries
                .values()
                .any(|entry| entry.index_dirty || entry.artifact.core().tracker.is_dirty())
    }

    // -----------------------------------------------------------------------
    // Create / get / delete
    // -----------------------------------------------------------------------

    fn validate_id(id: &str) -> SpaceResult<()> {
        if id.is_empty() {
            return Err(SpaceError::invalid("artifact id must not be empty"));
        }
        Ok(())
    }

    fn create<A: Restore>(
        &mut self,
        id: &str,
        build: impl FnOnce(ArtifactCore) -> A,
    ) -> SpaceResult<&mut A> {
        Self::validate_id(id)?;
        if self.entries.contains_key(id) {
            return Err(SpaceError::AlreadyExists { id: id.to_string() });
        }

        let tracking = self.config.is_persisted();
        let mut core = ArtifactCore::new(id, tracking);
        let mut index_persisted = false;
        if let Some(pos) = self.tombstones.iter().position(|t| t.id == id) {
            let tombstone = self.tombstones.remove(pos);
            core.tracker.inherit(tombstone.keys);
            index_persisted = tombstone.index_persisted;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        let entry = Entry {
            seq,
            index_dirty: tracking,
            index_persisted,
            artifact: Box::new(build(core)),
        };
        let kind = A::KIND;
        debug!(id = %id, kind = %kind, "artifact created");

        let entry = self.entries.entry(id.to_string()).or_insert(entry);
        entry
            .artifact
            .as_any_mut()
            .downcast_mut::<A>()
            .ok_or_else(|| SpaceError::not_found(id))
    }

    fn get<A: Restore>(&mut self, id: &str) -> SpaceResult<&mut A> {
        Self::validate_id(id)?;
        let entry = self
            .entries
            .get_mut(id)
            .ok_or_else(|| SpaceError::not_found(id))?;
        if entry.artifact.kind() != A::KIND {
            return Err(SpaceError::not_found(id));
        }

        if let Some(raw) = entry.artifact.as_any().downcast_ref::<RawArtifact>() {
            let restored = A::restore(raw.core.clone(), &raw.stored)?;
            let kind = A::KIND;
            debug!(id = %id, kind = %kind, "artifact materialized");
            entry.artifact = Box::new(restored);
        }

        entry
            .artifact
            .as_any_mut()
            .downcast_mut::<A>()
            .ok_or_else(|| SpaceError::not_found(id))
    }

    /// Remove an artifact. Its persisted keys are deleted by the next
    /// differential save.
    pub fn delete(&mut self, id: &str) -> SpaceResult<()> {
        Self::validate_id(id)?;
        let entry = self
            .entries
            .remove(id)
            .ok_or_else(|| SpaceError::not_found(id))?;
        let keys = entry.artifact.core().tracker.persisted().clone();
        if self.config.is_persisted() && (entry.index_persisted || !keys.is_empty()) {
            self.tombstones.push(Tombstone {
                id: id.to_string(),
                index_persisted: entry.index_persisted,
                keys,
            });
        }
        debug!(id = %id, kind = %entry.artifact.kind(), "artifact deleted");
        Ok(())
    }

    pub fn create_array<T: Element + Default>(
        &mut self,
        id: &str,
        length: usize,
    ) -> SpaceResult<&mut PersistedArray<T>> {
        self.create(id, |core| {
            PersistedArray::new(core, std::iter::repeat_with(T::default).take(length).collect())
        })
    }

    pub fn get_array<T: Element>(&mut self, id: &str) -> SpaceResult<&mut PersistedArray<T>> {
        self.get(id)
    }

    pub fn create_dictionary<K: HashElement, V: Element>(
        &mut self,
        id: &str,
    ) -> SpaceResult<&mut PersistedDictionary<K, V>> {
        self.create(id, PersistedDictionary::new)
    }

    pub fn get_dictionary<K: HashElement, V: Element>(
        &mut self,
        id: &str,
    ) -> SpaceResult<&mut PersistedDictionary<K, V>> {
        self.get(id)
    }

    pub fn create_linked_list<T: Element>(
        &mut self,
        id: &str,
    ) -> SpaceResult<&mut PersistedLinkedList<T>> {
        self.create(id, PersistedLinkedList::new)
    }

    pub fn get_linked_list<T: Element>(
        &mut self,
        id: &str,
    ) -> SpaceResult<&mut PersistedLinkedList<T>> {
        self.get(id)
    }

    pub fn create_list<T: Element>(&mut self, id: &str) -> SpaceResult<&mut PersistedList<T>> {
        self.create(id, PersistedList::new)
    }

    pub fn get_list<T: Element>(&mut self, id: &str) -> SpaceResult<&mut PersistedList<T>> {
        self.get(id)
    }

    pub fn create_queue<T: Element>(&mut self, id: &str) -> SpaceResult<&mut PersistedQueue<T>> {
        self.create(id, PersistedQueue::new)
    }

    pub fn get_queue<T: Element>(&mut self, id: &str) -> SpaceResult<&mut PersistedQueue<T>> {
        self.get(id)
    }

    pub fn create_set<T: HashElement>(&mut self, id: &str) -> SpaceResult<&mut PersistedSet<T>> {
        self.create(id, PersistedSet::new)
    }

    pub fn get_set<T: HashElement>(&mut self, id: &str) -> SpaceResult<&mut PersistedSet<T>> {
        self.get(id)
    }

    pub fn create_sorted_dictionary<K: OrdElement, V: Element>(
        &mut self,
        id: &str,
    ) -> SpaceResult<&mut PersistedSortedDictionary<K, V>> {
        self.create(id, PersistedSortedDictionary::new)
    }

    pub fn get_sorted_dictionary<K: OrdElement, V: Element>(
        &mut self,
        id: &str,
    ) -> SpaceResult<&mut PersistedSortedDictionary<K, V>> {
        self.get(id)
    }

    pub fn create_sorted_set<T: OrdElement>(
        &mut self,
        id: &str,
    ) -> SpaceResult<&mut PersistedSortedSet<T>> {
        self.create(id, PersistedSortedSet::new)
    }

    pub fn get_sorted_set<T: OrdElement>(
        &mut self,
        id: &str,
    ) -> SpaceResult<&mut PersistedSortedSet<T>> {
        self.get(id)
    }

    pub fn create_stack<T: Element>(&mut self, id: &str) -> SpaceResult<&mut PersistedStack<T>> {
        self.create(id, PersistedStack::new)
    }

    pub fn get_stack<T: Element>(&mut self, id: &str) -> SpaceResult<&mut PersistedStack<T>> {
        self.get(id)
    }

    /// Create a value artifact holding `T::default()`.
    pub fn create_value<T: Element + Default>(
        &mut self,
        id: &str,
    ) -> SpaceResult<&mut PersistedValue<T>> {
        self.create_value_with(id, T::default())
    }

    /// Create a value artifact holding `initial`.
    pub fn create_value_with<T: Element>(
        &mut self,
        id: &str,
        initial: T,
    ) -> SpaceResult<&mut PersistedValue<T>> {
        self.create(id, |core| PersistedValue::new(core, initial))
    }

    pub fn get_value<T: Element>(&mut self, id: &str) -> SpaceResult<&mut PersistedValue<T>> {
        self.get(id)
    }

    // -----------------------------------------------------------------------
    // Save
    // -----------------------------------------------------------------------

    fn edit_for(&self, id: &str, edit: &EntryEdit) -> Edit {
        let category = self.keys.item_category(id, edit.key.sub);
        let key = edit.key.name.to_string();
        match &edit.value {
            Some(value) => Edit::add_or_update(category, key, value.clone()),
            None => Edit::delete(category, key),
        }
    }

    fn prepare(&self, differential: bool) -> SpaceResult<PreparedSave> {
        let codec = self.config.codec;
        let index = self.keys.index_category();
        let mut changes = StateChangeSet::new();
        let mut per_artifact = Vec::with_capacity(self.entries.len());

        let mut entries: Vec<(&String, &Entry)> = self.entries.iter().collect();
        entries.sort_by_key(|(_, entry)| entry.seq);

        for (id, entry) in entries {
            let artifact = entry.artifact.as_ref();
            if !differential || entry.index_dirty {
                let tag = codec
                    .encode(&artifact.kind())
                    .map_err(|e| SpaceError::codec(id, e))?;
                changes.push(Edit::add_or_update(index.as_str(), id.as_str(), tag));
            }
            let tracker = &artifact.core().tracker;
            let edits = if differential {
                tracker.differential(artifact, codec)?
            } else {
                tracker.full(artifact, codec)?
            };
            changes.extend(edits.iter().map(|edit| self.edit_for(id, edit)));
            per_artifact.push((id.clone(), edits));
        }

        if differential {
            for tombstone in &self.tombstones {
                if tombstone.index_persisted {
                    changes.push(Edit::delete(index.as_str(), tombstone.id.as_str()));
                }
                for key in &tombstone.keys {
                    changes.push(Edit::delete(
                        self.keys.item_category(&tombstone.id, key.sub),
                        key.name.to_string(),
                    ));
                }
            }
        }

        Ok(PreparedSave {
            changes,
            per_artifact,
            full: !differential,
        })
    }

    fn commit(&mut self, prepared: PreparedSave) -> StateChangeSet {
        for (id, edits) in &prepared.per_artifact {
            if let Some(entry) = self.entries.get_mut(id) {
                entry.index_dirty = false;
                entry.index_persisted = true;
                entry
                    .artifact
                    .core_mut()
                    .tracker
                    .commit(edits, prepared.full);
            }
        }
        self.tombstones.clear();
        prepared.changes
    }

    /// Produce the edits for a save and commit them.
    ///
    /// With `differential` set, only entries touched since the last save are
    /// emitted (writes for live keys, deletes for vacated ones). Otherwise
    /// every live entry is written and nothing is deleted. A volatile space
    /// always returns an empty change set.
    pub fn save(&mut self, differential: bool) -> SpaceResult<StateChangeSet> {
        if !self.config.is_persisted() {
            return Ok(StateChangeSet::new());
        }
        let prepared = self.prepare(differential)?;
        let changes = self.commit(prepared);
        info!(
            differential,
            writes = changes.writes(),
            deletes = changes.deletes(),
            "space saved"
        );
        Ok(changes)
    }

    /// Save into `writer`. The trackers are only committed if the writer
    /// accepts every edit; on error the same edits are produced again by the
    /// next save.
    pub fn save_to(&mut self, writer: &dyn StateWriter, differential: bool) -> SpaceResult<usize> {
        if !self.config.is_persisted() {
            return Ok(0);
        }
        let prepared = self.prepare(differential)?;
        writer.apply(&prepared.changes)?;
        let changes = self.commit(prepared);
        info!(
            differential,
            writes = changes.writes(),
            deletes = changes.deletes(),
            "space saved to writer"
        );
        Ok(changes.len())
    }

    // -----------------------------------------------------------------------
    // Load
    // -----------------------------------------------------------------------

    /// Replace every artifact with the state held by `reader`.
    ///
    /// Artifact contents stay encoded until the first typed `get_*` call.
    /// In a volatile space this does nothing.
    pub fn load(&mut self, reader: &dyn StateReader) -> SpaceResult<()> {
        if !self.config.is_persisted() {
            return Ok(());
        }
        let codec = self.config.codec;

        let mut index: Vec<(String, ArtifactKind)> = Vec::new();
        for (id, tag) in reader.entries(&self.keys.index_category())? {
            let kind: ArtifactKind = codec.decode(&tag).map_err(|e| SpaceError::codec(&id, e))?;
            index.push((id, kind));
        }
        index.sort_by(|(a, _), (b, _)| a.cmp(b));

        let mut stored: HashMap<String, BTreeMap<EntryKey, Vec<u8>>> = index
            .iter()
            .map(|(id, _)| (id.clone(), BTreeMap::new()))
            .collect();
        for category in reader.categories()? {
            let Some((id, sub)) = self.keys.parse_item_category(&category) else {
                continue;
            };
            let Some(entries) = stored.get_mut(&id) else {
                warn!(category = %category, "entries for an id missing from the index; skipping");
                continue;
            };
            for (key, value) in reader.entries(&category)? {
                entries.insert(
                    EntryKey {
                        sub,
                        name: EntryName::parse(&key),
                    },
                    value,
                );
            }
        }

        self.entries.clear();
        self.tombstones.clear();
        self.next_seq = 0;
        for (id, kind) in index {
            let entries = stored.remove(&id).unwrap_or_default();
            let raw = RawArtifact::new(kind, StoredEntries::new(&id, codec, entries));
            let seq = self.next_seq;
            self.next_seq += 1;
            self.entries.insert(
                id,
                Entry {
                    seq,
                    index_dirty: false,
                    index_persisted: true,
                    artifact: Box::new(raw),
                },
            );
        }
        info!(artifacts = self.entries.len(), "space loaded");
        Ok(())
    }
}

impl Default for ObjectSpace {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ObjectSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectSpace")
            .field("config", &self.config)
            .field("ids", &self.ids())
            .field("tombstones", &self.tombstones.len())
            .finish()
    }
}
