//! Artifact kinds and the capability traits every artifact implements.
//!
//! - [`Artifact`] -- public identity: id, kind, pending changes
//! - `Persistable` -- crate-internal: entry enumeration, tracker access and
//!   downcasting for the space registry
//! - `Restore` -- crate-internal: typed reconstruction from stored entries

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::Hash;

use ospace_state::{StateError, Subcategory, ValueCodec};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{SpaceError, SpaceResult};
use crate::tracker::{DirtyTracker, EntryKey, EntrySource};

/// The ten artifact kinds. The kind tag is the value stored in the space
/// index for each id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtifactKind {
    Array,
    Dictionary,
    LinkedList,
    List,
    Queue,
    Set,
    SortedDictionary,
    SortedSet,
    Stack,
    Value,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 10] = [
        Self::Array,
        Self::Dictionary,
        Self::LinkedList,
        Self::List,
        Self::Queue,
        Self::Set,
        Self::SortedDictionary,
        Self::SortedSet,
        Self::Stack,
        Self::Value,
    ];
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Values that can live in an artifact and be persisted.
pub trait Element: Clone + Serialize + DeserializeOwned + 'static {}

impl<T> Element for T where T: Clone + Serialize + DeserializeOwned + 'static {}

/// Elements usable as hash keys (dictionary keys, set members).
pub trait HashElement: Element + Hash + Eq {}

impl<T> HashElement for T where T: Element + Hash + Eq {}

/// Elements usable as ordered keys (sorted dictionary keys, sorted set
/// members).
pub trait OrdElement: Element + Ord {}

impl<T> OrdElement for T where T: Element + Ord {}

/// Identity shared by every artifact.
pub trait Artifact {
    /// The id the artifact is registered under.
    fn id(&self) -> &str;

    /// Which of the ten kinds this is.
    fn kind(&self) -> ArtifactKind;

    /// Artifacts created through a space are always mutable.
    fn is_read_only(&self) -> bool {
        false
    }

    /// Returns `true` if a differential save would emit edits for this
    /// artifact's entries.
    fn has_pending_changes(&self) -> bool;
}

/// State every artifact carries besides its contents.
#[derive(Clone, Debug)]
pub(crate) struct ArtifactCore {
    pub id: String,
    pub tracker: DirtyTracker,
}

impl ArtifactCore {
    pub fn new(id: &str, tracking: bool) -> Self {
        Self {
            id: id.to_string(),
            tracker: DirtyTracker::new(tracking),
        }
    }

    /// Encode a value on behalf of this artifact.
    pub fn encode<T: Serialize + ?Sized>(
        &self,
        codec: ValueCodec,
        value: &T,
    ) -> SpaceResult<Option<Vec<u8>>> {
        codec
            .encode(value)
            .map(Some)
            .map_err(|e| SpaceError::codec(&self.id, e))
    }
}

/// Registry-facing view of an artifact.
pub(crate) trait Persistable: Artifact + EntrySource + Any {
    fn core(&self) -> &ArtifactCore;
    fn core_mut(&mut self) -> &mut ArtifactCore;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Typed reconstruction of an artifact from its stored entries.
pub(crate) trait Restore: Persistable + Sized {
    const KIND: ArtifactKind;

    fn restore(core: ArtifactCore, stored: &StoredEntries) -> SpaceResult<Self>;
}

/// Implements [`Artifact`] and `Persistable` for a struct with a
/// `core: ArtifactCore` field and a `Restore` impl.
macro_rules! impl_artifact {
    ($ty:ident < $($gen:ident : $bound:path),+ >) => {
        impl<$($gen: $bound),+> $crate::artifact::Artifact for $ty<$($gen),+> {
            fn id(&self) -> &str {
                &self.core.id
            }

            fn kind(&self) -> $crate::artifact::ArtifactKind {
                <Self as $crate::artifact::Restore>::KIND
            }

            fn has_pending_changes(&self) -> bool {
                self.core.tracker.is_dirty()
            }
        }

        impl<$($gen: $bound),+> $crate::artifact::Persistable for $ty<$($gen),+> {
            fn core(&self) -> &$crate::artifact::ArtifactCore {
                &self.core
            }

            fn core_mut(&mut self) -> &mut $crate::artifact::ArtifactCore {
                &mut self.core
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }
        }
    };
}

pub(crate) use impl_artifact;

/// Raw entries of one artifact as read from a state reader.
#[derive(Clone, Debug)]
pub(crate) struct StoredEntries {
    id: String,
    codec: ValueCodec,
    entries: BTreeMap<EntryKey, Vec<u8>>,
}

impl StoredEntries {
    pub fn new(id: &str, codec: ValueCodec, entries: BTreeMap<EntryKey, Vec<u8>>) -> Self {
        Self {
            id: id.to_string(),
            codec,
            entries,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &EntryKey> + '_ {
        self.entries.keys()
    }

    pub fn raw(&self, key: &EntryKey) -> Option<&Vec<u8>> {
        self.entries.get(key)
    }

    /// Decode one entry, if present.
    pub fn decode<T: DeserializeOwned>(&self, key: &EntryKey) -> SpaceResult<Option<T>> {
        self.entries
            .get(key)
            .map(|bytes| self.codec.decode(bytes))
            .transpose()
            .map_err(|e| SpaceError::codec(&self.id, e))
    }

    /// Decode a named metadata entry that must be present.
    pub fn require_metadata<T: DeserializeOwned>(&self, name: &str) -> SpaceResult<T> {
        self.decode(&EntryKey::metadata(name))?
            .ok_or_else(|| self.corrupt(format!("missing metadata entry {name:?}")))
    }

    /// Decode every slot-keyed entry of a subcategory, in ascending slot
    /// order.
    pub fn slots<T: DeserializeOwned>(&self, sub: Subcategory) -> SpaceResult<Vec<(usize, T)>> {
        let mut out = Vec::new();
        for (key, bytes) in &self.entries {
            if key.sub != sub {
                continue;
            }
            let Some(slot) = key.name.slot() else {
                continue;
            };
            let slot = usize::try_from(slot)
                .map_err(|_| self.corrupt(format!("slot {slot} does not fit in memory")))?;
            let value = self
                .codec
                .decode(bytes)
                .map_err(|e| SpaceError::codec(&self.id, e))?;
            out.push((slot, value));
        }
        Ok(out)
    }

    /// Decode slots that must form the contiguous range `0..n`.
    pub fn dense<T: DeserializeOwned>(&self, sub: Subcategory) -> SpaceResult<Vec<T>> {
        let slots = self.slots(sub)?;
        let mut out = Vec::with_capacity(slots.len());
        for (expected, (slot, value)) in slots.into_iter().enumerate() {
            if slot != expected {
                return Err(self.corrupt(format!("gap in {sub} before slot {slot}")));
            }
            out.push(value);
        }
        Ok(out)
    }

    /// An error for stored entries that do not form a valid artifact.
    pub fn corrupt(&self, reason: String) -> SpaceError {
        SpaceError::codec(&self.id, StateError::Codec(reason))
    }
}

/// An artifact read from the backing store whose element type is not yet
/// known. It is decoded on the first typed `get_*` call.
///
/// Until then it keeps its entries as raw bytes: full saves re-emit them
/// verbatim and deletes remove them.
pub(crate) struct RawArtifact {
    pub core: ArtifactCore,
    pub kind: ArtifactKind,
    pub stored: StoredEntries,
}

impl RawArtifact {
    pub fn new(kind: ArtifactKind, stored: StoredEntries) -> Self {
        let persisted = stored.keys().cloned().collect();
        Self {
            core: ArtifactCore {
                id: stored.id.clone(),
                tracker: DirtyTracker::loaded(persisted),
            },
            kind,
            stored,
        }
    }
}

impl Artifact for RawArtifact {
    fn id(&self) -> &str {
        &self.core.id
    }

    fn kind(&self) -> ArtifactKind {
        self.kind
    }

    fn has_pending_changes(&self) -> bool {
        false
    }
}

impl EntrySource for RawArtifact {
    fn live_keys(&self) -> Vec<EntryKey> {
        self.stored.keys().cloned().collect()
    }

    fn encode_entry(&self, key: &EntryKey, _codec: ValueCodec) -> SpaceResult<Option<Vec<u8>>> {
        Ok(self.stored.raw(key).cloned())
    }
}

impl Persistable for RawArtifact {
    fn core(&self) -> &ArtifactCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ArtifactCore {
        &mut self.core
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
