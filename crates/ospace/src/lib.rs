//! A persisted object space.
//!
//! An [`ObjectSpace`] is a registry of named collection artifacts (values,
//! arrays, lists, stacks, queues, dictionaries, sets, their sorted variants
//! and doubly linked lists) that persists itself as flat key/value edits
//! through the [`ospace_state`] boundary.
//!
//! # Architecture
//!
//! - Every artifact keeps its elements in stable slots. Free slots are
//!   recycled through a LIFO free list ([`SlotArena`]), so a remove followed
//!   by an add rewrites one key instead of shifting the rest.
//! - Every artifact owns a [`DirtyTracker`] recording which keys changed since
//!   the last save and which keys the backing store currently holds. A
//!   differential save writes the live dirty keys and deletes the vacated
//!   ones; a full save writes everything.
//! - Loading is lazy. Stored entries are grouped per id and only decoded when
//!   the first typed `get_*` call names the element types.
//! - A volatile space runs the same artifact code with tracking disabled;
//!   saves produce nothing and loads do nothing.
//!
//! # Modules
//!
//! - [`space`] -- the registry: create, get, delete, save, load
//! - [`collections`] -- the ten artifact kinds
//! - [`artifact`] -- [`Artifact`], [`ArtifactKind`] and the element bounds
//! - [`tracker`] -- [`DirtyTracker`] and entry keys
//! - [`arena`] -- [`SlotArena`]
//! - [`config`] -- [`SpaceConfig`] and [`SpaceMode`]
//! - [`error`] -- [`SpaceError`]

pub mod arena;
pub mod artifact;
pub mod collections;
pub mod config;
pub mod error;
pub mod space;
pub mod tracker;

pub use arena::SlotArena;
pub use artifact::{Artifact, ArtifactKind, Element, HashElement, OrdElement};
pub use collections::{
    DetachedNode, NodeId, PersistedArray, PersistedDictionary, PersistedLinkedList, PersistedList,
    PersistedQueue, PersistedSet, PersistedSortedDictionary, PersistedSortedSet, PersistedStack,
    PersistedValue, SortedSetView,
};
pub use config::{SpaceConfig, SpaceMode};
pub use error::{SpaceError, SpaceResult};
pub use space::ObjectSpace;
pub use tracker::{DirtyTracker, EntryKey, EntryName};

pub use ospace_state::{
    InMemoryStateStore, StateChangeSet, StateReader, StateWriter, ValueCodec,
};
