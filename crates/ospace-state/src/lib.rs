//! State reader/writer boundary for the persisted object space.
//!
//! An object space persists itself as flat `(category, key, value)` triples.
//! This crate defines that boundary and nothing more: the engine in `ospace`
//! decides *what* to write, a [`StateWriter`] decides *how*.
//!
//! # Key Types
//!
//! - [`Edit`] / [`EditKind`] -- a single `AddOrUpdate` or `Delete`
//! - [`StateChangeSet`] -- the ordered edits produced by one save
//! - [`StateWriter`] / [`StateReader`] -- the transport traits
//! - [`InMemoryStateStore`] -- map-backed store implementing both traits
//! - [`KeySpace`] / [`Subcategory`] -- the `state/index`, `state/item/<id>/..` layout
//! - [`ValueCodec`] -- serde-based value encoding
//!
//! # Design Rules
//!
//! 1. Writers apply edits in order and never interpret values.
//! 2. Only live keys are ever written; free-list state is never persisted.
//! 3. All I/O errors are propagated, never silently ignored.

pub mod codec;
pub mod edit;
pub mod error;
pub mod keys;
pub mod memory;
pub mod traits;

pub use codec::ValueCodec;
pub use edit::{Edit, EditKind, StateChangeSet};
pub use error::{StateError, StateResult};
pub use keys::{KeySpace, Subcategory};
pub use memory::InMemoryStateStore;
pub use traits::{StateReader, StateWriter};
