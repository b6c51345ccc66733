//! Error types for object space and artifact operations.

use ospace_state::StateError;
use thiserror::Error;

/// Errors that can occur while creating, mutating, saving or loading
/// artifacts.
///
/// Every variant is a distinct kind: duplicate creation and missing lookup
/// are never conflated.
#[derive(Debug, Error)]
pub enum SpaceError {
    /// An identifier, node handle or argument is unusable.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An artifact with this id already exists (of any kind).
    #[error("artifact already exists: {id}")]
    AlreadyExists { id: String },

    /// No artifact with this id exists, or it has a different kind or
    /// element type than requested.
    #[error("artifact not found: {id}")]
    NotFound { id: String },

    /// A dictionary already contains the key being added.
    #[error("duplicate key in {id}")]
    DuplicateKey { id: String },

    /// A dictionary lookup of a key that is not present.
    #[error("key not found in {id}")]
    KeyNotFound { id: String },

    /// Dequeue, pop or peek on an empty collection.
    #[error("collection {id} is empty")]
    EmptyCollection { id: String },

    /// An index or value outside the valid bounds.
    #[error("{what} out of range in {id}: {detail}")]
    OutOfRange {
        id: String,
        what: &'static str,
        detail: String,
    },

    /// A value could not be encoded or decoded.
    #[error("codec error in {id}: {source}")]
    Codec {
        id: String,
        #[source]
        source: StateError,
    },

    /// The state reader or writer failed.
    #[error("state error: {0}")]
    State(#[from] StateError),
}

impl SpaceError {
    pub(crate) fn not_found(id: &str) -> Self {
        Self::NotFound { id: id.to_string() }
    }

    pub(crate) fn out_of_range(id: &str, what: &'static str, detail: impl Into<String>) -> Self {
        Self::OutOfRange {
            id: id.to_string(),
            what,
            detail: detail.into(),
        }
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument(reason.into())
    }

    pub(crate) fn duplicate_key(id: &str) -> Self {
        Self::DuplicateKey { id: id.to_string() }
    }

    pub(crate) fn key_not_found(id: &str) -> Self {
        Self::KeyNotFound { id: id.to_string() }
    }

    pub(crate) fn empty(id: &str) -> Self {
        Self::EmptyCollection { id: id.to_string() }
    }

    pub(crate) fn codec(id: &str, source: StateError) -> Self {
        Self::Codec {
            id: id.to_string(),
            source,
        }
    }
}

/// Convenience alias for object space results.
pub type SpaceResult<T> = std::result::Result<T, SpaceError>;
