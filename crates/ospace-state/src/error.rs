/// Errors from state reader/writer operations.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// A category or key was empty or otherwise unusable.
    #[error("invalid state key {category}/{key}: {reason}")]
    InvalidKey {
        category: String,
        key: String,
        reason: String,
    },

    /// An `AddOrUpdate` edit arrived without a value.
    #[error("missing value for {category}/{key}")]
    MissingValue { category: String, key: String },

    /// A value could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(String),

    /// The backing store's lock was poisoned by a panicking writer.
    #[error("state store lock poisoned")]
    LockPoisoned,

    /// Storage backend is read-only or otherwise unavailable.
    #[error("state store is read-only")]
    ReadOnly,
}

impl From<serde_json::Error> for StateError {
    fn from(e: serde_json::Error) -> Self {
        Self::Codec(e.to_string())
    }
}

impl From<bincode::Error> for StateError {
    fn from(e: bincode::Error) -> Self {
        Self::Codec(e.to_string())
    }
}

/// Result alias for state operations.
pub type StateResult<T> = Result<T, StateError>;
