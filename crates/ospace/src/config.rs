use ospace_state::{KeySpace, ValueCodec};
use serde::{Deserialize, Serialize};

/// Whether a space tracks changes for persistence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpaceMode {
    /// Mutations are dirty-tracked and saves emit edits.
    #[default]
    Persisted,
    /// Same artifact contract, no backing store: saves emit nothing and
    /// loads do nothing.
    Volatile,
}

/// Configuration for an [`ObjectSpace`](crate::ObjectSpace).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceConfig {
    /// Persisted or volatile.
    pub mode: SpaceMode,
    /// Root of the key namespace (`<prefix>/index`, `<prefix>/item/..`).
    pub key_prefix: String,
    /// Encoding for element values and metadata.
    pub codec: ValueCodec,
}

impl Default for SpaceConfig {
    fn default() -> Self {
        Self {
            mode: SpaceMode::Persisted,
            key_prefix: KeySpace::DEFAULT_PREFIX.to_string(),
            codec: ValueCodec::Json,
        }
    }
}

impl SpaceConfig {
    /// A volatile configuration with default prefix and codec.
    pub fn volatile() -> Self {
        Self {
            mode: SpaceMode::Volatile,
            ..Default::default()
        }
    }

    /// Returns `true` if mutations should be dirty-tracked.
    pub fn is_persisted(&self) -> bool {
        self.mode == SpaceMode::Persisted
    }

    pub(crate) fn key_space(&self) -> KeySpace {
        KeySpace::new(self.key_prefix.as_str())
    }
}
