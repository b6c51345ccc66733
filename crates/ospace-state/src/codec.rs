use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::StateResult;

/// Serialization format for persisted values.
///
/// Element values, structural metadata and index kind tags all pass through
/// the same codec. The writer never interprets the bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueCodec {
    /// `serde_json`; human-readable, the default.
    #[default]
    Json,
    /// `bincode`; compact.
    Bincode,
}

impl ValueCodec {
    /// Encode a value.
    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> StateResult<Vec<u8>> {
        match self {
            Self::Json => Ok(serde_json::to_vec(value)?),
            Self::Bincode => Ok(bincode::serialize(value)?),
        }
    }

    /// Decode a value previously produced by [`encode`](Self::encode).
    pub fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> StateResult<T> {
        match self {
            Self::Json => Ok(serde_json::from_slice(bytes)?),
            Self::Bincode => Ok(bincode::deserialize(bytes)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StateError;

    #[test]
    fn json_is_readable() {
        let bytes = ValueCodec::Json.encode(&(3, "x")).unwrap();
        assert_eq!(bytes, br#"[3,"x"]"#.to_vec());
    }

    #[test]
    fn bincode_decodes_what_it_encodes() {
        let codec = ValueCodec::Bincode;
        let bytes = codec.encode(&Some(42u64)).unwrap();
        let back: Option<u64> = codec.decode(&bytes).unwrap();
        assert_eq!(back, Some(42));
    }

    #[test]
    fn decode_type_mismatch_is_codec_error() {
        let bytes = ValueCodec::Json.encode("not a number").unwrap();
        let err = ValueCodec::Json.decode::<u32>(&bytes).unwrap_err();
        assert!(matches!(err, StateError::Codec(_)));
    }
}
