//! Serialized puzzle reveals and solutions

use serde::{de, de::DeserializeOwned, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::bytes::{sha256, Bytes32};
use crate::error::CommonError;

/// Opaque serialized value carried by a spend: a puzzle reveal or a solution.
///
/// Whoever runs the spend decodes it into the typed value it expects.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Program(Vec<u8>);

impl Program {
    /// Encode a typed value
    pub fn from_value<T: Serialize>(value: &T) -> Result<Self, CommonError> {
        bincode::serialize(value)
            .map(Self)
            .map_err(|e| CommonError::Encode(e.to_string()))
    }

    /// Decode into a typed value; trailing bytes are rejected
    pub fn to_value<T: DeserializeOwned>(&self) -> Result<T, CommonError> {
        use bincode::Options;

        bincode::DefaultOptions::new()
            .with_fixint_encoding()
            .reject_trailing_bytes()
            .deserialize(&self.0)
            .map_err(|e| CommonError::Decode(e.to_string()))
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Hash of the serialized bytes
    pub fn hash(&self) -> Bytes32 {
        sha256(&[&self.0])
    }
}

impl fmt::Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Program({} bytes)", self.0.len())
    }
}

impl Serialize for Program {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&hex::encode(&self.0))
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Program {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            hex::decode(s).map(Self).map_err(de::Error::custom)
        } else {
            <Vec<u8>>::deserialize(deserializer).map(Self)
        }
    }
}
