//! Error types shared by the coin model

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommonError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("expected 32 bytes, got {0}")]
    InvalidLength(usize),

    #[error("failed to encode program: {0}")]
    Encode(String),

    #[error("failed to decode program: {0}")]
    Decode(String),
}
