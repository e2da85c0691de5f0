//! # Wire Codec
//!
//! JSON encoding for everything that crosses the transport: request
//! payloads, reply envelopes, and nothing else. Round-trip fidelity is the
//! contract; the envelope's optional error fields only exist when set.

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Failure moving a value across the wire format.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The value could not be serialized.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// The bytes did not parse as the expected type.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Encode a wire value as JSON bytes.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(value).map_err(CodecError::Encode)
}

/// Decode JSON bytes into a wire value.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    serde_json::from_slice(bytes).map_err(CodecError::Decode)
}
