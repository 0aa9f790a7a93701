//! Error types for the wire contract.
//!
//! Strongly-typed errors for envelope encoding and decoding. We avoid
//! surfacing raw `serde_json::Error` so callers match on the failure kind
//! rather than string-parsing serde output.

use thiserror::Error;

/// Errors that can occur while encoding or decoding the wire envelope.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Failed to encode a payload to JSON.
    #[error("failed to encode {what}: {reason}")]
    Encode {
        /// Payload type that failed to encode.
        what: &'static str,
        /// Underlying serializer message.
        reason: String,
    },

    /// Failed to decode a payload from JSON.
    ///
    /// Covers malformed JSON, unknown event names, and payloads whose shape
    /// does not match the event name tag.
    #[error("failed to decode {what}: {reason}")]
    Decode {
        /// Payload type that failed to decode.
        what: &'static str,
        /// Underlying deserializer message.
        reason: String,
    },
}
