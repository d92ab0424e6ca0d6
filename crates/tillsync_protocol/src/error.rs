//! Error types for the wire contract.

use thiserror::Error;

/// Result type for protocol encoding and decoding.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised while encoding or decoding wire messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The payload was not valid JSON, or did not match the message shape.
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The `action` discriminator named an unknown operation.
    #[error("unknown action: {0}")]
    UnknownAction(String),
}
