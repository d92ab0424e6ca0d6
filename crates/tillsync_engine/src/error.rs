//! Error types for the sync engine.

use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur inside a sync run.
///
/// None of these escape [`crate::SyncEngine::run`]: every failure path
/// resolves to a status transition, and callers observe the post-run status.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The remote was unreachable or answered outside the contract.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether a later run may succeed.
        retryable: bool,
    },

    /// The local durable store failed.
    #[error("store error: {0}")]
    Store(#[from] tillsync_store::StoreError),

    /// A wire message could not be encoded or decoded.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// No usable remote endpoint is configured.
    #[error("no remote endpoint configured")]
    Unconfigured,
}

impl SyncError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Returns true if a later run may succeed without intervention.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Transport { retryable, .. } => *retryable,
            SyncError::Store(e) => e.is_retryable(),
            SyncError::Protocol(_) => false,
            SyncError::Unconfigured => false,
        }
    }
}

impl From<tillsync_protocol::ProtocolError> for SyncError {
    fn from(e: tillsync_protocol::ProtocolError) -> Self {
        SyncError::Protocol(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(SyncError::transport_retryable("connection reset").is_retryable());
        assert!(!SyncError::transport_fatal("bad certificate").is_retryable());
        assert!(!SyncError::Unconfigured.is_retryable());
        assert!(!SyncError::Protocol("truncated body".into()).is_retryable());
        assert!(
            SyncError::Store(tillsync_store::StoreError::Locked).is_retryable()
        );
        assert!(
            !SyncError::Store(tillsync_store::StoreError::Corrupted("frame".into()))
                .is_retryable()
        );
    }
}
