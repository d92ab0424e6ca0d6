//! Error types for store operations.

use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in the durable store.
///
/// Callers should treat every variant except [`StoreError::Corrupted`] as
/// retryable: the mutation was not committed and may be attempted again.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Attempted to read beyond the end of the backend.
    #[error("read beyond end of storage: offset {offset}, len {len}, size {size}")]
    ReadPastEnd {
        /// The requested read offset.
        offset: u64,
        /// The requested read length.
        len: usize,
        /// The current backend size.
        size: u64,
    },

    /// The journal contains data that cannot be decoded.
    #[error("journal corrupted: {0}")]
    Corrupted(String),

    /// Another process holds the journal lock.
    #[error("journal locked: another process has exclusive access")]
    Locked,

    /// A record was rejected before being written.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// A codec error occurred while encoding a journal frame.
    #[error("encode error: {0}")]
    Encode(String),
}

impl StoreError {
    /// Returns true if the failed operation may be retried.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, StoreError::Corrupted(_) | StoreError::InvalidRecord(_))
    }
}
