//! Storage backend trait definition.

use crate::error::StoreResult;

/// A low-level byte store underneath the journal.
///
/// Backends are **opaque byte stores**. The store owns all format
/// interpretation - backends do not understand journal frames, records, or
/// outbox entries.
///
/// # Invariants
///
/// - `append` returns the offset where data was written
/// - `read_at` returns exactly the bytes previously written at that offset
/// - `flush` ensures all appended data is durable
/// - Backends must be `Send + Sync` for concurrent access
pub trait StorageBackend: Send + Sync {
    /// Reads `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if the read would extend beyond the current size or
    /// an I/O error occurs.
    fn read_at(&self, offset: u64, len: usize) -> StoreResult<Vec<u8>>;

    /// Appends data to the end of the storage.
    ///
    /// Returns the offset where the data was written.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn append(&mut self, data: &[u8]) -> StoreResult<u64>;

    /// Flushes all pending writes to durable storage.
    ///
    /// After this returns successfully, all previously appended data is
    /// guaranteed to survive process termination.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush operation fails.
    fn flush(&mut self) -> StoreResult<()>;

    /// Returns the current size of the storage in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StoreResult<u64>;

    /// Truncates the storage to the given size.
    ///
    /// Used by journal compaction to discard superseded frames.
    ///
    /// # Errors
    ///
    /// Returns an error if `new_size` is greater than the current size or the
    /// truncation fails.
    fn truncate(&mut self, new_size: u64) -> StoreResult<()>;
}

impl<T: StorageBackend + ?Sized> StorageBackend for Box<T> {
    fn read_at(&self, offset: u64, len: usize) -> StoreResult<Vec<u8>> {
        (**self).read_at(offset, len)
    }

    fn append(&mut self, data: &[u8]) -> StoreResult<u64> {
        (**self).append(data)
    }

    fn flush(&mut self) -> StoreResult<()> {
        (**self).flush()
    }

    fn size(&self) -> StoreResult<u64> {
        (**self).size()
    }

    fn truncate(&mut self, new_size: u64) -> StoreResult<()> {
        (**self).truncate(new_size)
    }
}
