//! CLI command implementations.

pub mod compact;
pub mod config;
pub mod inspect;
pub mod outbox;

use std::path::Path;
use tillsync_store::{FileBackend, RecordStore};

/// Opens the store at `path`, replaying its journal.
pub fn open_store(path: &Path) -> Result<RecordStore, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("No store found at {path:?}").into());
    }
    let store = RecordStore::open(FileBackend::open(path)?)?;
    tracing::debug!(?path, "store opened");
    Ok(store)
}
