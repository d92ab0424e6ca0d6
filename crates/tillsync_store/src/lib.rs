//! # TillSync Store
//!
//! Durable record store, outbox, and config layer for TillSync.
//!
//! This crate is the only place local mutations are physically applied:
//! - Per-table record storage with id lookups
//! - An append-only outbox mirroring every locally-originated write/delete
//! - A config table holding the remote endpoint and per-table sync watermarks
//!
//! Everything is journalled to an opaque [`StorageBackend`] and replayed on
//! open. The sync engine consumes this crate; it never bypasses it.
//!
//! ## Example
//!
//! ```rust
//! use tillsync_store::{Record, RecordStore, Table};
//!
//! let store = RecordStore::in_memory().unwrap();
//! let record = Record::new("p-1").with_field("name", serde_json::json!("Notebook"));
//! store.put(Table::Products, record, true).unwrap();
//!
//! assert_eq!(store.get_all(Table::Products).len(), 1);
//! assert_eq!(store.outbox_len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod config;
mod error;
mod file;
mod journal;
mod memory;
mod outbox;
mod record;
mod store;

pub use backend::StorageBackend;
pub use config::{watermark_key, ENDPOINT_KEY};
pub use error::{StoreError, StoreResult};
pub use file::FileBackend;
pub use journal::JournalFrame;
pub use memory::InMemoryBackend;
pub use outbox::{Action, OutboxEntry};
pub use record::{now_millis, Record, Table, ID_FIELD, UPDATED_AT_FIELD};
pub use store::{CompactionStats, RecordStore, StoreStats};
