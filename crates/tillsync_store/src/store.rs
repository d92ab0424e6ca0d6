//! The record store: durable tables, outbox, and config behind one journal.

use crate::backend::StorageBackend;
use crate::config::ConfigMap;
use crate::error::{StoreError, StoreResult};
use crate::journal::{Journal, JournalFrame};
use crate::memory::InMemoryBackend;
use crate::outbox::{Action, Outbox, OutboxEntry};
use crate::record::{now_millis, Record, Table};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Counts and sizes describing the store's current contents.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    /// Journal size in bytes.
    pub journal_bytes: u64,
    /// Live record count per table, keyed by wire name.
    pub records: BTreeMap<String, usize>,
    /// Pending outbox entries.
    pub outbox_pending: usize,
    /// Sync watermark per table (ms since epoch), keyed by wire name.
    pub watermarks: BTreeMap<String, i64>,
}

/// Result of a journal compaction.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CompactionStats {
    /// Journal size before compaction.
    pub bytes_before: u64,
    /// Journal size after compaction.
    pub bytes_after: u64,
}

struct State {
    tables: BTreeMap<Table, BTreeMap<String, Record>>,
    outbox: Outbox,
    config: ConfigMap,
    journal: Journal<Box<dyn StorageBackend>>,
}

impl State {
    fn apply(&mut self, frame: JournalFrame) {
        match frame {
            JournalFrame::Put { table, record } => {
                if let Some(id) = record.id().map(str::to_owned) {
                    self.tables.entry(table).or_default().insert(id, record);
                }
            }
            JournalFrame::Delete { table, id } => {
                self.tables.entry(table).or_default().remove(&id);
            }
            JournalFrame::Enqueue { entry } => self.outbox.restore(entry),
            JournalFrame::Ack { sequence } => {
                self.outbox.acknowledge(sequence);
            }
            JournalFrame::SetConfig { key, value } => self.config.set(key, value),
        }
    }

    /// Frames reconstructing exactly the live state, for compaction.
    fn live_frames(&self) -> Vec<JournalFrame> {
        let mut frames = Vec::new();
        for (table, records) in &self.tables {
            for record in records.values() {
                frames.push(JournalFrame::Put {
                    table: *table,
                    record: record.clone(),
                });
            }
        }
        for entry in self.outbox.pending() {
            frames.push(JournalFrame::Enqueue { entry });
        }
        for (key, value) in self.config.iter() {
            frames.push(JournalFrame::SetConfig {
                key: key.clone(),
                value: value.clone(),
            });
        }
        frames
    }
}

/// The durable record store.
///
/// All mutations are journalled before they become visible. A `put` or
/// `delete` flagged as locally originated appends its outbox mirror in the
/// same physical write, so a reader never observes the record change without
/// the pending mutation (a crash between journalling and the in-memory apply
/// is recovered by replay on the next open).
///
/// The store is `Send + Sync`; one mutex serialises mutations, matching the
/// single-record atomicity the sync engine expects.
pub struct RecordStore {
    state: Mutex<State>,
}

impl RecordStore {
    /// Opens a store over the given backend, replaying any existing journal.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Corrupted`] if a complete journal frame cannot
    /// be decoded, or any backend error.
    pub fn open(backend: impl StorageBackend + 'static) -> StoreResult<Self> {
        let journal = Journal::new(Box::new(backend) as Box<dyn StorageBackend>);
        let mut state = State {
            tables: BTreeMap::new(),
            outbox: Outbox::new(),
            config: ConfigMap::new(),
            journal,
        };

        let frames = state.journal.replay()?;
        let replayed = frames.len();
        for frame in frames {
            state.apply(frame);
        }
        info!(frames = replayed, "record store opened");

        Ok(Self {
            state: Mutex::new(state),
        })
    }

    /// Opens an ephemeral store for tests.
    ///
    /// # Errors
    ///
    /// Never fails in practice; kept fallible for signature symmetry.
    pub fn in_memory() -> StoreResult<Self> {
        Self::open(InMemoryBackend::new())
    }

    /// Writes a record to a table, durably.
    ///
    /// With `mirror_to_outbox` the write is locally originated: the record's
    /// `updatedAt` is stamped now and a matching outbox entry is enqueued.
    /// Without it (sync-applied data) the record is stored byte-for-byte and
    /// the outbox is untouched, so pulled data is never echoed back.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidRecord`] if the record has no string
    /// `id`, or a backend error if the journal write fails.
    pub fn put(&self, table: Table, mut record: Record, mirror_to_outbox: bool) -> StoreResult<()> {
        let id = record
            .id()
            .ok_or_else(|| StoreError::InvalidRecord("record has no string `id` field".into()))?
            .to_owned();

        let mut state = self.state.lock();
        let mut frames = Vec::with_capacity(2);

        if mirror_to_outbox {
            let stamp = now_millis();
            record.set_updated_at(stamp);
            let entry = OutboxEntry {
                sequence: state.outbox.next_sequence(),
                table,
                action: Action::Create,
                payload: serde_json::Value::Object(record.as_map().clone()),
                enqueued_at: stamp,
            };
            frames.push(JournalFrame::Put {
                table,
                record: record.clone(),
            });
            frames.push(JournalFrame::Enqueue { entry });
        } else {
            frames.push(JournalFrame::Put {
                table,
                record: record.clone(),
            });
        }

        state.journal.append_all(&frames)?;
        for frame in frames {
            state.apply(frame);
        }
        debug!(%table, %id, mirror_to_outbox, "put");
        Ok(())
    }

    /// Removes a record from a table, durably.
    ///
    /// With `mirror_to_outbox` a `DELETE` entry carrying `{"id"}` is enqueued
    /// in the same write. Deleting an absent id is not an error; the mirror
    /// is still enqueued so the remote converges.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the journal write fails.
    pub fn delete(&self, table: Table, id: &str, mirror_to_outbox: bool) -> StoreResult<()> {
        let mut state = self.state.lock();
        let mut frames = Vec::with_capacity(2);

        frames.push(JournalFrame::Delete {
            table,
            id: id.to_owned(),
        });
        if mirror_to_outbox {
            let entry = OutboxEntry {
                sequence: state.outbox.next_sequence(),
                table,
                action: Action::Delete,
                payload: serde_json::json!({ "id": id }),
                enqueued_at: now_millis(),
            };
            frames.push(JournalFrame::Enqueue { entry });
        }

        state.journal.append_all(&frames)?;
        for frame in frames {
            state.apply(frame);
        }
        debug!(%table, id, mirror_to_outbox, "delete");
        Ok(())
    }

    /// Returns every record in a table, ordered by id.
    pub fn get_all(&self, table: Table) -> Vec<Record> {
        let state = self.state.lock();
        state
            .tables
            .get(&table)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns one record by id.
    pub fn get_by_id(&self, table: Table, id: &str) -> Option<Record> {
        let state = self.state.lock();
        state.tables.get(&table).and_then(|r| r.get(id)).cloned()
    }

    /// Stores a config value durably. Never mirrors to the outbox.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the journal write fails.
    pub fn set_config(&self, key: &str, value: serde_json::Value) -> StoreResult<()> {
        let mut state = self.state.lock();
        let frame = JournalFrame::SetConfig {
            key: key.to_owned(),
            value,
        };
        state.journal.append(&frame)?;
        state.apply(frame);
        Ok(())
    }

    /// Returns a config value.
    pub fn get_config(&self, key: &str) -> Option<serde_json::Value> {
        self.state.lock().config.get(key).cloned()
    }

    /// Returns the configured remote endpoint, if usable.
    pub fn endpoint(&self) -> Option<String> {
        self.state.lock().config.endpoint().map(str::to_owned)
    }

    /// Returns a table's sync watermark (ms), defaulting to 0.
    pub fn watermark(&self, table: Table) -> i64 {
        self.state.lock().config.watermark(table)
    }

    /// Advances a table's watermark, durably. Stale values are ignored.
    ///
    /// Returns the watermark now in effect.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the journal write fails.
    pub fn advance_watermark(&self, table: Table, millis: i64) -> StoreResult<i64> {
        let mut state = self.state.lock();
        let effective = state.config.watermark(table).max(millis);
        let frame = JournalFrame::SetConfig {
            key: crate::config::watermark_key(table),
            value: serde_json::Value::from(effective),
        };
        state.journal.append(&frame)?;
        state.apply(frame);
        Ok(effective)
    }

    /// Returns all pending outbox entries in enqueue order, non-destructively.
    pub fn outbox_pending(&self) -> Vec<OutboxEntry> {
        self.state.lock().outbox.pending()
    }

    /// Removes one acknowledged outbox entry, durably.
    ///
    /// Returns true if an entry with that sequence existed.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the journal write fails.
    pub fn acknowledge(&self, sequence: u64) -> StoreResult<bool> {
        let mut state = self.state.lock();
        if !state.outbox.pending().iter().any(|e| e.sequence == sequence) {
            return Ok(false);
        }
        let frame = JournalFrame::Ack { sequence };
        state.journal.append(&frame)?;
        state.apply(frame);
        Ok(true)
    }

    /// Returns the number of pending outbox entries.
    pub fn outbox_len(&self) -> usize {
        self.state.lock().outbox.len()
    }

    /// Returns every configuration entry, sorted by key.
    pub fn config_entries(&self) -> Vec<(String, serde_json::Value)> {
        let state = self.state.lock();
        state
            .config
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Rewrites the journal from live state, discarding superseded frames.
    ///
    /// Unacknowledged outbox entries are always preserved.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the rewrite fails.
    pub fn compact(&self) -> StoreResult<CompactionStats> {
        let mut state = self.state.lock();
        let bytes_before = state.journal.size()?;
        let frames = state.live_frames();
        state.journal.rewrite(&frames)?;
        let bytes_after = state.journal.size()?;
        info!(bytes_before, bytes_after, "journal compacted");
        Ok(CompactionStats {
            bytes_before,
            bytes_after,
        })
    }

    /// Returns counts and sizes describing the store.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the journal size cannot be read.
    pub fn stats(&self) -> StoreResult<StoreStats> {
        let state = self.state.lock();
        let mut records = BTreeMap::new();
        let mut watermarks = BTreeMap::new();
        for table in Table::ALL {
            let count = state.tables.get(&table).map(BTreeMap::len).unwrap_or(0);
            records.insert(table.name().to_owned(), count);
            watermarks.insert(table.name().to_owned(), state.config.watermark(table));
        }
        Ok(StoreStats {
            journal_bytes: state.journal.size()?,
            records,
            outbox_pending: state.outbox.len(),
            watermarks,
        })
    }
}
