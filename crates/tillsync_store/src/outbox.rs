//! The outbox: a FIFO queue of not-yet-acknowledged local mutations.

use crate::record::Table;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// What a pending mutation does on the remote side.
///
/// There is no `UPDATE`: local updates are folded into `Create`, which the
/// remote applies as an idempotent upsert on `id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Create-or-update by id.
    #[serde(rename = "CREATE")]
    Create,
    /// Remove by id.
    #[serde(rename = "DELETE")]
    Delete,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Create => "CREATE",
            Action::Delete => "DELETE",
        })
    }
}

/// A pending mutation awaiting transmission to the remote store.
///
/// For `Create` the payload is the full record; for `Delete` it is `{"id"}`.
/// Field names are camelCase because entries travel on the wire verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboxEntry {
    /// Store-assigned, strictly increasing sequence number.
    pub sequence: u64,
    /// The table the mutation belongs to.
    pub table: Table,
    /// Create (upsert) or delete.
    pub action: Action,
    /// Full record for creates, `{"id"}` for deletes.
    pub payload: serde_json::Value,
    /// When the entry was enqueued (ms since epoch).
    pub enqueued_at: i64,
}

/// In-memory view of the outbox queue.
///
/// # Invariants
///
/// - Entries are FIFO within a table and globally
/// - Sequences are assigned on enqueue and never reused
/// - An entry is removed only by an explicit acknowledgement
pub struct Outbox {
    entries: VecDeque<OutboxEntry>,
    next_sequence: u64,
}

impl Outbox {
    /// Creates an empty outbox.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
            next_sequence: 1,
        }
    }

    /// Builds an entry with the next sequence number and appends it.
    ///
    /// Returns the assigned sequence.
    pub fn enqueue(
        &mut self,
        table: Table,
        action: Action,
        payload: serde_json::Value,
        enqueued_at: i64,
    ) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.entries.push_back(OutboxEntry {
            sequence,
            table,
            action,
            payload,
            enqueued_at,
        });
        sequence
    }

    /// Re-inserts a replayed entry, keeping the sequence counter ahead of it.
    ///
    /// Used during journal replay; entries are assumed to arrive in enqueue
    /// order.
    pub fn restore(&mut self, entry: OutboxEntry) {
        self.next_sequence = self.next_sequence.max(entry.sequence + 1);
        self.entries.push_back(entry);
    }

    /// Returns all pending entries in enqueue order, non-destructively.
    #[must_use]
    pub fn pending(&self) -> Vec<OutboxEntry> {
        self.entries.iter().cloned().collect()
    }

    /// Removes the entry with the given sequence.
    ///
    /// Returns true if an entry was removed.
    pub fn acknowledge(&mut self, sequence: u64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.sequence != sequence);
        self.entries.len() != before
    }

    /// Returns the number of pending entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the next sequence that will be assigned.
    #[must_use]
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }
}

impl Default for Outbox {
    fn default() -> Self {
        Self::new()
    }
}
