//! Append-only journal of store mutations.
//!
//! Every committed mutation is one CBOR-encoded frame, length-prefixed with a
//! little-endian `u32`. On open the journal is replayed front to back to
//! rebuild the in-memory state. A truncated trailing frame (torn write on
//! abrupt termination) ends the replay with a warning; a full frame that
//! fails to decode is corruption and surfaces as an error.

use crate::backend::StorageBackend;
use crate::error::{StoreError, StoreResult};
use crate::outbox::OutboxEntry;
use crate::record::{Record, Table};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Length of the frame size prefix in bytes.
const LEN_PREFIX: usize = 4;

/// One journalled mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JournalFrame {
    /// A record was written to a table.
    Put {
        /// Target table.
        table: Table,
        /// Full record.
        record: Record,
    },
    /// A record was removed from a table.
    Delete {
        /// Target table.
        table: Table,
        /// Identifier of the removed record.
        id: String,
    },
    /// An outbox entry was enqueued.
    Enqueue {
        /// The enqueued entry, sequence already assigned.
        entry: OutboxEntry,
    },
    /// An outbox entry was acknowledged and removed.
    Ack {
        /// Sequence of the removed entry.
        sequence: u64,
    },
    /// A config key was set.
    SetConfig {
        /// Setting name.
        key: String,
        /// Setting value.
        value: serde_json::Value,
    },
}

/// The journal: frames over an opaque byte backend.
pub struct Journal<B: StorageBackend> {
    backend: B,
}

impl<B: StorageBackend> Journal<B> {
    /// Wraps a backend without reading it; call [`Journal::replay`] next.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Returns the journal size in bytes.
    pub fn size(&self) -> StoreResult<u64> {
        self.backend.size()
    }

    /// Appends a single frame and flushes.
    pub fn append(&mut self, frame: &JournalFrame) -> StoreResult<()> {
        self.append_all(std::slice::from_ref(frame))
    }

    /// Appends several frames as one write, then flushes once.
    ///
    /// Used for a mutation and its outbox mirror so both land in the same
    /// physical write under normal operation.
    pub fn append_all(&mut self, frames: &[JournalFrame]) -> StoreResult<()> {
        let mut buffer = Vec::new();
        for frame in frames {
            encode_frame(frame, &mut buffer)?;
        }
        self.backend.append(&buffer)?;
        self.backend.flush()?;
        Ok(())
    }

    /// Reads every decodable frame from the start of the journal.
    ///
    /// Stops early, with a warning, at a torn trailing frame.
    pub fn replay(&self) -> StoreResult<Vec<JournalFrame>> {
        let size = self.backend.size()?;
        let mut frames = Vec::new();
        let mut offset = 0u64;

        while offset < size {
            if offset + LEN_PREFIX as u64 > size {
                warn!(offset, size, "journal ends inside a length prefix, dropping tail");
                break;
            }
            let prefix = self.backend.read_at(offset, LEN_PREFIX)?;
            let len = u32::from_le_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as u64;

            let body_offset = offset + LEN_PREFIX as u64;
            if body_offset + len > size {
                warn!(offset, len, size, "journal ends inside a frame body, dropping tail");
                break;
            }

            let body = self.backend.read_at(body_offset, len as usize)?;
            let frame: JournalFrame = ciborium::de::from_reader(body.as_slice())
                .map_err(|e| StoreError::Corrupted(format!("frame at offset {offset}: {e}")))?;
            frames.push(frame);
            offset = body_offset + len;
        }

        Ok(frames)
    }

    /// Replaces the journal contents with the given frames.
    ///
    /// Used by compaction: the caller passes frames reconstructing the live
    /// state, and everything superseded is discarded.
    pub fn rewrite(&mut self, frames: &[JournalFrame]) -> StoreResult<()> {
        let mut buffer = Vec::new();
        for frame in frames {
            encode_frame(frame, &mut buffer)?;
        }
        self.backend.truncate(0)?;
        if !buffer.is_empty() {
            self.backend.append(&buffer)?;
        }
        self.backend.flush()?;
        Ok(())
    }
}

fn encode_frame(frame: &JournalFrame, out: &mut Vec<u8>) -> StoreResult<()> {
    let mut body = Vec::new();
    ciborium::ser::into_writer(frame, &mut body)
        .map_err(|e| StoreError::Encode(e.to_string()))?;
    let len = u32::try_from(body.len())
        .map_err(|_| StoreError::Encode("frame larger than 4 GiB".into()))?;
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(&body);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryBackend;
    use crate::outbox::Action;
    use serde_json::json;

    fn sample_frames() -> Vec<JournalFrame> {
        vec![
            JournalFrame::Put {
                table: Table::Products,
                record: Record::new("p-1").with_field("price", json!(4.5)),
            },
            JournalFrame::Enqueue {
                entry: OutboxEntry {
                    sequence: 1,
                    table: Table::Products,
                    action: Action::Create,
                    payload: json!({"id": "p-1", "price": 4.5}),
                    enqueued_at: 1000,
                },
            },
            JournalFrame::SetConfig {
                key: "api_url".into(),
                value: json!("https://sync.example.com"),
            },
            JournalFrame::Ack { sequence: 1 },
            JournalFrame::Delete {
                table: Table::Products,
                id: "p-1".into(),
            },
        ]
    }

    #[test]
    fn append_then_replay_roundtrips() {
        let mut journal = Journal::new(InMemoryBackend::new());
        let frames = sample_frames();
        for frame in &frames {
            journal.append(frame).unwrap();
        }
        assert_eq!(journal.replay().unwrap(), frames);
    }

    #[test]
    fn append_all_is_one_write() {
        let mut journal = Journal::new(InMemoryBackend::new());
        let frames = sample_frames();
        journal.append_all(&frames).unwrap();
        assert_eq!(journal.replay().unwrap(), frames);
    }

    #[test]
    fn torn_tail_is_dropped_not_fatal() {
        let mut journal = Journal::new(InMemoryBackend::new());
        let frames = sample_frames();
        journal.append_all(&frames).unwrap();

        // Chop bytes off the last frame to simulate a crash mid-write.
        let mut bytes = journal.backend.data();
        bytes.truncate(bytes.len() - 3);

        let torn = Journal::new(InMemoryBackend::with_data(bytes));
        let replayed = torn.replay().unwrap();
        assert_eq!(replayed, frames[..frames.len() - 1]);
    }

    #[test]
    fn garbage_frame_is_corruption() {
        let mut backend = InMemoryBackend::new();
        // Valid length prefix, garbage body.
        backend.append(&4u32.to_le_bytes()).unwrap();
        backend.append(&[0xFF, 0xFF, 0xFF, 0xFF]).unwrap();

        let journal = Journal::new(backend);
        assert!(matches!(journal.replay(), Err(StoreError::Corrupted(_))));
    }

    #[test]
    fn rewrite_replaces_contents() {
        let mut journal = Journal::new(InMemoryBackend::new());
        journal.append_all(&sample_frames()).unwrap();
        let size_before = journal.size().unwrap();

        let compacted = vec![JournalFrame::SetConfig {
            key: "api_url".into(),
            value: json!("https://sync.example.com"),
        }];
        journal.rewrite(&compacted).unwrap();

        assert!(journal.size().unwrap() < size_before);
        assert_eq!(journal.replay().unwrap(), compacted);
    }

    proptest::proptest! {
        #[test]
        fn replay_equals_what_was_appended(seqs in proptest::collection::vec(1u64..1000, 1..30)) {
            let mut journal = Journal::new(InMemoryBackend::new());
            let frames: Vec<JournalFrame> =
                seqs.into_iter().map(|sequence| JournalFrame::Ack { sequence }).collect();
            for frame in &frames {
                journal.append(frame).unwrap();
            }
            proptest::prop_assert_eq!(journal.replay().unwrap(), frames);
        }
    }
}
