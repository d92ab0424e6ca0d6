//! Wire messages for the two gateway RPCs.

use crate::error::{ProtocolError, ProtocolResult};
use serde::{Deserialize, Serialize};
use tillsync_store::{OutboxEntry, Record, Table};

/// Action discriminator for the push RPC.
pub const PUSH_ACTION: &str = "SYNC_OUTBOX";

/// Action discriminator for the pull RPC.
pub const PULL_ACTION: &str = "FETCH_UPDATES";

/// Push request: submit one ordered outbox batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushRequest {
    action: String,
    /// The batch, in enqueue order.
    pub data: Vec<OutboxEntry>,
}

impl PushRequest {
    /// Creates a push request for the given batch.
    #[must_use]
    pub fn new(data: Vec<OutboxEntry>) -> Self {
        Self {
            action: PUSH_ACTION.into(),
            data,
        }
    }

    /// Encodes to JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_bytes(&self) -> ProtocolResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes from JSON bytes, validating the action discriminator.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed JSON or a foreign `action`.
    pub fn from_bytes(bytes: &[u8]) -> ProtocolResult<Self> {
        let request: Self = serde_json::from_slice(bytes)?;
        if request.action != PUSH_ACTION {
            return Err(ProtocolError::UnknownAction(request.action));
        }
        Ok(request)
    }
}

/// Push response: did the remote accept the whole batch.
///
/// Anything other than `success == true` is a push failure; the client keeps
/// the batch and retries on a later run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushResponse {
    /// Whether the entire batch was applied.
    pub success: bool,
}

impl PushResponse {
    /// An accepted batch.
    #[must_use]
    pub fn ok() -> Self {
        Self { success: true }
    }

    /// A rejected batch.
    #[must_use]
    pub fn failed() -> Self {
        Self { success: false }
    }

    /// Encodes to JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_bytes(&self) -> ProtocolResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes from JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed JSON.
    pub fn from_bytes(bytes: &[u8]) -> ProtocolResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Pull request: fetch records changed since a watermark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequest {
    action: String,
    /// Table to fetch.
    pub table: Table,
    /// Watermark in ms since epoch; the remote returns records stamped after
    /// this instant.
    pub since: i64,
}

impl PullRequest {
    /// Creates a pull request for one table.
    #[must_use]
    pub fn new(table: Table, since: i64) -> Self {
        Self {
            action: PULL_ACTION.into(),
            table,
            since,
        }
    }

    /// Encodes to JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_bytes(&self) -> ProtocolResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes from JSON bytes, validating the action discriminator.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed JSON or a foreign `action`.
    pub fn from_bytes(bytes: &[u8]) -> ProtocolResult<Self> {
        let request: Self = serde_json::from_slice(bytes)?;
        if request.action != PULL_ACTION {
            return Err(ProtocolError::UnknownAction(request.action));
        }
        Ok(request)
    }
}

/// Pull response: the changed records.
///
/// An absent `data` field is an empty result set, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullResponse {
    /// Changed records; `None` and `[]` are equivalent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Record>>,
}

impl PullResponse {
    /// A response carrying records.
    #[must_use]
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            data: Some(records),
        }
    }

    /// An empty response.
    #[must_use]
    pub fn empty() -> Self {
        Self { data: None }
    }

    /// Returns the records, treating an absent `data` as empty.
    #[must_use]
    pub fn records(self) -> Vec<Record> {
        self.data.unwrap_or_default()
    }

    /// Encodes to JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_bytes(&self) -> ProtocolResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes from JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed JSON.
    pub fn from_bytes(bytes: &[u8]) -> ProtocolResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
