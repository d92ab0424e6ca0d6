//! Remote gateway abstraction.

use crate::error::{SyncError, SyncResult};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tillsync_store::{OutboxEntry, Record, Table};

/// The remote authoritative store, as the engine sees it.
///
/// Exactly two operations, both idempotent-safe upserts on the far side.
/// Implementations handle the transport ([`crate::HttpGateway`]) or script
/// responses for tests ([`MockGateway`]).
pub trait RemoteGateway: Send + Sync {
    /// Submits one ordered outbox batch.
    ///
    /// Returns the remote's success flag; transport failures are errors.
    fn push_outbox(&self, entries: &[OutboxEntry]) -> SyncResult<bool>;

    /// Fetches all records of `table` changed since `since` (ms).
    fn fetch_updates(&self, table: Table, since: i64) -> SyncResult<Vec<Record>>;
}

/// Scripted responses for one table pull.
#[derive(Debug, Clone)]
enum PullScript {
    Records(Vec<Record>),
    Fail(String),
}

/// A mock gateway for engine tests.
///
/// Push responses are scripted globally; pull responses per table. Call
/// counts let tests assert that policy gates produced zero network calls.
#[derive(Default)]
pub struct MockGateway {
    push_success: Mutex<Option<bool>>,
    push_fail: Mutex<Option<String>>,
    pulls: Mutex<Vec<(Table, PullScript)>>,
    push_calls: AtomicUsize,
    pull_calls: AtomicUsize,
    pushed: Mutex<Vec<Vec<OutboxEntry>>>,
}

impl MockGateway {
    /// Creates a gateway that accepts pushes and returns empty pulls.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the push success flag.
    pub fn set_push_success(&self, success: bool) {
        *self.push_success.lock() = Some(success);
        *self.push_fail.lock() = None;
    }

    /// Scripts a push transport failure.
    pub fn set_push_transport_failure(&self, message: impl Into<String>) {
        *self.push_fail.lock() = Some(message.into());
    }

    /// Scripts records returned for one table.
    pub fn set_pull_records(&self, table: Table, records: Vec<Record>) {
        self.pulls.lock().push((table, PullScript::Records(records)));
    }

    /// Scripts a transport failure for one table.
    pub fn set_pull_failure(&self, table: Table, message: impl Into<String>) {
        self.pulls
            .lock()
            .push((table, PullScript::Fail(message.into())));
    }

    /// Number of push calls made.
    pub fn push_calls(&self) -> usize {
        self.push_calls.load(Ordering::SeqCst)
    }

    /// Number of pull calls made.
    pub fn pull_calls(&self) -> usize {
        self.pull_calls.load(Ordering::SeqCst)
    }

    /// Every batch that was pushed, in order.
    pub fn pushed_batches(&self) -> Vec<Vec<OutboxEntry>> {
        self.pushed.lock().clone()
    }
}

impl RemoteGateway for MockGateway {
    fn push_outbox(&self, entries: &[OutboxEntry]) -> SyncResult<bool> {
        self.push_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.push_fail.lock().clone() {
            return Err(SyncError::transport_retryable(message));
        }
        self.pushed.lock().push(entries.to_vec());
        Ok(self.push_success.lock().unwrap_or(true))
    }

    fn fetch_updates(&self, table: Table, _since: i64) -> SyncResult<Vec<Record>> {
        self.pull_calls.fetch_add(1, Ordering::SeqCst);
        let script = self
            .pulls
            .lock()
            .iter()
            .rev()
            .find(|(t, _)| *t == table)
            .map(|(_, s)| s.clone());
        match script {
            Some(PullScript::Records(records)) => Ok(records),
            Some(PullScript::Fail(message)) => Err(SyncError::transport_retryable(message)),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tillsync_store::Action;

    #[test]
    fn default_mock_accepts_everything() {
        let gateway = MockGateway::new();
        assert!(gateway.push_outbox(&[]).unwrap());
        assert!(gateway.fetch_updates(Table::Sales, 0).unwrap().is_empty());
        assert_eq!(gateway.push_calls(), 1);
        assert_eq!(gateway.pull_calls(), 1);
    }

    #[test]
    fn scripted_push_failure() {
        let gateway = MockGateway::new();
        gateway.set_push_success(false);
        assert!(!gateway.push_outbox(&[]).unwrap());

        gateway.set_push_transport_failure("connection reset");
        assert!(gateway.push_outbox(&[]).is_err());
    }

    #[test]
    fn latest_pull_script_wins() {
        let gateway = MockGateway::new();
        gateway.set_pull_records(Table::Products, vec![Record::new("p-1")]);
        gateway.set_pull_records(Table::Products, vec![Record::new("p-2")]);

        let records = gateway.fetch_updates(Table::Products, 0).unwrap();
        assert_eq!(records[0].id(), Some("p-2"));
    }

    #[test]
    fn pushed_batches_are_recorded() {
        let gateway = MockGateway::new();
        let entry = OutboxEntry {
            sequence: 1,
            table: Table::Products,
            action: Action::Create,
            payload: json!({"id": "p-1"}),
            enqueued_at: 0,
        };
        gateway.push_outbox(std::slice::from_ref(&entry)).unwrap();
        assert_eq!(gateway.pushed_batches(), vec![vec![entry]]);
    }
}
