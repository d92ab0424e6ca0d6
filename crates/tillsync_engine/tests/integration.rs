//! Integration tests: full engine runs against an in-process remote, over the
//! real wire encode/decode path.

use parking_lot::Mutex;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tillsync_engine::{
    EngineConfig, HttpGateway, LoopbackClient, LoopbackHandler, StaticMonitor, SyncEngine,
    SyncStatus,
};
use tillsync_protocol::{
    PullRequest, PullResponse, PushRequest, PushResponse, PULL_ACTION, PUSH_ACTION,
};
use tillsync_store::{now_millis, Action, FileBackend, Record, RecordStore, Table};

/// An in-process stand-in for the remote backend.
///
/// Applies pushed batches as upserts/deletes keyed by record id and answers
/// pulls with every record stamped after the requested watermark.
#[derive(Default)]
struct InMemoryRemote {
    tables: Mutex<BTreeMap<Table, BTreeMap<String, Record>>>,
    push_batches: Mutex<usize>,
}

impl InMemoryRemote {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Seeds a record directly, as if another till had pushed it.
    fn seed(&self, table: Table, record: Record) {
        let id = record.id().unwrap().to_string();
        self.tables.lock().entry(table).or_default().insert(id, record);
    }

    fn record(&self, table: Table, id: &str) -> Option<Record> {
        self.tables.lock().get(&table)?.get(id).cloned()
    }

    fn count(&self, table: Table) -> usize {
        self.tables.lock().get(&table).map_or(0, BTreeMap::len)
    }

    fn handle_push(&self, request: PushRequest) -> PushResponse {
        *self.push_batches.lock() += 1;
        let mut tables = self.tables.lock();
        for entry in request.data {
            let rows = tables.entry(entry.table).or_default();
            match entry.action {
                Action::Create => {
                    let record = Record::from_map(
                        entry.payload.as_object().cloned().unwrap_or_default(),
                    );
                    if let Some(id) = record.id() {
                        rows.insert(id.to_string(), record);
                    }
                }
                Action::Delete => {
                    if let Some(id) = entry.payload.get("id").and_then(|v| v.as_str()) {
                        rows.remove(id);
                    }
                }
            }
        }
        PushResponse::ok()
    }

    fn handle_pull(&self, request: PullRequest) -> PullResponse {
        let tables = self.tables.lock();
        let records: Vec<Record> = tables
            .get(&request.table)
            .map(|rows| {
                rows.values()
                    .filter(|r| r.updated_at().unwrap_or(0) > request.since)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        if records.is_empty() {
            PullResponse::empty()
        } else {
            PullResponse::new(records)
        }
    }
}

impl LoopbackHandler for InMemoryRemote {
    fn handle(&self, body: &[u8]) -> Result<Vec<u8>, String> {
        let value: serde_json::Value =
            serde_json::from_slice(body).map_err(|e| e.to_string())?;
        let response = match value.get("action").and_then(|a| a.as_str()) {
            Some(PUSH_ACTION) => {
                let request = PushRequest::from_bytes(body).map_err(|e| e.to_string())?;
                self.handle_push(request).to_bytes()
            }
            Some(PULL_ACTION) => {
                let request = PullRequest::from_bytes(body).map_err(|e| e.to_string())?;
                self.handle_pull(request).to_bytes()
            }
            other => return Err(format!("unknown action: {other:?}")),
        };
        response.map_err(|e| e.to_string())
    }
}

type TestEngine = SyncEngine<HttpGateway<LoopbackClient<Arc<InMemoryRemote>>>, StaticMonitor>;

fn till(remote: &Arc<InMemoryRemote>, monitor: StaticMonitor) -> TestEngine {
    let store = Arc::new(RecordStore::in_memory().unwrap());
    store
        .set_config("api_url", json!("https://sync.example.com/exec"))
        .unwrap();
    let gateway = HttpGateway::new(
        "https://sync.example.com/exec",
        LoopbackClient::new(Arc::clone(remote)),
    );
    SyncEngine::new(store, gateway, monitor, EngineConfig::new())
}

#[test]
fn push_then_pull_full_cycle() {
    let remote = InMemoryRemote::new();
    remote.seed(
        Table::Products,
        Record::new("p-remote")
            .with_field("name", json!("Flour 1kg"))
            .with_field("updatedAt", json!(now_millis())),
    );

    let engine = till(&remote, StaticMonitor::online());
    engine
        .store()
        .put(
            Table::Sales,
            Record::new("s-1").with_field("total", json!(1250)),
            true,
        )
        .unwrap();

    assert_eq!(engine.run(false), SyncStatus::Idle);

    // The sale reached the remote and the outbox drained.
    assert_eq!(remote.count(Table::Sales), 1);
    assert_eq!(engine.store().outbox_len(), 0);

    // The remote product came back in the same run.
    let pulled = engine.store().get_by_id(Table::Products, "p-remote").unwrap();
    assert_eq!(pulled.get("name"), Some(&json!("Flour 1kg")));
}

#[test]
fn two_tills_converge_through_the_remote() {
    let remote = InMemoryRemote::new();
    let till_a = till(&remote, StaticMonitor::online());
    let till_b = till(&remote, StaticMonitor::online());

    till_a
        .store()
        .put(
            Table::Customers,
            Record::new("c-1").with_field("name", json!("Amadou")),
            true,
        )
        .unwrap();
    assert_eq!(till_a.run(false), SyncStatus::Idle);
    assert_eq!(till_b.run(false), SyncStatus::Idle);

    let seen = till_b.store().get_by_id(Table::Customers, "c-1").unwrap();
    assert_eq!(seen.get("name"), Some(&json!("Amadou")));
    // Nothing echoed back into till B's outbox.
    assert_eq!(till_b.store().outbox_len(), 0);
}

#[test]
fn deletes_propagate_to_the_remote() {
    let remote = InMemoryRemote::new();
    let engine = till(&remote, StaticMonitor::online());

    engine
        .store()
        .put(Table::Products, Record::new("p-1"), true)
        .unwrap();
    assert_eq!(engine.run(false), SyncStatus::Idle);
    assert_eq!(remote.count(Table::Products), 1);

    engine.store().delete(Table::Products, "p-1", true).unwrap();
    assert_eq!(engine.run(false), SyncStatus::Idle);
    assert_eq!(remote.count(Table::Products), 0);
}

#[test]
fn queued_work_survives_offline_and_drains_on_reconnect() {
    let remote = InMemoryRemote::new();
    let monitor = StaticMonitor::offline();
    let engine = till(&remote, monitor);

    for i in 0..3 {
        engine
            .store()
            .put(Table::Sales, Record::new(format!("s-{i}")), true)
            .unwrap();
    }

    assert_eq!(engine.run(false), SyncStatus::Offline);
    assert_eq!(engine.store().outbox_len(), 3);
    assert_eq!(remote.count(Table::Sales), 0);

    engine.monitor().set_online(true);
    assert_eq!(engine.run(false), SyncStatus::Idle);
    assert_eq!(engine.store().outbox_len(), 0);
    assert_eq!(remote.count(Table::Sales), 3);
}

#[test]
fn outbox_survives_restart_and_pushes_in_order() {
    let remote = InMemoryRemote::new();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("till.db");

    {
        let store = Arc::new(RecordStore::open(FileBackend::open(&path).unwrap()).unwrap());
        store
            .set_config("api_url", json!("https://sync.example.com/exec"))
            .unwrap();
        for i in 0..3 {
            store
                .put(Table::Sales, Record::new(format!("s-{i}")), true)
                .unwrap();
        }
        // Simulated crash before any sync: the store just drops.
    }

    let store = Arc::new(RecordStore::open(FileBackend::open(&path).unwrap()).unwrap());
    let gateway = HttpGateway::new(
        "https://sync.example.com/exec",
        LoopbackClient::new(Arc::clone(&remote)),
    );
    let engine = SyncEngine::new(store, gateway, StaticMonitor::online(), EngineConfig::new());

    assert_eq!(engine.run(false), SyncStatus::Idle);
    assert_eq!(remote.count(Table::Sales), 3);
    assert_eq!(*remote.push_batches.lock(), 1);
    assert_eq!(engine.store().outbox_len(), 0);
}

#[test]
fn second_run_pulls_only_newer_records() {
    let remote = InMemoryRemote::new();
    let engine = till(&remote, StaticMonitor::online());

    remote.seed(
        Table::Products,
        Record::new("p-1").with_field("updatedAt", json!(now_millis())),
    );
    assert_eq!(engine.run(false), SyncStatus::Idle);
    assert_eq!(engine.store().get_all(Table::Products).len(), 1);

    // Nothing new on the remote: the advanced watermark filters p-1 out.
    assert_eq!(engine.run(false), SyncStatus::Idle);
    assert_eq!(engine.store().get_all(Table::Products).len(), 1);

    // A record stamped after the last pull comes through.
    remote.seed(
        Table::Products,
        Record::new("p-2").with_field("updatedAt", json!(now_millis() + 1)),
    );
    assert_eq!(engine.run(false), SyncStatus::Idle);
    assert_eq!(engine.store().get_all(Table::Products).len(), 2);
}

#[test]
fn remote_edit_overwrites_local_copy() {
    let remote = InMemoryRemote::new();
    let engine = till(&remote, StaticMonitor::online());

    engine
        .store()
        .put(
            Table::Products,
            Record::new("p-1").with_field("stock", json!(10)),
            true,
        )
        .unwrap();
    assert_eq!(engine.run(false), SyncStatus::Idle);

    // Back office edits the product after our push.
    remote.seed(
        Table::Products,
        Record::new("p-1")
            .with_field("stock", json!(7))
            .with_field("updatedAt", json!(now_millis() + 1)),
    );
    assert_eq!(engine.run(false), SyncStatus::Idle);

    let local = engine.store().get_by_id(Table::Products, "p-1").unwrap();
    assert_eq!(local.get("stock"), Some(&json!(7)));
    let pushed = remote.record(Table::Products, "p-1").unwrap();
    assert_eq!(pushed.get("stock"), Some(&json!(7)));
}
