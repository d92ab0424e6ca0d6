//! The sync engine: push-then-pull orchestration and its state machine.

use crate::config::EngineConfig;
use crate::error::{SyncError, SyncResult};
use crate::gateway::RemoteGateway;
use crate::policy::{classify, LinkClass, NetworkMonitor};
use crate::status::{StatusHub, StatusListener, SyncStatus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tillsync_store::{now_millis, RecordStore, Table};
use tracing::{debug, info, warn};

/// Orchestrates synchronization between the local store and the remote.
///
/// One run is `push` (drain the outbox as a single batch) followed by `pull`
/// (per-table deltas since each watermark). Runs are mutually exclusive: an
/// in-flight flag drops concurrent triggers rather than queueing them; the
/// next scheduled tick retries naturally.
///
/// [`SyncEngine::run`] never fails: every outcome is a status transition,
/// and callers observe the returned (or subscribed) status.
pub struct SyncEngine<G: RemoteGateway, M: NetworkMonitor> {
    store: Arc<RecordStore>,
    gateway: Arc<G>,
    monitor: Arc<M>,
    config: EngineConfig,
    status: StatusHub,
    in_flight: AtomicBool,
}

impl<G: RemoteGateway, M: NetworkMonitor> SyncEngine<G, M> {
    /// Creates an engine over the given collaborators.
    pub fn new(store: Arc<RecordStore>, gateway: G, monitor: M, config: EngineConfig) -> Self {
        Self {
            store,
            gateway: Arc::new(gateway),
            monitor: Arc::new(monitor),
            config,
            status: StatusHub::new(),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Returns the current status.
    pub fn status(&self) -> SyncStatus {
        self.status.current()
    }

    /// Registers a status listener; returns an id for [`SyncEngine::unsubscribe`].
    ///
    /// Listeners are invoked synchronously on each transition and must not
    /// call back into the engine.
    pub fn subscribe(&self, listener: StatusListener) -> u64 {
        self.status.subscribe(listener)
    }

    /// Removes a status listener.
    pub fn unsubscribe(&self, id: u64) {
        self.status.unsubscribe(id);
    }

    /// Returns the store this engine synchronizes.
    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    /// Returns the remote gateway.
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Returns the network monitor.
    pub fn monitor(&self) -> &M {
        &self.monitor
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Classifies the current link via the injected monitor.
    pub fn link_class(&self) -> LinkClass {
        classify(self.monitor.as_ref())
    }

    /// Marks the engine offline immediately.
    ///
    /// Called by the scheduler on an offline transition so the UI does not
    /// wait for the next tick to learn about it.
    pub fn notify_offline(&self) {
        self.status.set(SyncStatus::Offline);
    }

    /// Performs one sync run.
    ///
    /// `force` is the manual override: it bypasses the metered-link gate but
    /// never the offline gate. Returns the post-run status. A call while a
    /// run is in flight is a no-op returning the current status.
    pub fn run(&self, force: bool) -> SyncStatus {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("sync already in flight, dropping trigger");
            return self.status.current();
        }

        let outcome = self.run_guarded(force);
        self.in_flight.store(false, Ordering::SeqCst);
        self.status.set(outcome);
        outcome
    }

    fn run_guarded(&self, force: bool) -> SyncStatus {
        match self.link_class() {
            LinkClass::Offline => return SyncStatus::Offline,
            LinkClass::Metered if !force => {
                debug!("auto-sync paused on metered link");
                return SyncStatus::PausedMetered;
            }
            _ => {}
        }

        if self.store.endpoint().is_none() {
            return SyncStatus::Unconfigured;
        }

        self.status.set(SyncStatus::Syncing);

        let result = self.push_phase().and_then(|()| self.pull_phase());
        match result {
            Ok(true) => SyncStatus::Idle,
            Ok(false) => SyncStatus::Error,
            Err(e) => {
                warn!(error = %e, "sync run aborted");
                SyncStatus::Error
            }
        }
    }

    /// Drains the outbox as one ordered batch.
    ///
    /// A rejected or unreachable push leaves the outbox untouched and is not
    /// an error for the run: entries retry next time, and the pull phase
    /// still executes. Only a local store failure aborts.
    fn push_phase(&self) -> SyncResult<()> {
        let batch = self.store.outbox_pending();
        if batch.is_empty() {
            return Ok(());
        }

        match self.gateway.push_outbox(&batch) {
            Ok(true) => {
                for entry in &batch {
                    self.store.acknowledge(entry.sequence)?;
                }
                info!(entries = batch.len(), "outbox pushed and trimmed");
                Ok(())
            }
            Ok(false) => {
                warn!(entries = batch.len(), "remote rejected outbox batch, keeping it");
                Ok(())
            }
            Err(SyncError::Store(e)) => Err(SyncError::Store(e)),
            Err(e) => {
                warn!(error = %e, "outbox push failed, keeping batch");
                Ok(())
            }
        }
    }

    /// Pulls per-table deltas since each table's watermark.
    ///
    /// Pulled records are applied as unconditional upserts without touching
    /// the outbox. The watermark advances to the instant the pull was issued,
    /// not to any record's own stamp, and only when the pull returned rows.
    /// Returns false if any table's fetch failed; a single table's failure
    /// never aborts its siblings.
    fn pull_phase(&self) -> SyncResult<bool> {
        let mut clean = true;

        for &table in &self.config.tables {
            let since = self.store.watermark(table);
            let issued_at = now_millis();

            match self.gateway.fetch_updates(table, since) {
                Ok(records) => {
                    let pulled = records.len();
                    for record in records {
                        self.apply_pulled(table, record)?;
                    }
                    if pulled > 0 {
                        self.store.advance_watermark(table, issued_at)?;
                        debug!(%table, pulled, watermark = issued_at, "pull applied");
                    }
                }
                Err(SyncError::Store(e)) => return Err(SyncError::Store(e)),
                Err(e) => {
                    warn!(%table, error = %e, "pull failed for table, continuing");
                    clean = false;
                }
            }
        }

        Ok(clean)
    }

    fn apply_pulled(&self, table: Table, record: tillsync_store::Record) -> SyncResult<()> {
        match self.store.put(table, record, false) {
            Ok(()) => Ok(()),
            // A remote record without an id cannot be stored; skip it rather
            // than poisoning the whole table's pull.
            Err(tillsync_store::StoreError::InvalidRecord(reason)) => {
                warn!(%table, %reason, "skipping malformed pulled record");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
