//! Background scheduler: periodic runs plus connectivity-driven triggers.

use crate::engine::SyncEngine;
use crate::gateway::RemoteGateway;
use crate::policy::{LinkClass, NetworkMonitor};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, info};

/// A connectivity transition reported by the host platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEvent {
    /// The host regained connectivity.
    Online,
    /// The host lost connectivity.
    Offline,
    /// The link type changed without going offline (e.g. cellular to wifi).
    LinkChanged,
}

enum Message {
    Connectivity(ConnectivityEvent),
    Shutdown,
}

/// Drives an engine on a background thread.
///
/// Runs once at startup, then on every interval tick and on favorable
/// connectivity transitions. All runs are automatic (`force = false`), so
/// the metered-link policy applies throughout.
pub struct SyncScheduler {
    sender: Sender<Message>,
    worker: Option<JoinHandle<()>>,
}

impl SyncScheduler {
    /// Spawns the scheduler thread for `engine`.
    pub fn start<G, M>(engine: Arc<SyncEngine<G, M>>) -> Self
    where
        G: RemoteGateway + 'static,
        M: NetworkMonitor + 'static,
    {
        let (sender, receiver) = mpsc::channel();
        let interval = engine.config().interval;

        let worker = std::thread::spawn(move || {
            info!(interval_secs = interval.as_secs(), "sync scheduler started");
            engine.run(false);

            loop {
                match receiver.recv_timeout(interval) {
                    Ok(Message::Shutdown) => break,
                    Ok(Message::Connectivity(event)) => match event {
                        ConnectivityEvent::Offline => {
                            debug!("connectivity lost");
                            engine.notify_offline();
                        }
                        ConnectivityEvent::Online => {
                            debug!("connectivity regained, syncing");
                            engine.run(false);
                        }
                        ConnectivityEvent::LinkChanged => {
                            // Only an upgrade to an unmetered link warrants an
                            // off-schedule run; downgrades wait for the tick.
                            if engine.link_class() == LinkClass::Unmetered {
                                debug!("link became unmetered, syncing");
                                engine.run(false);
                            }
                        }
                    },
                    Err(RecvTimeoutError::Timeout) => {
                        engine.run(false);
                    }
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            info!("sync scheduler stopped");
        });

        Self {
            sender,
            worker: Some(worker),
        }
    }

    /// Forwards a connectivity transition to the scheduler thread.
    pub fn notify(&self, event: ConnectivityEvent) {
        // A send can only fail after shutdown; dropping it is fine then.
        let _ = self.sender.send(Message::Connectivity(event));
    }

    /// Stops the scheduler and joins its thread.
    pub fn shutdown(mut self) {
        self.shutdown_inner();
    }

    fn shutdown_inner(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = self.sender.send(Message::Shutdown);
            let _ = worker.join();
        }
    }
}

impl Drop for SyncScheduler {
    fn drop(&mut self) {
        self.shutdown_inner();
    }
}
