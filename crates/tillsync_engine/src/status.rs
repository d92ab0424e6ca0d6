//! Process-wide sync status and its subscribers.

use parking_lot::RwLock;
use std::fmt;

/// The observable state of the sync engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// Resting; the last run (if any) completed.
    Idle,
    /// A run is in progress.
    Syncing,
    /// The last run failed.
    Error,
    /// No usable remote endpoint is registered.
    Unconfigured,
    /// The host is offline.
    Offline,
    /// An automatic run was skipped because the link is metered.
    PausedMetered,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncStatus::Idle => "idle",
            SyncStatus::Syncing => "syncing",
            SyncStatus::Error => "error",
            SyncStatus::Unconfigured => "unconfigured",
            SyncStatus::Offline => "offline",
            SyncStatus::PausedMetered => "paused-metered",
        };
        f.write_str(name)
    }
}

/// A status change callback.
pub type StatusListener = Box<dyn Fn(SyncStatus) + Send + Sync>;

struct Subscriber {
    id: u64,
    listener: StatusListener,
}

/// Owns the current status and a subscriber list.
///
/// Subscribers are notified synchronously on every transition, in
/// subscription order; a transition to the current status notifies nobody.
/// Listeners must not call back into the engine.
pub struct StatusHub {
    current: RwLock<SyncStatus>,
    subscribers: RwLock<Vec<Subscriber>>,
    next_id: RwLock<u64>,
}

impl StatusHub {
    /// Creates a hub in the [`SyncStatus::Idle`] state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: RwLock::new(SyncStatus::Idle),
            subscribers: RwLock::new(Vec::new()),
            next_id: RwLock::new(1),
        }
    }

    /// Returns the current status.
    pub fn current(&self) -> SyncStatus {
        *self.current.read()
    }

    /// Registers a listener; returns an id for [`StatusHub::unsubscribe`].
    pub fn subscribe(&self, listener: StatusListener) -> u64 {
        let mut next_id = self.next_id.write();
        let id = *next_id;
        *next_id += 1;
        self.subscribers.write().push(Subscriber { id, listener });
        id
    }

    /// Removes a listener. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: u64) {
        self.subscribers.write().retain(|s| s.id != id);
    }

    /// Transitions to `status`, notifying subscribers if it changed.
    pub fn set(&self, status: SyncStatus) {
        {
            let mut current = self.current.write();
            if *current == status {
                return;
            }
            *current = status;
        }
        // Notify outside the status lock; listeners may read current().
        let subscribers = self.subscribers.read();
        for subscriber in subscribers.iter() {
            (subscriber.listener)(status);
        }
    }
}

impl Default for StatusHub {
    fn default() -> Self {
        Self::new()
    }
}
