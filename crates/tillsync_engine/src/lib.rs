//! Synchronization engine for TillSync.
//!
//! Connects a local [`tillsync_store::RecordStore`] to a remote authoritative
//! backend with a push-then-pull cycle: the outbox is drained as one ordered
//! batch, then each table's changes since its watermark are pulled and applied
//! as upserts. Runs are gated by a network policy (offline blocks everything,
//! a metered link blocks automatic runs), and every outcome is published as a
//! [`SyncStatus`] that UIs can subscribe to.
//!
//! The remote transport is behind the [`RemoteGateway`] and [`HttpClient`]
//! traits so embedders choose their own HTTP library; [`SyncScheduler`] runs
//! the engine periodically on a background thread.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod engine;
mod error;
mod gateway;
mod http;
mod policy;
mod scheduler;
mod status;

pub use config::EngineConfig;
pub use engine::SyncEngine;
pub use error::{SyncError, SyncResult};
pub use gateway::{MockGateway, RemoteGateway};
pub use http::{HttpClient, HttpGateway, LoopbackClient, LoopbackHandler};
pub use policy::{classify, LinkClass, LinkKind, NetworkMonitor, StaticMonitor};
pub use scheduler::{ConnectivityEvent, SyncScheduler};
pub use status::{StatusHub, StatusListener, SyncStatus};
