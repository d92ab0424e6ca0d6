//! Configuration for the sync engine and scheduler.

use std::time::Duration;
use tillsync_store::Table;

/// Configuration for sync runs.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Tables pulled on every run, in order.
    pub tables: Vec<Table>,
    /// Interval between automatic runs.
    pub interval: Duration,
}

impl EngineConfig {
    /// Creates the default configuration: all business tables, 15 s interval.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tables: Table::ALL.to_vec(),
            interval: Duration::from_secs(15),
        }
    }

    /// Restricts the pulled tables.
    #[must_use]
    pub fn with_tables(mut self, tables: Vec<Table>) -> Self {
        self.tables = tables;
        self
    }

    /// Sets the automatic run interval.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
