//! Durable key-value settings, including the sync watermarks.

use crate::record::Table;
use std::collections::BTreeMap;

/// Config key holding the remote endpoint URL.
pub const ENDPOINT_KEY: &str = "api_url";

/// Returns the config key holding a table's sync watermark.
#[must_use]
pub fn watermark_key(table: Table) -> String {
    format!("last_sync_{}", table.name())
}

/// In-memory view of the config table.
///
/// Config reads and writes never mirror to the outbox; settings are local to
/// this replica.
#[derive(Debug, Default)]
pub struct ConfigMap {
    values: BTreeMap<String, serde_json::Value>,
}

impl ConfigMap {
    /// Creates an empty config map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.values.get(key)
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.values.insert(key.into(), value);
    }

    /// Returns the configured remote endpoint, if usable.
    ///
    /// An endpoint is usable when it is a non-empty `http(s)` URL and not the
    /// placeholder shipped in fresh installs.
    #[must_use]
    pub fn endpoint(&self) -> Option<&str> {
        self.get(ENDPOINT_KEY)
            .and_then(|v| v.as_str())
            .filter(|url| {
                (url.starts_with("http://") || url.starts_with("https://"))
                    && !url.contains("YOUR_SCRIPT_ID")
            })
    }

    /// Returns a table's sync watermark in ms, defaulting to 0.
    #[must_use]
    pub fn watermark(&self, table: Table) -> i64 {
        self.get(&watermark_key(table))
            .and_then(|v| v.as_i64())
            .unwrap_or(0)
    }

    /// Advances a table's watermark.
    ///
    /// Watermarks are monotonically non-decreasing; a stale value is ignored.
    /// Returns the watermark now in effect.
    pub fn advance_watermark(&mut self, table: Table, millis: i64) -> i64 {
        let current = self.watermark(table);
        let next = current.max(millis);
        self.set(watermark_key(table), serde_json::Value::from(next));
        next
    }

    /// Iterates over all settings.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &serde_json::Value)> {
        self.values.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn endpoint_requires_http_url() {
        let mut config = ConfigMap::new();
        assert_eq!(config.endpoint(), None);

        config.set(ENDPOINT_KEY, json!(""));
        assert_eq!(config.endpoint(), None);

        config.set(ENDPOINT_KEY, json!("ftp://example.com"));
        assert_eq!(config.endpoint(), None);

        config.set(ENDPOINT_KEY, json!("https://script.example/YOUR_SCRIPT_ID/exec"));
        assert_eq!(config.endpoint(), None);

        config.set(ENDPOINT_KEY, json!("https://sync.example.com/api"));
        assert_eq!(config.endpoint(), Some("https://sync.example.com/api"));
    }

    #[test]
    fn watermark_defaults_to_zero() {
        let config = ConfigMap::new();
        assert_eq!(config.watermark(Table::Sales), 0);
    }

    #[test]
    fn watermark_never_goes_backwards() {
        let mut config = ConfigMap::new();
        assert_eq!(config.advance_watermark(Table::Sales, 1000), 1000);
        assert_eq!(config.advance_watermark(Table::Sales, 500), 1000);
        assert_eq!(config.advance_watermark(Table::Sales, 2000), 2000);
        assert_eq!(config.watermark(Table::Sales), 2000);
    }

    #[test]
    fn watermarks_are_per_table() {
        let mut config = ConfigMap::new();
        config.advance_watermark(Table::Products, 111);
        assert_eq!(config.watermark(Table::Products), 111);
        assert_eq!(config.watermark(Table::Customers), 0);
        assert_eq!(watermark_key(Table::DeliveryPoints), "last_sync_delivery-points");
    }
}
