//! Business tables and the opaque record shape.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed set of business tables kept in the store.
///
/// Wire names (used by the remote gateway and the journal) are the serialized
/// forms below. Sync always walks the tables in the order of [`Table::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Table {
    /// Product catalogue.
    #[serde(rename = "products")]
    Products,
    /// Customer directory.
    #[serde(rename = "customers")]
    Customers,
    /// Completed sales.
    #[serde(rename = "sales")]
    Sales,
    /// Delivery route points.
    #[serde(rename = "delivery-points")]
    DeliveryPoints,
}

impl Table {
    /// All business tables, in sync order.
    pub const ALL: [Table; 4] = [
        Table::Products,
        Table::Customers,
        Table::Sales,
        Table::DeliveryPoints,
    ];

    /// Returns the wire name of the table.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Table::Products => "products",
            Table::Customers => "customers",
            Table::Sales => "sales",
            Table::DeliveryPoints => "delivery-points",
        }
    }

    /// Parses a wire name back into a table.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "products" => Some(Table::Products),
            "customers" => Some(Table::Customers),
            "sales" => Some(Table::Sales),
            "delivery-points" => Some(Table::DeliveryPoints),
            _ => None,
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Field name carrying a record's unique identifier.
pub const ID_FIELD: &str = "id";

/// Field name carrying a record's last-write timestamp (ms since epoch).
pub const UPDATED_AT_FIELD: &str = "updatedAt";

/// One business entity: an opaque JSON object.
///
/// The store does not interpret record fields beyond two: `id` (globally
/// unique within its table) and `updatedAt` (ms since epoch, stamped at the
/// moment of a local write). `updatedAt` is the sole conflict-resolution
/// signal; the most recently stamped version of an `id` wins when readers
/// compare concurrent versions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(serde_json::Map<String, serde_json::Value>);

impl Record {
    /// Creates a record with only an `id` field.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        let mut map = serde_json::Map::new();
        map.insert(ID_FIELD.into(), serde_json::Value::String(id.into()));
        Self(map)
    }

    /// Wraps an existing JSON object.
    #[must_use]
    pub fn from_map(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Self(map)
    }

    /// Builder-style field setter.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    /// Returns the record's identifier, if present and a string.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.0.get(ID_FIELD).and_then(|v| v.as_str())
    }

    /// Returns the record's `updatedAt` stamp in ms, if present.
    #[must_use]
    pub fn updated_at(&self) -> Option<i64> {
        self.0.get(UPDATED_AT_FIELD).and_then(|v| v.as_i64())
    }

    /// Overwrites the `updatedAt` stamp.
    pub fn set_updated_at(&mut self, millis: i64) {
        self.0
            .insert(UPDATED_AT_FIELD.into(), serde_json::Value::from(millis));
    }

    /// Returns a field by name.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    /// Returns the underlying JSON object.
    #[must_use]
    pub fn as_map(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.0
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
#[must_use]
pub fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
