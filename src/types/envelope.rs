//! Event envelope - the unit of durability in the event log
//!
//! An envelope carries the name of the aggregate kind it belongs to, an
//! opaque JSON payload and the second it was appended. The log store never
//! looks inside the payload; only the projection decodes it.

use serde_json::Value;

/// An immutable event as stored in one line of the event log
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// Aggregate kind the payload encodes (e.g. "Case")
    pub name: String,

    /// Opaque payload, kept as nested JSON
    pub data: Value,

    /// Unix timestamp (seconds) assigned when the event was appended
    pub timestamp: i64,
}

impl Envelope {
    /// Create a new envelope stamped with the current time
    pub fn new(name: impl Into<String>, data: Value) -> Self {
        Self::with_timestamp(name, data, crate::utils::current_timestamp())
    }

    /// Create an envelope with a specific timestamp
    pub fn with_timestamp(name: impl Into<String>, data: Value, timestamp: i64) -> Self {
        Self {
            name: name.into(),
            data,
            timestamp,
        }
    }
}
