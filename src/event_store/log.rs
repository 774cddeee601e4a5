//! The seam between the projection and whatever persists its events.

use serde_json::Value;

use crate::error::StoreResult;
use crate::types::Envelope;

/// An envelope together with the 1-based line it was read from
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub line: usize,
    pub envelope: Envelope,
}

/// Append-only, durable sequence of envelopes.
///
/// Implementations must persist an envelope before `append` returns `Ok`, and
/// `read_entries` must return envelopes in the order they were appended.
pub trait EventLog: Send + Sync {
    /// Durably append one event and return the stamped envelope.
    fn append(&mut self, name: &str, payload: Value) -> StoreResult<Envelope>;

    /// Read back every event in append order.
    fn read_entries(&self) -> StoreResult<Vec<LogEntry>>;

    /// Read back every envelope in append order.
    fn read_all(&self) -> StoreResult<Vec<Envelope>> {
        Ok(self
            .read_entries()?
            .into_iter()
            .map(|entry| entry.envelope)
            .collect())
    }
}
