//! Event Store Module
//!
//! The append-only event log that is the single source of truth:
//! - `LogStore`: owns the JSON Lines file, appends and reads back envelopes
//! - `codec`: one envelope per line, in a fixed wire shape
//! - `payload`: conversion of payloads to JSON data, refusing NaN and infinities
//! - `EventLog`: the trait the projection writes through
//!
//! # Architecture
//!
//! ```text
//! Write Path:
//! ┌─────────┐    ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ Request │───►│ next ID from │───►│ append line  │───►│ apply to the │
//! │         │    │ projection   │    │ to db.jsonl  │    │ projection   │
//! └─────────┘    └──────────────┘    └──────────────┘    └──────────────┘
//!
//! Read Path (Startup):
//! ┌───────────────┐    ┌─────────────────┐
//! │ Read db.jsonl │───►│ Replay events   │───► Ready!
//! │ line by line  │    │ in file order   │
//! └───────────────┘    └─────────────────┘
//! ```

pub mod codec;
mod log;
pub mod payload;
mod store;

pub use log::{EventLog, LogEntry};
pub use store::{CorruptionPolicy, LogStore, LogStoreConfig};
