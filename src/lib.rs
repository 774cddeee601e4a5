//! caselog - case records on an append-only event log
//!
//! Every change to a record is appended as one JSON line to a single event
//! file, which is the only source of truth. At startup the file is replayed
//! in order into an in-memory projection; afterwards each change is appended
//! first and applied to memory only once it is on disk.
//!
//! # Modules
//!
//! - `event_store`: The JSON Lines log file, its line codec and the `EventLog` trait
//! - `model`: Aggregate stores, replay, and the thread-safe `Model`
//! - `types`: Envelope and record types
//! - `api`: HTTP endpoints
//! - `config`: Environment configuration
//!
//! # Example
//!
//! ```no_run
//! use caselog::event_store::LogStoreConfig;
//! use caselog::model::Model;
//! use caselog::types::Case;
//!
//! fn main() -> Result<(), caselog::StoreError> {
//!     let model = Model::open(LogStoreConfig::new("db.jsonl"))?;
//!     let id = model.insert(Case::new("State v. Doe"))?;
//!     assert_eq!(model.get::<Case>(id)?.title, "State v. Doe");
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod event_store;
pub mod model;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use error::{StoreError, StoreResult};
pub use event_store::{EventLog, LogStore, LogStoreConfig};
pub use model::{Aggregate, AggregateStore, Model, Projection};
pub use types::{Case, Envelope};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
