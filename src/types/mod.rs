//! Data types stored in and decoded from the event log

mod case;
mod envelope;

pub use case::Case;
pub use envelope::Envelope;
