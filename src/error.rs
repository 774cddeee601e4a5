//! Error types for the event log and the projection built from it.

use std::path::PathBuf;

/// Result type for event log and model operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while writing, reading or replaying the event log
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The log file could not be created, opened, written or read.
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A payload or event name cannot be represented in the wire format.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// A line of the log file is not a valid envelope.
    #[error("Corrupted event log at line {line}: {reason}")]
    Corruption { line: usize, reason: String },

    /// An envelope names no registered aggregate kind.
    #[error("Unknown event {name:?} at line {line}")]
    UnknownEvent { line: usize, name: String },

    /// An envelope payload does not decode into its kind's shape.
    #[error("Malformed {kind} event at line {line}: {reason}")]
    MalformedEvent {
        line: usize,
        kind: &'static str,
        reason: String,
    },

    /// No record with this ID exists for the kind.
    #[error("{kind} with id {id} was not found")]
    NotFound { kind: &'static str, id: u64 },

    /// Every ID of the kind is taken; nothing was written.
    #[error("No {kind} ID left to allocate")]
    IdsExhausted { kind: &'static str },

    /// The log holds an event the in-memory state could not apply.
    #[error("Event log and memory diverged: {0}")]
    Inconsistent(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for the recoverable "no such record" case
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    /// True for errors that mean the log and the projection cannot be trusted.
    ///
    /// At startup every error is fatal; this is for errors raised at runtime.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            StoreError::Corruption { .. }
                | StoreError::UnknownEvent { .. }
                | StoreError::MalformedEvent { .. }
                | StoreError::Inconsistent(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn io_error_keeps_kind_and_path() {
        let err = StoreError::io(
            "/tmp/db.jsonl",
            io::Error::new(io::ErrorKind::PermissionDenied, "access denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/tmp/db.jsonl"));
        assert!(msg.contains("access denied"));

        match err {
            StoreError::Io { source, .. } => {
                assert_eq!(source.kind(), io::ErrorKind::PermissionDenied)
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unknown_event_display() {
        let err = StoreError::UnknownEvent {
            line: 3,
            name: "Theme".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown event \"Theme\" at line 3");
        assert!(err.is_fatal());
        assert!(!err.is_not_found());
    }

    #[test]
    fn not_found_is_recoverable() {
        let err = StoreError::NotFound { kind: "Case", id: 7 };
        assert_eq!(err.to_string(), "Case with id 7 was not found");
        assert!(err.is_not_found());
        assert!(!err.is_fatal());
    }

    const _: () = {
        #[allow(dead_code)]
        fn assert_send_sync<T: Send + Sync + 'static>() {}

        #[allow(dead_code)]
        fn check() {
            assert_send_sync::<StoreError>();
        }
    };
}
