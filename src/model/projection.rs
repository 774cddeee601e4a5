//! Projection - the in-memory state derived from the event log
//!
//! Replay walks the log once, in file order, and hands each envelope to
//! the store of the kind it names. An envelope that names no known kind, or
//! whose payload does not fit its kind, stops the replay: a projection that
//! only partly understands the log is never produced.

use std::fmt;

use crate::error::{StoreError, StoreResult};
use crate::event_store::LogEntry;
use crate::types::{Case, Envelope};

use super::aggregate::{Aggregate, AggregateStore};

/// Registry of aggregate kinds known to the projection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Case,
}

impl Kind {
    pub const ALL: [Kind; 1] = [Kind::Case];

    /// Event name of this kind in the log
    pub fn name(self) -> &'static str {
        match self {
            Kind::Case => Case::NAME,
        }
    }

    pub fn from_name(name: &str) -> Option<Kind> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One store per aggregate kind
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projection {
    pub(super) cases: AggregateStore<Case>,
}

impl Projection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a projection by applying `entries` in order
    pub fn replay<I>(entries: I) -> StoreResult<Self>
    where
        I: IntoIterator<Item = LogEntry>,
    {
        let mut projection = Self::new();
        for entry in entries {
            projection.apply(&entry.envelope, entry.line)?;
        }
        Ok(projection)
    }

    /// Apply one envelope; `line` is only used to annotate errors.
    ///
    /// Returns the ID of the record the envelope wrote. On error the
    /// projection is unchanged.
    pub fn apply(&mut self, envelope: &Envelope, line: usize) -> StoreResult<u64> {
        let kind = Kind::from_name(&envelope.name).ok_or_else(|| StoreError::UnknownEvent {
            line,
            name: envelope.name.clone(),
        })?;

        let applied = match kind {
            Kind::Case => self.cases.apply(&envelope.data),
        };

        applied.map_err(|reason| StoreError::MalformedEvent {
            line,
            kind: kind.name(),
            reason,
        })
    }

    /// Store of kind `R`
    pub fn store<R: Aggregate>(&self) -> &AggregateStore<R> {
        R::store(self)
    }

    pub fn cases(&self) -> &AggregateStore<Case> {
        &self.cases
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(line: usize, name: &str, data: serde_json::Value) -> LogEntry {
        LogEntry {
            line,
            envelope: Envelope::with_timestamp(name, data, 1704067200),
        }
    }

    #[test]
    fn test_kind_registry() {
        assert_eq!(Kind::from_name("Case"), Some(Kind::Case));
        assert_eq!(Kind::from_name("case"), None);
        assert_eq!(Kind::from_name("Theme"), None);
        assert_eq!(Kind::Case.to_string(), "Case");
    }

    #[test]
    fn test_replay_in_order() {
        let projection = Projection::replay(vec![
            entry(1, "Case", json!({"ID": 1, "Fields": {"title": "A"}})),
            entry(2, "Case", json!({"ID": 2, "Fields": {"title": "B"}})),
            entry(3, "Case", json!({"ID": 1, "Fields": {"title": "A2"}})),
        ])
        .unwrap();

        let cases = projection.cases();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases.get(1).unwrap().title, "A2");
        assert_eq!(cases.get(2).unwrap().title, "B");
        assert_eq!(cases.next_id(), 3);
    }

    #[test]
    fn test_unknown_event_aborts_replay() {
        let result = Projection::replay(vec![
            entry(1, "Case", json!({"ID": 1, "Fields": {"title": "A"}})),
            entry(2, "Theme", json!({"color": "dark"})),
        ]);

        match result {
            Err(StoreError::UnknownEvent { line, name }) => {
                assert_eq!(line, 2);
                assert_eq!(name, "Theme");
            }
            other => panic!("expected unknown event, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_event_reports_line() {
        let result = Projection::replay(vec![
            entry(1, "Case", json!({"ID": 1, "Fields": {"title": "A"}})),
            entry(4, "Case", json!({"Fields": {"title": "no id"}})),
        ]);

        match result {
            Err(StoreError::MalformedEvent { line, kind, .. }) => {
                assert_eq!(line, 4);
                assert_eq!(kind, "Case");
            }
            other => panic!("expected malformed event, got {:?}", other),
        }
    }

    #[test]
    fn test_failed_apply_leaves_projection_unchanged() {
        let mut projection = Projection::new();
        projection
            .apply(
                &Envelope::new("Case", json!({"ID": 1, "Fields": {"title": "A"}})),
                1,
            )
            .unwrap();
        let before = projection.clone();

        assert!(projection
            .apply(&Envelope::new("Case", json!({"ID": 1, "Fields": "not a case"})), 2)
            .is_err());
        assert!(projection
            .apply(&Envelope::new("Nope", json!({})), 3)
            .is_err());

        assert_eq!(projection, before);
    }

    #[test]
    fn test_generic_store_access() {
        let mut projection = Projection::new();
        Case::store_mut(&mut projection)
            .insert(Case::new("X"))
            .unwrap();

        assert_eq!(projection.store::<Case>().len(), 1);
        assert_eq!(projection.cases().get(1).unwrap().title, "X");
    }
}
