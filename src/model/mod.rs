//! Model - the event log and its projection behind one lock
//!
//! A `Model` only exists after a complete replay of the log, so readers never
//! see a half-built state. Every change goes through the same two steps in
//! one write critical section:
//!
//! 1. append the event to the log (the source of truth)
//! 2. apply that exact envelope to the projection, as replay would
//!
//! If step 1 fails nothing in memory changes. If step 2 fails the file holds
//! an event the memory cannot represent; the model is poisoned and refuses all
//! further work until the process is restarted and rebuilds from the log.

mod aggregate;
mod projection;

use std::collections::BTreeMap;

use parking_lot::RwLock;
use tracing::{error, info};

use crate::error::{StoreError, StoreResult};
use crate::event_store::{EventLog, LogStore, LogStoreConfig};

pub use aggregate::{Aggregate, AggregateStore, MAX_ID};
pub use projection::{Kind, Projection};

/// Thread-safe projection of an event log
pub struct Model<L: EventLog = LogStore> {
    inner: RwLock<Inner<L>>,
}

struct Inner<L> {
    log: L,
    projection: Projection,
    /// Events applied so far, from replay and live appends
    events: usize,
    poisoned: Option<String>,
}

impl Model<LogStore> {
    /// Open the event file described by `config` and replay it
    pub fn open(config: LogStoreConfig) -> StoreResult<Self> {
        Self::rebuild(LogStore::open(config)?)
    }
}

impl<L: EventLog> Model<L> {
    /// Replay every event in `log` and take ownership of it for later appends
    pub fn rebuild(log: L) -> StoreResult<Self> {
        let entries = log.read_entries()?;
        let events = entries.len();
        let projection = Projection::replay(entries)?;

        info!(
            events,
            cases = projection.cases().len(),
            "Rebuilt state from event log"
        );

        Ok(Self {
            inner: RwLock::new(Inner {
                log,
                projection,
                events,
                poisoned: None,
            }),
        })
    }

    /// ID the next insert of kind `R` will receive
    pub fn next_id<R: Aggregate>(&self) -> StoreResult<u64> {
        let inner = self.inner.read();
        inner.ensure_consistent()?;
        inner.projection.store::<R>().allocate_id()
    }

    /// Persist a new record and return its ID
    pub fn insert<R: Aggregate>(&self, record: R) -> StoreResult<u64> {
        let mut inner = self.inner.write();
        inner.ensure_consistent()?;

        let id = inner.projection.store::<R>().allocate_id()?;
        inner.commit(id, &record)?;
        Ok(id)
    }

    /// Persist a replacement for the record at `id`
    pub fn update<R: Aggregate>(&self, id: u64, record: R) -> StoreResult<()> {
        let mut inner = self.inner.write();
        inner.ensure_consistent()?;

        inner.projection.store::<R>().get(id)?;
        inner.commit(id, &record)
    }

    pub fn get<R: Aggregate>(&self, id: u64) -> StoreResult<R> {
        let inner = self.inner.read();
        inner.ensure_consistent()?;
        inner.projection.store::<R>().get(id).cloned()
    }

    /// All records of kind `R`, ordered by ID
    pub fn get_all<R: Aggregate>(&self) -> StoreResult<BTreeMap<u64, R>> {
        let inner = self.inner.read();
        inner.ensure_consistent()?;
        Ok(inner.projection.store::<R>().get_all().clone())
    }

    /// Copy of the whole projection
    pub fn snapshot(&self) -> StoreResult<Projection> {
        let inner = self.inner.read();
        inner.ensure_consistent()?;
        Ok(inner.projection.clone())
    }

    /// Number of events replayed and appended since the model was built
    pub fn event_count(&self) -> usize {
        self.inner.read().events
    }

    pub fn is_poisoned(&self) -> bool {
        self.inner.read().poisoned.is_some()
    }
}

impl<L: EventLog> Inner<L> {
    fn ensure_consistent(&self) -> StoreResult<()> {
        match &self.poisoned {
            Some(reason) => Err(StoreError::Inconsistent(reason.clone())),
            None => Ok(()),
        }
    }

    /// Append the event for `(id, record)`, then apply what was appended
    fn commit<R: Aggregate>(&mut self, id: u64, record: &R) -> StoreResult<()> {
        let payload = AggregateStore::encode(id, record)?;
        let envelope = self.log.append(R::NAME, payload)?;

        // Ordinal among decoded events; blank or skipped lines make it
        // differ from the file line.
        let ordinal = self.events + 1;
        let applied = self.projection.apply(&envelope, ordinal);
        self.events = ordinal;

        let reason = match applied {
            Ok(applied_id) if applied_id == id => return Ok(()),
            Ok(applied_id) => format!(
                "{} event #{} was stored for id {} but applied to id {}",
                R::NAME,
                ordinal,
                id,
                applied_id
            ),
            Err(StoreError::MalformedEvent { reason, .. }) => format!(
                "{} event #{} was stored but could not be applied: {}",
                R::NAME,
                ordinal,
                reason
            ),
            Err(e) => format!(
                "{} event #{} was stored but could not be applied: {}",
                R::NAME,
                ordinal,
                e
            ),
        };

        error!(event = R::NAME, ordinal, %reason, "Event log and memory diverged");
        self.poisoned = Some(reason.clone());
        Err(StoreError::Inconsistent(reason))
    }
}
