//! Per-kind record stores
//!
//! Every aggregate kind keeps its records in an `AggregateStore`, keyed by
//! a positive integer ID. IDs are never stored separately: the next ID is
//! always one past the largest ID present, so it survives restarts as long
//! as the log does.
//!
//! Valid IDs run from 1 to `MAX_ID`. `u64::MAX` is never stored, so the
//! successor of any stored ID is representable.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{StoreError, StoreResult};
use crate::event_store::payload::to_data;
use crate::types::Case;

use super::projection::Projection;

/// Largest ID a record can be stored under
pub const MAX_ID: u64 = u64::MAX - 1;

/// A record type that is persisted as events of its own kind
pub trait Aggregate: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Event name used in the log
    const NAME: &'static str;

    fn store(projection: &Projection) -> &AggregateStore<Self>;

    fn store_mut(projection: &mut Projection) -> &mut AggregateStore<Self>;
}

impl Aggregate for Case {
    const NAME: &'static str = "Case";

    fn store(projection: &Projection) -> &AggregateStore<Self> {
        &projection.cases
    }

    fn store_mut(projection: &mut Projection) -> &mut AggregateStore<Self> {
        &mut projection.cases
    }
}

/// Payload of every kind's event: `{"ID": <id>, "Fields": <record>}`
#[derive(Serialize)]
struct PayloadRef<'a, R> {
    #[serde(rename = "ID")]
    id: u64,
    #[serde(rename = "Fields")]
    fields: &'a R,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Payload<R> {
    #[serde(rename = "ID")]
    id: u64,
    #[serde(rename = "Fields")]
    fields: R,
}

/// ID to record mapping for one aggregate kind
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateStore<R> {
    records: BTreeMap<u64, R>,
}

impl<R> Default for AggregateStore<R> {
    fn default() -> Self {
        Self {
            records: BTreeMap::new(),
        }
    }
}

impl<R: Aggregate> AggregateStore<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// One past the largest ID, or 1 when the store is empty.
    ///
    /// Can be `u64::MAX` once `MAX_ID` is taken; `allocate_id` refuses that.
    pub fn next_id(&self) -> u64 {
        self.records
            .last_key_value()
            .map_or(1, |(max_id, _)| max_id.saturating_add(1))
    }

    /// The ID the next insert will use, if one is left
    pub fn allocate_id(&self) -> StoreResult<u64> {
        match self.next_id() {
            id if id <= MAX_ID => Ok(id),
            _ => Err(StoreError::IdsExhausted { kind: R::NAME }),
        }
    }

    /// Store `record` under the next free ID and return that ID.
    ///
    /// This is the in-memory primitive only; nothing is written to the log.
    pub fn insert(&mut self, record: R) -> StoreResult<u64> {
        let id = self.allocate_id()?;
        self.records.insert(id, record);
        Ok(id)
    }

    /// Replace the record stored under `id`
    pub fn update(&mut self, id: u64, record: R) -> StoreResult<()> {
        match self.records.get_mut(&id) {
            Some(existing) => {
                *existing = record;
                Ok(())
            }
            None => Err(Self::not_found(id)),
        }
    }

    pub fn get(&self, id: u64) -> StoreResult<&R> {
        self.records.get(&id).ok_or_else(|| Self::not_found(id))
    }

    /// All records, ordered by ID
    pub fn get_all(&self) -> &BTreeMap<u64, R> {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Insert or overwrite the record at `id`, as replay does
    pub fn load(&mut self, id: u64, record: R) -> Result<(), String> {
        if !(1..=MAX_ID).contains(&id) {
            return Err(format!("message contains invalid id {}", id));
        }
        self.records.insert(id, record);
        Ok(())
    }

    /// Encode `(id, record)` as this kind's event payload
    pub fn encode(id: u64, record: &R) -> StoreResult<Value> {
        to_data(&PayloadRef { id, fields: record }).map_err(|e| {
            StoreError::Encoding(format!("marshalling {} event data: {}", R::NAME, e))
        })
    }

    /// Decode an event payload and load it. Returns the ID it touched.
    pub(crate) fn apply(&mut self, data: &Value) -> Result<u64, String> {
        if data.is_null() {
            return Err("message must not be null".to_string());
        }
        let payload = Payload::<R>::deserialize(data).map_err(|e| e.to_string())?;
        self.load(payload.id, payload.fields)?;
        Ok(payload.id)
    }

    fn not_found(id: u64) -> StoreError {
        StoreError::NotFound { kind: R::NAME, id }
    }
}
