//! Line codec for the event log
//!
//! Each envelope is one JSON object on one line:
//!
//! ```text
//! {"Event":{"Name":"Case","Data":{"ID":1,"Fields":{"title":"X"}}},"Timestamp":1704067200}
//! ```
//!
//! The payload is embedded as nested JSON, never as an escaped string.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{StoreError, StoreResult};
use crate::types::Envelope;

#[derive(Serialize)]
struct LineRef<'a> {
    #[serde(rename = "Event")]
    event: EventRef<'a>,
    #[serde(rename = "Timestamp")]
    timestamp: i64,
}

#[derive(Serialize)]
struct EventRef<'a> {
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Data")]
    data: &'a Value,
}

#[derive(Deserialize)]
struct Line {
    #[serde(rename = "Event")]
    event: EventBody,
    #[serde(rename = "Timestamp")]
    timestamp: i64,
}

#[derive(Deserialize)]
struct EventBody {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Data", default)]
    data: Value,
}

/// Encode an envelope as a single line, without the trailing newline
pub fn encode_line(envelope: &Envelope) -> StoreResult<String> {
    let line = LineRef {
        event: EventRef {
            name: &envelope.name,
            data: &envelope.data,
        },
        timestamp: envelope.timestamp,
    };

    let encoded = serde_json::to_string(&line)
        .map_err(|e| StoreError::Encoding(format!("marshalling JSON line: {}", e)))?;

    if encoded.contains(['\n', '\r']) {
        return Err(StoreError::Encoding(format!(
            "encoded event {:?} spans more than one line",
            envelope.name
        )));
    }

    Ok(encoded)
}

/// Decode one line of the event log (without its terminator)
pub fn decode_line(line: impl AsRef<[u8]>) -> Result<Envelope, serde_json::Error> {
    let Line { event, timestamp } = serde_json::from_slice(line.as_ref())?;
    Ok(Envelope::with_timestamp(event.name, event.data, timestamp))
}
