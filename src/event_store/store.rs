//! Log Store - the append-only JSON Lines event file
//!
//! The LogStore owns the only write handle to the event file. Every append
//! is a single write of one encoded line followed by `\n`; reads open the
//! file afresh so they never disturb the writer's position.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::types::Envelope;

use super::codec;
use super::payload::to_data;
use super::log::{EventLog, LogEntry};

/// What to do with a line that does not decode into an envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorruptionPolicy {
    /// Fail the whole read. A partial projection is never served.
    #[default]
    Abort,
    /// Log a warning and continue with the next line
    Skip,
}

impl FromStr for CorruptionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(CorruptionPolicy::Abort),
            "skip" => Ok(CorruptionPolicy::Skip),
            other => Err(format!("expected \"abort\" or \"skip\", got {:?}", other)),
        }
    }
}

/// Configuration for the LogStore
#[derive(Debug, Clone)]
pub struct LogStoreConfig {
    /// Path to the event file
    pub path: PathBuf,
    /// Whether to fsync after every append
    pub sync_writes: bool,
    /// Handling of undecodable lines during read-back
    pub on_corrupt_line: CorruptionPolicy,
}

impl Default for LogStoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("db.jsonl"),
            sync_writes: true,
            on_corrupt_line: CorruptionPolicy::Abort,
        }
    }
}

impl LogStoreConfig {
    /// Create config for the event file at `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    pub fn with_sync_writes(mut self, sync_writes: bool) -> Self {
        self.sync_writes = sync_writes;
        self
    }

    pub fn with_corruption_policy(mut self, policy: CorruptionPolicy) -> Self {
        self.on_corrupt_line = policy;
        self
    }
}

/// Durable, append-only store of event envelopes backed by one file
#[derive(Debug)]
pub struct LogStore {
    config: LogStoreConfig,
    file: File,
}

impl LogStore {
    /// Open the event file, creating it (and its parent directory) if absent.
    ///
    /// Existing content is never truncated.
    pub fn open(config: LogStoreConfig) -> StoreResult<Self> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.path)
            .map_err(|e| StoreError::io(&config.path, e))?;

        info!(path = %config.path.display(), "Opened event log");

        Ok(Self { config, file })
    }

    /// Open the event file at `path` with default settings
    pub fn open_path<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        Self::open(LogStoreConfig::new(path))
    }

    /// Path of the event file
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Append an event whose payload is any serializable value
    pub fn append<T: Serialize + ?Sized>(
        &mut self,
        name: &str,
        payload: &T,
    ) -> StoreResult<Envelope> {
        let data = to_data(payload).map_err(|e| {
            StoreError::Encoding(format!("payload for event {:?} is not JSON data: {}", name, e))
        })?;
        self.append_value(name, data)
    }

    /// Append an event whose payload is a raw JSON text
    pub fn append_raw(&mut self, name: &str, raw: &str) -> StoreResult<Envelope> {
        let data: Value = serde_json::from_str(raw).map_err(|e| {
            StoreError::Encoding(format!("invalid JSON encoding for event {:?}: {}", name, e))
        })?;
        self.append_value(name, data)
    }

    fn append_value(&mut self, name: &str, data: Value) -> StoreResult<Envelope> {
        if name.is_empty() {
            return Err(StoreError::Encoding(
                "event name must not be empty".to_string(),
            ));
        }

        let envelope = Envelope::new(name, data);
        let mut line = codec::encode_line(&envelope)?;
        line.push('\n');

        let offset = self
            .file
            .metadata()
            .map_err(|e| StoreError::io(&self.config.path, e))?
            .len();

        if let Err(e) = self.write_line(line.as_bytes()) {
            self.truncate_to(offset);
            return Err(StoreError::io(&self.config.path, e));
        }

        debug!(
            event = %envelope.name,
            timestamp = envelope.timestamp,
            "Wrote event to log"
        );

        Ok(envelope)
    }

    /// Drop whatever part of a failed line made it to disk, so the next
    /// append does not land behind a torn record.
    fn truncate_to(&mut self, offset: u64) {
        if let Err(e) = self.file.set_len(offset) {
            warn!(
                path = %self.config.path.display(),
                offset,
                error = %e,
                "Could not remove partially written event"
            );
        }
    }

    fn write_line(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.file.write_all(bytes)?;
        if self.config.sync_writes {
            self.file.sync_data()?;
        }
        Ok(())
    }

    /// Read every event from the start of the file, with line numbers
    pub fn read_entries(&self) -> StoreResult<Vec<LogEntry>> {
        let path = &self.config.path;
        let file = File::open(path).map_err(|e| StoreError::io(path, e))?;
        let reader = BufReader::new(file);

        let mut entries = Vec::new();
        let mut skipped = 0usize;

        for (index, line_result) in reader.split(b'\n').enumerate() {
            let line_no = index + 1;
            let line = line_result.map_err(|e| StoreError::io(path, e))?;
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            match codec::decode_line(&line) {
                Ok(envelope) => entries.push(LogEntry {
                    line: line_no,
                    envelope,
                }),
                Err(e) => match self.config.on_corrupt_line {
                    CorruptionPolicy::Abort => {
                        return Err(StoreError::Corruption {
                            line: line_no,
                            reason: e.to_string(),
                        });
                    }
                    CorruptionPolicy::Skip => {
                        warn!(line = line_no, error = %e, "Skipping undecodable event");
                        skipped += 1;
                    }
                },
            }
        }

        info!(
            path = %path.display(),
            events = entries.len(),
            skipped,
            "Retrieved all events from log"
        );

        Ok(entries)
    }

    /// Read every envelope from the start of the file
    pub fn read_all(&self) -> StoreResult<Vec<Envelope>> {
        EventLog::read_all(self)
    }
}

impl EventLog for LogStore {
    fn append(&mut self, name: &str, payload: Value) -> StoreResult<Envelope> {
        self.append_value(name, payload)
    }

    fn read_entries(&self) -> StoreResult<Vec<LogEntry>> {
        LogStore::read_entries(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn create_test_store() -> (LogStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = LogStore::open_path(temp_dir.path().join("db.jsonl")).unwrap();
        (store, temp_dir)
    }

    #[test]
    fn test_open_creates_missing_file_and_parent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("db.jsonl");

        let store = LogStore::open_path(&path).unwrap();

        assert!(path.exists());
        assert_eq!(store.path(), path.as_path());
        assert!(store.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_open_does_not_truncate() {
        let (mut store, temp_dir) = create_test_store();
        store.append("Case", &json!({"ID": 1})).unwrap();
        drop(store);

        let reopened = LogStore::open_path(temp_dir.path().join("db.jsonl")).unwrap();
        assert_eq!(reopened.read_all().unwrap().len(), 1);
    }

    #[test]
    fn test_open_fails_on_directory() {
        let temp_dir = TempDir::new().unwrap();
        let result = LogStore::open_path(temp_dir.path());
        assert!(matches!(result, Err(StoreError::Io { .. })));
    }

    #[test]
    fn test_append_and_read_in_order() {
        let (mut store, _temp_dir) = create_test_store();

        for i in 1..=5 {
            store.append("Case", &json!({"ID": i})).unwrap();
        }

        let envelopes = store.read_all().unwrap();
        assert_eq!(envelopes.len(), 5);
        for (i, envelope) in envelopes.iter().enumerate() {
            assert_eq!(envelope.name, "Case");
            assert_eq!(envelope.data["ID"], json!(i + 1));
        }
    }

    #[test]
    fn test_append_is_visible_to_fresh_reader() {
        let (mut store, temp_dir) = create_test_store();
        store.append("Case", &json!({"ID": 1})).unwrap();

        let content = fs::read_to_string(temp_dir.path().join("db.jsonl")).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.ends_with('\n'));
    }

    #[test]
    fn test_append_serializable_payload() {
        let (mut store, _temp_dir) = create_test_store();
        let mut payload = HashMap::new();
        payload.insert("ID", 3);

        let envelope = store.append("Case", &payload).unwrap();
        assert_eq!(envelope.data, json!({"ID": 3}));
    }

    #[test]
    fn test_append_rejects_non_json_payload() {
        let (mut store, temp_dir) = create_test_store();
        let mut payload = HashMap::new();
        payload.insert(vec![1u8], "map keys must be strings");

        let result = store.append("Case", &payload);
        assert!(matches!(result, Err(StoreError::Encoding(_))));

        let content = fs::read_to_string(temp_dir.path().join("db.jsonl")).unwrap();
        assert!(content.is_empty());
    }

    #[test]
    fn test_append_rejects_non_finite_floats() {
        let (mut store, temp_dir) = create_test_store();

        let result = store.append("Case", &vec![f64::NAN, 1.5]);
        assert!(matches!(result, Err(StoreError::Encoding(_))));
        let result = store.append("Case", &Some(f64::INFINITY));
        assert!(matches!(result, Err(StoreError::Encoding(_))));

        let content = fs::read_to_string(temp_dir.path().join("db.jsonl")).unwrap();
        assert!(content.is_empty());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_failed_write_returns_io_error() {
        let device = Path::new("/dev/full");
        if !device.exists() {
            return;
        }

        let mut store = LogStore::open_path(device).unwrap();
        let len_before = fs::metadata(device).unwrap().len();

        let result = store.append("Case", &json!({"ID": 1, "Fields": {}}));

        match result {
            Err(StoreError::Io { path, source }) => {
                assert_eq!(path, device);
                assert_eq!(source.raw_os_error(), Some(28)); // ENOSPC
            }
            other => panic!("expected IO error, got {:?}", other),
        }
        assert_eq!(fs::metadata(device).unwrap().len(), len_before);
    }

    #[test]
    fn test_torn_write_is_truncated() {
        let (mut store, temp_dir) = create_test_store();
        let path = temp_dir.path().join("db.jsonl");
        store.append("Case", &json!({"ID": 1})).unwrap();
        let offset = fs::metadata(&path).unwrap().len();

        store.file.write_all(br#"{"Event":{"Name":"Ca"#).unwrap();
        store.truncate_to(offset);
        assert_eq!(fs::metadata(&path).unwrap().len(), offset);

        store.append("Case", &json!({"ID": 2})).unwrap();
        let envelopes = store.read_all().unwrap();
        assert_eq!(envelopes.len(), 2);
        assert_eq!(envelopes[1].data, json!({"ID": 2}));
    }

    #[test]
    fn test_append_raw_validates_json() {
        let (mut store, _temp_dir) = create_test_store();

        let ok = store.append_raw("Case", r#"{"ID": 1, "Fields": {}}"#).unwrap();
        assert_eq!(ok.data["ID"], json!(1));

        let err = store.append_raw("Case", r#"{"ID": 1,"#).unwrap_err();
        assert!(matches!(err, StoreError::Encoding(_)));
        assert_eq!(store.read_all().unwrap().len(), 1);
    }

    #[test]
    fn test_append_rejects_empty_name() {
        let (mut store, _temp_dir) = create_test_store();
        let result = store.append("", &json!({}));
        assert!(matches!(result, Err(StoreError::Encoding(_))));
    }

    #[test]
    fn test_append_stamps_current_time() {
        let (mut store, _temp_dir) = create_test_store();
        let before = crate::utils::current_timestamp();
        store.append("Case", &json!({})).unwrap();

        let envelope = &store.read_all().unwrap()[0];
        assert!(envelope.timestamp >= before);
        assert!(envelope.timestamp <= crate::utils::current_timestamp());
    }

    #[test]
    fn test_read_aborts_on_corrupt_line() {
        let (mut store, temp_dir) = create_test_store();
        store.append("Case", &json!({"ID": 1})).unwrap();

        let mut file = OpenOptions::new()
            .append(true)
            .open(temp_dir.path().join("db.jsonl"))
            .unwrap();
        writeln!(file, "{{\"Event\": broken").unwrap();
        drop(file);
        store.append("Case", &json!({"ID": 2})).unwrap();

        match store.read_all() {
            Err(StoreError::Corruption { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected corruption error, got {:?}", other),
        }
    }

    #[test]
    fn test_read_skips_corrupt_line_when_configured() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("db.jsonl");
        fs::write(
            &path,
            "{\"Event\":{\"Name\":\"Case\",\"Data\":{\"ID\":1}},\"Timestamp\":1}\n\
             garbage\n\
             {\"Event\":{\"Name\":\"Case\",\"Data\":{\"ID\":2}},\"Timestamp\":2}\n",
        )
        .unwrap();

        let config = LogStoreConfig::new(&path).with_corruption_policy(CorruptionPolicy::Skip);
        let store = LogStore::open(config).unwrap();

        let entries = store.read_entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].line, 1);
        assert_eq!(entries[1].line, 3);
    }

    #[test]
    fn test_read_ignores_blank_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("db.jsonl");
        fs::write(
            &path,
            "\n{\"Event\":{\"Name\":\"Case\",\"Data\":{}},\"Timestamp\":1}\n   \n",
        )
        .unwrap();

        let store = LogStore::open_path(&path).unwrap();
        let entries = store.read_entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].line, 2);
    }

    #[test]
    fn test_invalid_utf8_is_corruption() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("db.jsonl");
        fs::write(&path, b"{\"Event\":{\"Name\":\"\xff\"},\"Timestamp\":1}\n").unwrap();

        let store = LogStore::open_path(&path).unwrap();
        assert!(matches!(
            store.read_all(),
            Err(StoreError::Corruption { line: 1, .. })
        ));
    }

    #[test]
    fn test_corruption_policy_from_str() {
        assert_eq!(
            "abort".parse::<CorruptionPolicy>(),
            Ok(CorruptionPolicy::Abort)
        );
        assert_eq!(
            " Skip ".parse::<CorruptionPolicy>(),
            Ok(CorruptionPolicy::Skip)
        );
        assert!("ignore".parse::<CorruptionPolicy>().is_err());
    }
}
