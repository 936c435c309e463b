//! Record-to-line formatting.
//!
//! Converts one raw record into a wire-ready line according to the
//! configured (or per-record overridden) log format. Malformed JSON in the
//! merge and double-decode paths is recovered by keeping the raw string;
//! it never fails the record.

use crate::config::{Config, DataType, LogFormat};
use crate::domain::{METADATA_KEY, Record};
use serde_json::{Map, Value};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Formatter {
    data_type: DataType,
    log_key: String,
    add_timestamp: bool,
    timestamp_key: String,
}

impl Formatter {
    pub fn new(config: &Config) -> Self {
        Self {
            data_type: config.data_type,
            log_key: config.log_key.clone(),
            add_timestamp: config.add_timestamp,
            timestamp_key: config.timestamp_key.clone(),
        }
    }

    /// Formats one record. `None` drops the record from the batch (missing
    /// log key on the literal-line paths); the caller logs the warning.
    pub fn format(&self, record: &Record, log_format: LogFormat) -> Option<String> {
        // Metrics bypass structured formatting: the log-key value is the
        // exposition line (graphite/carbon2/prometheus text) as-is.
        if self.data_type == DataType::Metrics {
            return record
                .log_value(&self.log_key)
                .map(|value| chomp(&literal_line(value)).to_string());
        }

        match log_format {
            LogFormat::Text => record
                .log_value(&self.log_key)
                .map(|value| chomp(&literal_line(value)).to_string()),
            LogFormat::Json | LogFormat::Fields => Some(self.dump_json(record)),
            LogFormat::JsonMerge => Some(self.dump_json_merge(record)),
        }
    }

    /// `json` / `fields`: timestamp envelope plus all record fields, with a
    /// double-encoded log-key string decoded back into an object.
    fn dump_json(&self, record: &Record) -> String {
        let mut envelope = self.envelope(record);

        if let Some(Value::String(raw)) = envelope.get(&self.log_key) {
            match serde_json::from_str::<Value>(raw.trim()) {
                Ok(Value::Object(decoded)) => {
                    envelope.insert(self.log_key.clone(), Value::Object(decoded));
                }
                Ok(_) => {} // scalar or array payloads stay as the raw string
                Err(e) => debug!("Log key is not embedded JSON, keeping string: {e}"),
            }
        }

        serialize(&envelope)
    }

    /// `json_merge`: top-level keys of an embedded JSON object are merged
    /// under the record's own fields (record wins), then the log key is
    /// dropped. A string that does not parse leaves the record unchanged.
    fn dump_json_merge(&self, record: &Record) -> String {
        let mut envelope = self.envelope(record);

        if let Some(Value::String(raw)) = envelope.get(&self.log_key)
            && let Ok(Value::Object(decoded)) = serde_json::from_str::<Value>(raw.trim())
        {
            let mut merged = self.timestamp_envelope(record);
            merged.extend(decoded);
            for (key, value) in &envelope {
                if key != &self.log_key {
                    merged.insert(key.clone(), value.clone());
                }
            }
            envelope = merged;
        }

        serialize(&envelope)
    }

    /// Timestamp envelope plus the record's fields minus internal metadata.
    fn envelope(&self, record: &Record) -> Map<String, Value> {
        let mut envelope = self.timestamp_envelope(record);
        for (key, value) in &record.fields {
            if key == METADATA_KEY {
                continue;
            }
            if key == &self.log_key
                && let Value::String(s) = value
            {
                envelope.insert(key.clone(), Value::String(chomp(s).to_string()));
                continue;
            }
            envelope.insert(key.clone(), value.clone());
        }
        envelope
    }

    fn timestamp_envelope(&self, record: &Record) -> Map<String, Value> {
        let mut envelope = Map::new();
        if self.add_timestamp {
            envelope.insert(
                self.timestamp_key.clone(),
                Value::from(normalize_timestamp(record.time)),
            );
        }
        envelope
    }
}

/// Renders a value as a single literal line: strings pass through, anything
/// else is serialized as canonical ordered-field JSON.
fn literal_line(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

/// Strips at most one leading and one trailing newline.
fn chomp(line: &str) -> &str {
    let line = line.strip_prefix('\n').unwrap_or(line);
    line.strip_suffix('\n').unwrap_or(line)
}

/// Sub-13-digit epoch timestamps are seconds; scale them to milliseconds.
fn normalize_timestamp(time: i64) -> i64 {
    let digits = time.unsigned_abs().to_string().len();
    if digits < 13 { time * 1000 } else { time }
}

fn serialize(map: &Map<String, Value>) -> String {
    serde_json::to_string(map).unwrap_or_else(|_| "{}".to_string())
}
