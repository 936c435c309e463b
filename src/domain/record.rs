use serde_json::{Map, Value};

/// Record field carrying per-record routing metadata. Never forwarded.
pub const METADATA_KEY: &str = "_sumo_metadata";

/// One structured event read from a buffer chunk.
///
/// `time` is the event time in epoch seconds or milliseconds; the formatter
/// normalizes it to milliseconds on the wire. The field map is treated as
/// immutable: every transformation builds a new map.
#[derive(Debug, Clone)]
pub struct Record {
    pub time: i64,
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new(time: i64, fields: Map<String, Value>) -> Self {
        Self { time, fields }
    }

    /// The configured log-key value, if present.
    pub fn log_value<'a>(&'a self, log_key: &str) -> Option<&'a Value> {
        self.fields.get(log_key)
    }
}

/// One flush-ready chunk handed in by the external buffering layer.
///
/// The pipeline makes no assumption about how the chunk was assembled; it
/// only relies on record order within the chunk.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub tag: String,
    pub records: Vec<Record>,
}

impl Chunk {
    pub fn new(tag: impl Into<String>, records: Vec<Record>) -> Self {
        Self {
            tag: tag.into(),
            records,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
