use crate::config::{DataType, MetricFormat};
use crate::domain::record::{METADATA_KEY, Record};
use bytes::Bytes;
use serde_json::Value;

/// Per-record overrides read from the `_sumo_metadata` field.
///
/// Absent fields fall back to the process-wide configuration during key
/// resolution. The block itself is stripped before formatting.
#[derive(Debug, Clone, Default)]
pub struct RoutingMetadata {
    pub source: Option<String>,
    pub category: Option<String>,
    pub host: Option<String>,
    pub fields: Option<String>,
    pub log_format: Option<String>,
}

impl RoutingMetadata {
    /// Extracts the metadata block from a record, if any. Non-string values
    /// inside the block are ignored.
    pub fn extract(record: &Record) -> Self {
        let Some(Value::Object(meta)) = record.fields.get(METADATA_KEY) else {
            return Self::default();
        };

        let get = |key: &str| {
            meta.get(key)
                .and_then(Value::as_str)
                .map(ToString::to_string)
        };

        Self {
            source: get("source"),
            category: get("category"),
            host: get("host"),
            fields: get("fields"),
            log_format: get("log_format"),
        }
    }
}

/// Resolved routing destination for one record.
///
/// Records with equal keys are delivered together and in arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct RoutingKey {
    pub name: String,
    pub category: String,
    pub host: String,
    pub fields: String,
}

/// One HTTP request: a finished body plus the metadata needed for headers.
///
/// Created once per size-bounded sub-batch and re-sent verbatim on retry.
#[derive(Debug, Clone)]
pub struct DeliveryUnit {
    pub body: Bytes,
    pub key: RoutingKey,
    pub data_type: DataType,
    pub metric_format: MetricFormat,
    pub dimensions: Option<String>,
}
