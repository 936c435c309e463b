//! Flush orchestration.
//!
//! One `write` call processes one buffer chunk end to end: format and
//! key-resolve every record, group and size-split per routing key, then
//! compress and publish each sub-batch behind the retry policy. Processing
//! is strictly sequential within an invocation; concurrency, if any, comes
//! from the external scheduler running one invocation per worker.

use crate::batch::Batcher;
use crate::compress::Compressor;
use crate::config::{Config, ConfigError, LogFormat, sanitize_kv_list};
use crate::domain::{Chunk, DeliveryUnit, Record, RoutingMetadata, SinkError};
use crate::format::Formatter;
use crate::reliability::{DeliveryOutcome, RetryConfig, RetryPolicy};
use crate::route::KeyResolver;
use crate::sender::{HttpConnection, Publisher};
use bytes::Bytes;
use tracing::{info, warn};

/// Host-driven plugin lifecycle. The orchestrator invoking these methods
/// (buffer scheduler, process supervisor) is an external collaborator.
#[allow(async_fn_in_trait)] // invocations run on the owning worker, no Send bound needed
pub trait Sink {
    fn start(&mut self) {}

    /// Delivers one flush-ready chunk. An error means the chunk should be
    /// redelivered by the caller's own buffering machinery.
    async fn write(&self, chunk: &Chunk) -> Result<(), SinkError>;

    fn shutdown(&mut self) {}
}

pub struct SumoSink {
    formatter: Formatter,
    resolver: KeyResolver,
    compressor: Compressor,
    retry: RetryPolicy,
    dimensions: Option<String>,
    config: Config,
}

impl SumoSink {
    /// Validates the configuration and wires the pipeline components.
    /// All enum and URL validation happens here, never per record.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            formatter: Formatter::new(&config),
            resolver: KeyResolver::new(&config),
            compressor: Compressor::new(&config),
            retry: RetryPolicy::new(RetryConfig::from(&config)),
            dimensions: config
                .custom_dimensions
                .as_deref()
                .and_then(sanitize_kv_list),
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn record_format(&self, metadata: &RoutingMetadata) -> LogFormat {
        match metadata.log_format.as_deref() {
            None => self.config.log_format,
            Some(raw) => LogFormat::parse(raw).unwrap_or_else(|| {
                warn!("Unknown per-record log_format '{raw}', using configured format");
                self.config.log_format
            }),
        }
    }
}

impl Sink for SumoSink {
    fn start(&mut self) {
        info!(endpoint = %self.config.endpoint, "Starting sumo forwarder sink");
    }

    async fn write(&self, chunk: &Chunk) -> Result<(), SinkError> {
        if chunk.is_empty() {
            return Ok(());
        }

        // The upstream client is not safe to reuse across invocations, so
        // every flush gets its own connection.
        let connection = HttpConnection::build(&self.config)?;
        let publisher = Publisher::new(&connection, &self.config, &self.compressor);

        let mut batcher = Batcher::new();
        for record in &chunk.records {
            let metadata = RoutingMetadata::extract(record);
            let key = self.resolver.resolve(&metadata, &chunk.tag, record);
            match self.formatter.format(record, self.record_format(&metadata)) {
                Some(line) => batcher.append(key, line),
                None => warn!(
                    tag = %chunk.tag,
                    "Record has no '{}' field, dropping it from the batch",
                    self.config.log_key
                ),
            }
        }

        for (key, sub_batches) in batcher.drain(self.config.max_request_size) {
            for lines in sub_batches {
                let line_count = lines.len();
                let body = self.compressor.compress(Bytes::from(lines.join("\n")))?;
                let unit = DeliveryUnit {
                    body,
                    key: key.clone(),
                    data_type: self.config.data_type,
                    metric_format: self.config.metric_data_format,
                    dimensions: self.dimensions.clone(),
                };

                // Headers are resolved once per unit: an invalid value is a
                // data error no retry can fix, so it surfaces immediately
                // instead of burning the backoff budget.
                let headers = publisher.headers(&unit)?;

                match self.retry.run(|| publisher.publish(&unit, &headers)).await? {
                    DeliveryOutcome::Delivered { attempts } => info!(
                        category = %key.category,
                        lines = line_count,
                        bytes = unit.body.len(),
                        attempts,
                        "Delivered batch"
                    ),
                    // Exhaustion already logged its warning; the unit is gone.
                    DeliveryOutcome::Dropped { .. } => {}
                }
            }
        }

        Ok(())
    }

    fn shutdown(&mut self) {
        info!("Shutting down sumo forwarder sink");
    }
}

/// Convenience used by the CLI driver and tests to build a chunk from
/// already-decoded JSON objects.
pub fn chunk_from_values(
    tag: &str,
    time: i64,
    values: Vec<serde_json::Value>,
) -> Chunk {
    let records = values
        .into_iter()
        .filter_map(|value| match value {
            serde_json::Value::Object(fields) => Some(Record::new(time, fields)),
            other => {
                warn!("Skipping non-object record: {other}");
                None
            }
        })
        .collect();
    Chunk::new(tag, records)
}
