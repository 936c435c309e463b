use crate::config::ConfigError;
use crate::sender::DeliveryError;
use thiserror::Error;

/// Top-level error type for the forwarder pipeline.
///
/// Formatting problems never appear here: malformed JSON in the merge and
/// double-decode paths is recovered locally by falling back to the raw
/// string. Delivery errors only surface when internal retry is disabled or
/// bypassed; with retry enabled, exhaustion drops the unit with a warning.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("Compression error: {0}")]
    Compress(#[from] std::io::Error),
}
