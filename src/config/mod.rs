mod validation;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("File error: {0}")]
    FileError(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Kind of payload delivered to the HTTP source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    #[default]
    Logs,
    Metrics,
}

/// How a log record is rendered into a wire line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Text,
    #[default]
    Json,
    JsonMerge,
    Fields,
}

impl LogFormat {
    /// Parses a per-record override value (`_sumo_metadata.log_format`).
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            "json_merge" => Some(Self::JsonMerge),
            "fields" => Some(Self::Fields),
            _ => None,
        }
    }
}

/// Content-Encoding applied to request bodies when `compress` is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressEncoding {
    #[default]
    Gzip,
    Deflate,
}

/// Exposition format of metric lines, selects the Content-Type header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricFormat {
    #[default]
    Graphite,
    Carbon2,
    Prometheus,
}

impl MetricFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Graphite => "application/vnd.sumologic.graphite",
            Self::Carbon2 => "application/vnd.sumologic.carbon2",
            Self::Prometheus => "application/vnd.sumologic.prometheus",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP source endpoint URL (required, validated at setup).
    pub endpoint: String,
    pub data_type: DataType,
    pub log_format: LogFormat,
    /// Record field holding the payload line.
    pub log_key: String,
    pub source_category: Option<String>,
    pub source_name: Option<String>,
    /// Record field consulted for the source name when metadata carries none.
    pub source_name_key: String,
    pub source_host: Option<String>,
    pub verify_ssl: bool,
    /// Character splitting the chunk tag into `tag_parts`.
    pub delimiter: String,
    pub open_timeout_secs: u64,
    pub send_timeout_secs: u64,
    pub add_timestamp: bool,
    pub timestamp_key: String,
    pub proxy_uri: Option<String>,
    pub disable_cookies: bool,
    /// Static `k=v,...` fields appended to every record's resolved fields.
    pub custom_fields: Option<String>,
    /// Static `k=v,...` dimensions sent with metrics.
    pub custom_dimensions: Option<String>,
    pub sumo_client: String,
    pub compress: bool,
    pub compress_encoding: CompressEncoding,
    pub metric_data_format: MetricFormat,
    /// Maximum request body size in bytes; 0 disables splitting.
    pub max_request_size: usize,
    pub use_internal_retry: bool,
    /// 0 means unlimited attempts.
    pub retry_max_times: u32,
    pub retry_min_interval_secs: u64,
    pub retry_max_interval_secs: u64,
    /// Wall-clock budget for one delivery; 0 means unlimited.
    pub retry_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            data_type: DataType::default(),
            log_format: LogFormat::default(),
            log_key: "message".to_string(),
            source_category: None,
            source_name: None,
            source_name_key: "source_name".to_string(),
            source_host: None,
            verify_ssl: true,
            delimiter: ".".to_string(),
            open_timeout_secs: 60,
            send_timeout_secs: 120,
            add_timestamp: true,
            timestamp_key: "timestamp".to_string(),
            proxy_uri: None,
            disable_cookies: false,
            custom_fields: None,
            custom_dimensions: None,
            sumo_client: "fluentd-output".to_string(),
            compress: false,
            compress_encoding: CompressEncoding::default(),
            metric_data_format: MetricFormat::default(),
            max_request_size: 0,
            use_internal_retry: false,
            retry_max_times: 0,
            retry_min_interval_secs: 1,
            retry_max_interval_secs: 300,
            retry_timeout_secs: 72 * 3600,
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn open_timeout(&self) -> Duration {
        Duration::from_secs(self.open_timeout_secs)
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_secs)
    }

    pub fn retry_min_interval(&self) -> Duration {
        Duration::from_secs(self.retry_min_interval_secs)
    }

    pub fn retry_max_interval(&self) -> Duration {
        Duration::from_secs(self.retry_max_interval_secs)
    }

    pub fn retry_timeout(&self) -> Duration {
        Duration::from_secs(self.retry_timeout_secs)
    }
}

pub use validation::sanitize_kv_list;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_plugin_surface() {
        let config = Config::default();
        assert_eq!(config.log_key, "message");
        assert_eq!(config.timestamp_key, "timestamp");
        assert_eq!(config.sumo_client, "fluentd-output");
        assert_eq!(config.data_type, DataType::Logs);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.metric_data_format, MetricFormat::Graphite);
        assert!(config.verify_ssl);
        assert!(config.add_timestamp);
        assert!(!config.compress);
        assert_eq!(config.max_request_size, 0);
        assert_eq!(config.retry_max_times, 0);
    }

    #[test]
    fn toml_round_trip_with_enums() {
        let toml_str = r#"
            endpoint = "https://collectors.example.com/receiver/v1/http/abc"
            data_type = "metrics"
            log_format = "json_merge"
            compress = true
            compress_encoding = "deflate"
            metric_data_format = "carbon2"
            max_request_size = 1048576
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.data_type, DataType::Metrics);
        assert_eq!(config.log_format, LogFormat::JsonMerge);
        assert_eq!(config.compress_encoding, CompressEncoding::Deflate);
        assert_eq!(config.metric_data_format, MetricFormat::Carbon2);
        assert_eq!(config.max_request_size, 1_048_576);
        // Unlisted keys keep their defaults
        assert_eq!(config.log_key, "message");
    }

    #[test]
    fn invalid_enum_value_is_a_parse_error() {
        let toml_str = r#"
            endpoint = "https://example.com"
            log_format = "xml"
        "#;
        assert!(toml::from_str::<Config>(toml_str).is_err());
    }

    #[test]
    fn per_record_format_override_parsing() {
        assert_eq!(LogFormat::parse("text"), Some(LogFormat::Text));
        assert_eq!(LogFormat::parse("json_merge"), Some(LogFormat::JsonMerge));
        assert_eq!(LogFormat::parse("yaml"), None);
    }
}
