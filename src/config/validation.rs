use super::{Config, ConfigError};
use url::Url;

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate endpoint URL
        Url::parse(self.endpoint.trim()).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid endpoint URL '{}': {}", self.endpoint, e))
        })?;

        // Validate proxy URL if configured
        if let Some(proxy) = &self.proxy_uri {
            Url::parse(proxy).map_err(|e| {
                ConfigError::InvalidUrl(format!("Invalid proxy URL '{proxy}': {e}"))
            })?;
        }

        if self.delimiter.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "Tag delimiter must not be empty".to_string(),
            ));
        }

        if self.send_timeout_secs == 0 || self.open_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "Timeouts must be greater than 0".to_string(),
            ));
        }

        if self.use_internal_retry && self.retry_min_interval_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "Retry minimum interval must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Normalizes a `k=v,k2=v2` list, dropping entries that do not split into
/// exactly two non-empty parts. Returns `None` when nothing valid remains.
pub fn sanitize_kv_list(raw: &str) -> Option<String> {
    let kept: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|entry| {
            let parts: Vec<&str> = entry.split('=').collect();
            parts.len() == 2 && parts.iter().all(|part| !part.is_empty())
        })
        .collect();

    if kept.is_empty() {
        None
    } else {
        Some(kept.join(","))
    }
}
