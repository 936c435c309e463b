use crate::config::{Config, ConfigError};
use reqwest::{Client, ClientBuilder, Proxy};
use url::Url;

/// One HTTP connection to the ingestion endpoint.
///
/// The underlying client is not shared across flush invocations: each
/// invocation builds its own connection and drops it afterwards, so no
/// connection state can leak between concurrently flushing workers.
#[derive(Debug, Clone)]
pub struct HttpConnection {
    pub client: Client,
    pub endpoint: Url,
}

impl HttpConnection {
    pub fn build(config: &Config) -> Result<Self, ConfigError> {
        let endpoint = Url::parse(config.endpoint.trim()).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid endpoint URL '{}': {}", config.endpoint, e))
        })?;

        let mut builder = ClientBuilder::new()
            .timeout(config.send_timeout())
            .connect_timeout(config.open_timeout())
            .cookie_store(!config.disable_cookies);

        if !config.verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(proxy) = &config.proxy_uri {
            let proxy = Proxy::all(proxy.as_str()).map_err(|e| {
                ConfigError::InvalidUrl(format!("Invalid proxy URL '{proxy}': {e}"))
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().map_err(|e| {
            ConfigError::InvalidConfig(format!("Failed to build HTTP client: {e}"))
        })?;

        Ok(Self { client, endpoint })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_from_valid_config() {
        let config = Config {
            endpoint: "https://collectors.example.com/receiver/v1/http/abc".to_string(),
            ..Config::default()
        };
        let conn = HttpConnection::build(&config).unwrap();
        assert_eq!(conn.endpoint.host_str(), Some("collectors.example.com"));
    }

    #[test]
    fn surrounding_whitespace_in_endpoint_is_tolerated() {
        let config = Config {
            endpoint: " https://example.com/receiver ".to_string(),
            ..Config::default()
        };
        assert!(HttpConnection::build(&config).is_ok());
    }

    #[test]
    fn invalid_endpoint_fails_at_setup() {
        let config = Config {
            endpoint: "not a url".to_string(),
            ..Config::default()
        };
        assert!(HttpConnection::build(&config).is_err());
    }
}
