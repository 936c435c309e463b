use crate::compress::Compressor;
use crate::config::{Config, DataType};
use crate::domain::DeliveryUnit;
use crate::sender::HttpConnection;
use reqwest::header::{CONTENT_ENCODING, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

// HeaderName stores names lowercased; the receiver treats them
// case-insensitively.
const HEADER_NAME: &str = "x-sumo-name";
const HEADER_CATEGORY: &str = "x-sumo-category";
const HEADER_HOST: &str = "x-sumo-host";
const HEADER_CLIENT: &str = "x-sumo-client";
const HEADER_FIELDS: &str = "x-sumo-fields";
const HEADER_DIMENSIONS: &str = "x-sumo-dimensions";

/// Keys in a 2xx response body that indicate the receiver flagged a problem
/// without rejecting the request.
const RESPONSE_WARNING_KEYS: [&str; 5] = ["id", "code", "status", "message", "errors"];

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Invalid header value for {0}")]
    InvalidHeader(String),
}

/// Issues one HTTP POST per delivery unit and interprets the response.
pub struct Publisher<'a> {
    connection: &'a HttpConnection,
    sumo_client: &'a str,
    content_encoding: Option<&'static str>,
}

impl<'a> Publisher<'a> {
    pub fn new(connection: &'a HttpConnection, config: &'a Config, compressor: &Compressor) -> Self {
        Self {
            connection,
            sumo_client: &config.sumo_client,
            content_encoding: compressor.content_encoding(),
        }
    }

    /// Builds the header map for one delivery unit. Invalid header values
    /// are data errors, not transient ones: callers resolve them once per
    /// unit, before any retry loop.
    pub fn headers(&self, unit: &DeliveryUnit) -> Result<HeaderMap, DeliveryError> {
        let mut headers = HeaderMap::new();

        insert(&mut headers, HEADER_CLIENT, self.sumo_client)?;
        insert_nonempty(&mut headers, HEADER_NAME, &unit.key.name)?;
        insert_nonempty(&mut headers, HEADER_CATEGORY, &unit.key.category)?;
        insert_nonempty(&mut headers, HEADER_HOST, &unit.key.host)?;
        insert_nonempty(&mut headers, HEADER_FIELDS, &unit.key.fields)?;

        if let Some(encoding) = self.content_encoding {
            headers.insert(CONTENT_ENCODING, HeaderValue::from_static(encoding));
        }

        if unit.data_type == DataType::Metrics {
            headers.insert(
                CONTENT_TYPE,
                HeaderValue::from_static(unit.metric_format.content_type()),
            );
            if let Some(dimensions) = &unit.dimensions {
                insert_nonempty(&mut headers, HEADER_DIMENSIONS, dimensions)?;
            }
        }

        Ok(headers)
    }

    pub async fn publish(
        &self,
        unit: &DeliveryUnit,
        headers: &HeaderMap,
    ) -> Result<(), DeliveryError> {
        debug!(
            category = %unit.key.category,
            bytes = unit.body.len(),
            "Posting delivery unit"
        );

        let response = self
            .connection
            .client
            .post(self.connection.endpoint.clone())
            .headers(headers.clone())
            .body(unit.body.clone())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(DeliveryError::Http {
                status: status.as_u16(),
                body,
            });
        }

        inspect_accepted_body(&body);
        Ok(())
    }
}

/// A 2xx body is usually empty; when the receiver returns JSON carrying any
/// known warning key the values are logged and the delivery still counts as
/// accepted.
fn inspect_accepted_body(body: &str) {
    if body.trim().is_empty() {
        return;
    }

    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => {
            let flagged: Vec<String> = RESPONSE_WARNING_KEYS
                .iter()
                .filter_map(|key| map.get(*key).map(|value| format!("{key}={value}")))
                .collect();
            if !flagged.is_empty() {
                warn!("There was an issue sending data: {}", flagged.join(", "));
            }
        }
        Ok(_) => {}
        Err(e) => warn!("Failed to decode response body: {e}"),
    }
}

fn insert(headers: &mut HeaderMap, name: &'static str, value: &str) -> Result<(), DeliveryError> {
    let value = HeaderValue::from_str(value)
        .map_err(|_| DeliveryError::InvalidHeader(name.to_string()))?;
    headers.insert(HeaderName::from_static(name), value);
    Ok(())
}

fn insert_nonempty(
    headers: &mut HeaderMap,
    name: &'static str,
    value: &str,
) -> Result<(), DeliveryError> {
    if value.is_empty() {
        return Ok(());
    }
    insert(headers, name, value)
}
