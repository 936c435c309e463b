//! Routing key resolution.
//!
//! Derives the destination tuple {name, category, host, fields} for one
//! record from its metadata block, falling back to static configuration,
//! with every component passed through placeholder expansion.

mod template;

pub use template::TemplateContext;

use crate::config::{Config, sanitize_kv_list};
use crate::domain::{Record, RoutingKey, RoutingMetadata};

#[derive(Debug, Clone)]
pub struct KeyResolver {
    source_name: Option<String>,
    source_category: Option<String>,
    source_host: Option<String>,
    source_name_key: String,
    custom_fields: Option<String>,
    delimiter: String,
}

impl KeyResolver {
    pub fn new(config: &Config) -> Self {
        Self {
            source_name: config.source_name.clone(),
            source_category: config.source_category.clone(),
            source_host: config.source_host.clone(),
            source_name_key: config.source_name_key.clone(),
            custom_fields: config
                .custom_fields
                .as_deref()
                .and_then(sanitize_kv_list),
            delimiter: config.delimiter.clone(),
        }
    }

    pub fn resolve(&self, metadata: &RoutingMetadata, tag: &str, record: &Record) -> RoutingKey {
        let ctx = TemplateContext::new(tag, &self.delimiter, record);

        let name = metadata
            .source
            .clone()
            .or_else(|| self.record_source_name(record))
            .or_else(|| self.source_name.clone())
            .unwrap_or_default();
        let category = metadata
            .category
            .clone()
            .or_else(|| self.source_category.clone())
            .unwrap_or_default();
        let host = metadata
            .host
            .clone()
            .or_else(|| self.source_host.clone())
            .unwrap_or_default();

        RoutingKey {
            name: ctx.expand(&name),
            category: ctx.expand(&category),
            host: ctx.expand(&host),
            fields: self.resolve_fields(metadata, &ctx),
        }
    }

    /// Metadata fields come first, static custom fields are appended.
    fn resolve_fields(&self, metadata: &RoutingMetadata, ctx: &TemplateContext<'_>) -> String {
        let record_fields = metadata
            .fields
            .as_deref()
            .map(|fields| ctx.expand(fields))
            .as_deref()
            .and_then(sanitize_kv_list);

        match (record_fields, &self.custom_fields) {
            (Some(record), Some(fixed)) => format!("{record},{fixed}"),
            (Some(record), None) => record,
            (None, Some(fixed)) => fixed.clone(),
            (None, None) => String::new(),
        }
    }

    fn record_source_name(&self, record: &Record) -> Option<String> {
        record
            .fields
            .get(&self.source_name_key)
            .and_then(serde_json::Value::as_str)
            .map(ToString::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn record(fields: Value) -> Record {
        let Value::Object(map) = fields else {
            panic!("test record must be an object");
        };
        Record::new(0, map)
    }

    fn resolver(config: Config) -> KeyResolver {
        KeyResolver::new(&config)
    }

    #[test]
    fn metadata_overrides_static_config() {
        let config = Config {
            source_category: Some("static-category".to_string()),
            source_name: Some("static-name".to_string()),
            ..Config::default()
        };
        let metadata = RoutingMetadata {
            source: Some("dynamic-name".to_string()),
            ..RoutingMetadata::default()
        };
        let rec = record(json!({}));
        let key = resolver(config).resolve(&metadata, "tag", &rec);
        assert_eq!(key.name, "dynamic-name");
        assert_eq!(key.category, "static-category");
        assert_eq!(key.host, "");
    }

    #[test]
    fn source_name_key_field_beats_static_name() {
        let config = Config {
            source_name: Some("static-name".to_string()),
            ..Config::default()
        };
        let rec = record(json!({"source_name": "from-record"}));
        let key = resolver(config).resolve(&RoutingMetadata::default(), "tag", &rec);
        assert_eq!(key.name, "from-record");
    }

    #[test]
    fn templates_expand_in_every_component() {
        let config = Config {
            source_category: Some("${tag_parts[0]}/${tag_parts[1]}".to_string()),
            source_host: Some("${record[host]}".to_string()),
            ..Config::default()
        };
        let rec = record(json!({"host": "web-1"}));
        let key = resolver(config).resolve(&RoutingMetadata::default(), "prod.api", &rec);
        assert_eq!(key.category, "prod/api");
        assert_eq!(key.host, "web-1");
    }

    #[test]
    fn metadata_fields_prepend_static_custom_fields() {
        let config = Config {
            custom_fields: Some("env=prod,malformed".to_string()),
            ..Config::default()
        };
        let metadata = RoutingMetadata {
            fields: Some("service=${tag}".to_string()),
            ..RoutingMetadata::default()
        };
        let rec = record(json!({}));
        let key = resolver(config).resolve(&metadata, "api", &rec);
        assert_eq!(key.fields, "service=api,env=prod");
    }

    #[test]
    fn blank_fields_components_are_absent() {
        let config = Config::default();
        let metadata = RoutingMetadata {
            fields: Some("  ".to_string()),
            ..RoutingMetadata::default()
        };
        let rec = record(json!({}));
        let key = resolver(config).resolve(&metadata, "tag", &rec);
        assert_eq!(key.fields, "");
    }
}
