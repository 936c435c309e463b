use crate::domain::Record;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]*)\}").unwrap());

static TAG_PART: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^tag_parts\[(-?\d+)\]$").unwrap());

static RECORD_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^record\[([^\[\]]+)\]$").unwrap());

/// Expansion context for one record: the chunk tag, its delimiter-split
/// segments, and the record's own fields.
pub struct TemplateContext<'a> {
    tag: &'a str,
    tag_parts: Vec<&'a str>,
    record: &'a Record,
}

impl<'a> TemplateContext<'a> {
    pub fn new(tag: &'a str, delimiter: &str, record: &'a Record) -> Self {
        Self {
            tag,
            tag_parts: tag.split(delimiter).collect(),
            record,
        }
    }

    /// Substitutes the whitelisted `${...}` placeholders: `tag`,
    /// `tag_parts[i]` (negative indices count from the end) and
    /// `record[key]` for scalar field values. Anything unresolvable keeps
    /// its literal placeholder text.
    pub fn expand(&self, template: &str) -> String {
        PLACEHOLDER
            .replace_all(template, |caps: &regex::Captures<'_>| {
                self.resolve(caps[1].trim())
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }

    fn resolve(&self, expr: &str) -> Option<String> {
        if expr == "tag" {
            return Some(self.tag.to_string());
        }

        if let Some(caps) = TAG_PART.captures(expr) {
            let index: i64 = caps[1].parse().ok()?;
            return self.tag_part(index).map(ToString::to_string);
        }

        if let Some(caps) = RECORD_FIELD.captures(expr) {
            return self.record.fields.get(&caps[1]).and_then(scalar_text);
        }

        None
    }

    fn tag_part(&self, index: i64) -> Option<&str> {
        let len = self.tag_parts.len() as i64;
        let resolved = if index < 0 { len + index } else { index };
        if (0..len).contains(&resolved) {
            Some(self.tag_parts[resolved as usize])
        } else {
            None
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
