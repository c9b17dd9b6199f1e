//! Raw document loading
//!
//! Turns spec bytes into an untyped `serde_json::Value` tree. YAML input is
//! normalised to the JSON data model so that the validator and the engine
//! only ever see one representation.

use serde_json::{Map, Number, Value as JsonValue};
use serde_yaml::Value as YamlValue;

use crate::error::{AnalysisError, Result};

/// Serialization format of a spec document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecFormat {
    Json,
    Yaml,
}

impl SpecFormat {
    /// Format implied by a file name or URL path extension
    pub fn from_extension(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".json") {
            Some(Self::Json)
        } else if lower.ends_with(".yaml") || lower.ends_with(".yml") {
            Some(Self::Yaml)
        } else {
            None
        }
    }

    /// Determine the format from a name hint, falling back to content inspection
    pub fn detect(name_hint: &str, content: &str) -> Self {
        if let Some(format) = Self::from_extension(name_hint) {
            return format;
        }

        let trimmed = content.trim_start_matches('\u{feff}').trim_start();

        // YAML documents typically open with a version key or a document marker
        if trimmed.starts_with("openapi:")
            || trimmed.starts_with("swagger:")
            || trimmed.starts_with("---")
        {
            return Self::Yaml;
        }

        if trimmed.starts_with('{') {
            return Self::Json;
        }

        // Ambiguous content defaults to JSON
        Self::Json
    }
}

/// Parse raw bytes in the given format
pub fn load(bytes: &[u8], format: SpecFormat) -> Result<JsonValue> {
    let content = std::str::from_utf8(bytes).map_err(|e| {
        AnalysisError::ValidationFailure(format!("document is not valid UTF-8: {e}"))
    })?;
    load_str(content, format)
}

/// Parse document text in the given format
pub fn load_str(content: &str, format: SpecFormat) -> Result<JsonValue> {
    let content = content.trim_start_matches('\u{feff}');
    match format {
        SpecFormat::Json => serde_json::from_str(content).map_err(|e| {
            AnalysisError::ValidationFailure(format!("Failed to parse JSON: {e}"))
        }),
        SpecFormat::Yaml => {
            let value: YamlValue = serde_yaml::from_str(content).map_err(|e| {
                AnalysisError::ValidationFailure(format!("Failed to parse YAML: {e}"))
            })?;
            yaml_to_json(value)
        }
    }
}

fn yaml_to_json(value: YamlValue) -> Result<JsonValue> {
    Ok(match value {
        YamlValue::Null => JsonValue::Null,
        YamlValue::Bool(b) => JsonValue::Bool(b),
        YamlValue::Number(n) => yaml_number(&n)?,
        YamlValue::String(s) => JsonValue::String(s),
        YamlValue::Sequence(items) => JsonValue::Array(
            items
                .into_iter()
                .map(yaml_to_json)
                .collect::<Result<Vec<_>>>()?,
        ),
        YamlValue::Mapping(mapping) => {
            let mut object = Map::with_capacity(mapping.len());
            for (key, value) in mapping {
                object.insert(yaml_key(key)?, yaml_to_json(value)?);
            }
            JsonValue::Object(object)
        }
        YamlValue::Tagged(tagged) => yaml_to_json(tagged.value)?,
    })
}

fn yaml_number(n: &serde_yaml::Number) -> Result<JsonValue> {
    if let Some(i) = n.as_i64() {
        return Ok(JsonValue::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Ok(JsonValue::from(u));
    }
    n.as_f64()
        .and_then(Number::from_f64)
        .map(JsonValue::Number)
        .ok_or_else(|| {
            AnalysisError::ValidationFailure(format!("number {n} cannot be represented in JSON"))
        })
}

/// Unquoted status codes (`200:`) arrive as numbers; JSON keys must be strings
fn yaml_key(key: YamlValue) -> Result<String> {
    match key {
        YamlValue::String(s) => Ok(s),
        YamlValue::Number(n) => Ok(n.to_string()),
        YamlValue::Bool(b) => Ok(b.to_string()),
        YamlValue::Null => Ok("null".to_string()),
        YamlValue::Tagged(tagged) => yaml_key(tagged.value),
        other => Err(AnalysisError::ValidationFailure(format!(
            "unsupported mapping key: {other:?}"
        ))),
    }
}
