//! Typed view of the OpenAPI document parts the readiness engine reads
//!
//! Documents reach these types after their path items, responses and media
//! types are resolved; schemas may still be `$ref` objects. Maps are
//! `IndexMap`s to keep the order in which routes, methods and status codes
//! were written. Swagger 2.0 response and security fields are read too.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value as JsonValue;

/// HTTP method tokens recognised as operations inside a path item
pub const HTTP_METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// A resolved OpenAPI (or Swagger) document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenApiDocument {
    #[serde(default, deserialize_with = "null_as_default")]
    pub info: Info,

    #[serde(default, deserialize_with = "null_as_default")]
    pub paths: IndexMap<String, PathItem>,

    #[serde(default)]
    pub components: Option<Components>,

    /// Swagger 2.0 security schemes
    #[serde(
        default,
        rename = "securityDefinitions",
        deserialize_with = "null_as_default"
    )]
    pub security_definitions: IndexMap<String, JsonValue>,
}

/// The `info` block; both fields are optional so their absence can be reported
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Info {
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "scalar_as_string")]
    pub version: Option<String>,
}

/// Operations declared on a single route, keyed by lower-case method token
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(try_from = "Option<IndexMap<String, JsonValue>>")]
pub struct PathItem {
    pub operations: IndexMap<String, Operation>,
}

/// One HTTP-method handler on a route
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Operation {
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub responses: IndexMap<String, Response>,

    #[serde(default)]
    pub security: Option<Vec<IndexMap<String, Vec<String>>>>,
}

/// A response declared for one status code
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Response {
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: IndexMap<String, MediaType>,

    /// Swagger 2.0 body schema, declared on the response itself
    #[serde(default)]
    pub schema: Option<JsonValue>,

    /// Swagger 2.0 examples keyed by mime type
    #[serde(default)]
    pub examples: Option<JsonValue>,
}

/// Payload description for one media type
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaType {
    #[serde(default)]
    pub schema: Option<JsonValue>,

    #[serde(default)]
    pub example: Option<JsonValue>,

    #[serde(default)]
    pub examples: Option<JsonValue>,
}

/// The components section; only the security scheme names are scored
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Components {
    #[serde(
        default,
        rename = "securitySchemes",
        deserialize_with = "null_as_default"
    )]
    pub security_schemes: IndexMap<String, JsonValue>,
}

impl TryFrom<Option<IndexMap<String, JsonValue>>> for PathItem {
    type Error = serde_json::Error;

    fn try_from(entries: Option<IndexMap<String, JsonValue>>) -> Result<Self, Self::Error> {
        let mut operations = IndexMap::new();
        for (key, value) in entries.unwrap_or_default() {
            // Shared parameters, summaries, servers and extensions are not operations
            if HTTP_METHODS.contains(&key.as_str()) {
                operations.insert(key, serde_json::from_value(value)?);
            }
        }
        Ok(Self { operations })
    }
}

impl OpenApiDocument {
    /// Names of the security schemes declared at the document level
    pub fn security_scheme_names(&self) -> Vec<String> {
        self.components
            .iter()
            .flat_map(|c| c.security_schemes.keys())
            .chain(self.security_definitions.keys())
            .cloned()
            .collect()
    }

    /// Total number of (route, method) pairs
    pub fn operation_count(&self) -> usize {
        self.paths.values().map(|item| item.operations.len()).sum()
    }
}

impl Operation {
    /// True when the description is present and not just whitespace
    pub fn has_description(&self) -> bool {
        self.description
            .as_deref()
            .is_some_and(|d| !d.trim().is_empty())
    }

    /// True when any response carries a non-empty `example` or `examples`
    pub fn has_example(&self) -> bool {
        self.responses.values().any(Response::has_example)
    }

    /// True when any response carries a `schema`
    pub fn has_schema(&self) -> bool {
        self.responses.values().any(Response::has_schema)
    }
}

impl Response {
    pub fn has_example(&self) -> bool {
        self.examples.as_ref().is_some_and(|value| !is_empty_value(value))
            || self.content.values().any(MediaType::has_example)
    }

    pub fn has_schema(&self) -> bool {
        self.schema.is_some() || self.content.values().any(|media| media.schema.is_some())
    }
}

impl MediaType {
    pub fn has_example(&self) -> bool {
        [&self.example, &self.examples]
            .into_iter()
            .flatten()
            .any(|value| !is_empty_value(value))
    }
}

fn is_empty_value(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => true,
        JsonValue::String(s) => s.is_empty(),
        JsonValue::Array(items) => items.is_empty(),
        JsonValue::Object(map) => map.is_empty(),
        JsonValue::Bool(_) | JsonValue::Number(_) => false,
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// YAML authors often write `version: 1.0`; keep such scalars as text
fn scalar_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(match value {
        Some(JsonValue::String(s)) => Some(s),
        Some(JsonValue::Number(n)) => Some(n.to_string()),
        Some(JsonValue::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: JsonValue) -> OpenApiDocument {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn keeps_route_and_method_order() {
        let doc = parse(json!({
            "info": {"title": "T", "version": "1"},
            "paths": {
                "/zebra": {"post": {}, "get": {}},
                "/alpha": {"delete": {}}
            }
        }));

        let routes: Vec<&str> = doc.paths.keys().map(String::as_str).collect();
        assert_eq!(routes, vec!["/zebra", "/alpha"]);

        let methods: Vec<&str> = doc.paths["/zebra"]
            .operations
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(methods, vec!["post", "get"]);
    }

    #[test]
    fn ignores_non_method_keys() {
        let doc = parse(json!({
            "info": {"title": "T", "version": "1"},
            "paths": {
                "/items": {
                    "parameters": [{"name": "id", "in": "query"}],
                    "summary": "Items",
                    "x-internal": true,
                    "get": {"responses": {"200": {"description": "ok"}}}
                }
            }
        }));

        assert_eq!(doc.operation_count(), 1);
        assert!(doc.paths["/items"].operations.contains_key("get"));
    }

    #[test]
    fn tolerates_missing_and_null_sections() {
        let doc = parse(json!({"info": {"title": "T", "version": "1"}, "paths": null}));
        assert!(doc.paths.is_empty());
        assert!(doc.security_scheme_names().is_empty());

        let doc = parse(json!({"info": {"title": "T", "version": "1"}}));
        assert_eq!(doc.operation_count(), 0);
    }

    #[test]
    fn numeric_version_becomes_text() {
        let doc = parse(json!({"info": {"title": "T", "version": 1.5}}));
        assert_eq!(doc.info.version.as_deref(), Some("1.5"));
    }

    #[test]
    fn description_must_have_content() {
        let blank: Operation = serde_json::from_value(json!({"description": "   "})).unwrap();
        let filled: Operation = serde_json::from_value(json!({"description": " Lists pets "})).unwrap();
        let missing: Operation = serde_json::from_value(json!({})).unwrap();

        assert!(!blank.has_description());
        assert!(filled.has_description());
        assert!(!missing.has_description());
    }

    #[test]
    fn empty_examples_do_not_count() {
        let op: Operation = serde_json::from_value(json!({
            "responses": {
                "200": {"content": {"application/json": {"example": "", "examples": {}}}},
                "404": {"content": {"application/json": {"example": null}}}
            }
        }))
        .unwrap();
        assert!(!op.has_example());

        let op: Operation = serde_json::from_value(json!({
            "responses": {
                "200": {"content": {"application/json": {"example": 0}}}
            }
        }))
        .unwrap();
        assert!(op.has_example());
    }

    #[test]
    fn schema_detected_in_any_media_type() {
        let op: Operation = serde_json::from_value(json!({
            "responses": {
                "200": {"content": {"text/plain": {}}},
                "400": {"content": {"application/json": {"schema": {"type": "object"}}}}
            }
        }))
        .unwrap();
        assert!(op.has_schema());
        assert!(!op.has_example());
    }

    #[test]
    fn collects_security_scheme_names_in_order() {
        let doc = parse(json!({
            "info": {"title": "T", "version": "1"},
            "components": {
                "securitySchemes": {
                    "oauth": {"type": "oauth2"},
                    "apiKey": {"type": "apiKey", "in": "header", "name": "X-Key"}
                }
            }
        }));
        assert_eq!(doc.security_scheme_names(), vec!["oauth", "apiKey"]);
    }

    #[test]
    fn swagger_2_fields_are_scored() {
        let doc = parse(json!({
            "swagger": "2.0",
            "info": {"title": "Legacy", "version": "1"},
            "securityDefinitions": {"api_key": {"type": "apiKey", "name": "key", "in": "header"}},
            "paths": {
                "/users": {
                    "get": {
                        "responses": {
                            "200": {
                                "description": "ok",
                                "schema": {"type": "array"},
                                "examples": {"application/json": [{"id": 1}]}
                            },
                            "404": {"description": "missing", "examples": {}}
                        }
                    }
                }
            }
        }));

        assert_eq!(doc.security_scheme_names(), vec!["api_key".to_string()]);
        let op = &doc.paths["/users"].operations["get"];
        assert!(op.has_schema());
        assert!(op.has_example());
        assert!(!op.responses["404"].has_example());
    }
}
