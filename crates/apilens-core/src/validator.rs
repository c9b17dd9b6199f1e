//! OpenAPI document validation and reference resolution
//!
//! Produces the fully resolved [`OpenApiDocument`] the readiness engine
//! expects. Internal `$ref`s are inlined, OpenAPI 3.0 documents are checked
//! against the `openapiv3` model, and the result is read into the typed model.

use std::path::Path;

use log::{debug, warn};
use openapiv3::OpenAPI;
use serde_json::{Map, Value as JsonValue};

use crate::error::{AnalysisError, Result};
use crate::loader::{self, SpecFormat};
use crate::model::{HTTP_METHODS, OpenApiDocument};

/// OpenAPI versions checked against the typed `openapiv3` model
const STRICT_OPENAPI_VERSION_PREFIX: &str = "3.0";

/// Expected OpenAPI major version
const EXPECTED_OPENAPI_VERSION_PREFIX: &str = "3.";

const SWAGGER_VERSION: &str = "2.0";

/// Bound on nested reference chains
const MAX_REF_DEPTH: usize = 64;

/// Version marker found at the document root
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecVersion {
    OpenApi(String),
    Swagger,
}

/// Load, resolve and validate raw bytes. `name_hint` is a file name or URL
/// used to pick the format before falling back to content inspection.
pub fn validate_bytes(bytes: &[u8], name_hint: &str) -> Result<OpenApiDocument> {
    let content = std::str::from_utf8(bytes).map_err(|e| {
        AnalysisError::ValidationFailure(format!("document is not valid UTF-8: {e}"))
    })?;
    let format = SpecFormat::detect(name_hint, content);
    debug!("validating '{name_hint}' as {format:?}");
    validate_str(content, format)
}

/// Read a spec file from disk and validate it
pub fn validate_file(path: &Path) -> Result<OpenApiDocument> {
    let bytes = std::fs::read(path).map_err(|e| {
        AnalysisError::ValidationFailure(format!("failed to read {}: {e}", path.display()))
    })?;
    validate_bytes(&bytes, &path.to_string_lossy())
}

/// Load, resolve and validate document text in a known format
pub fn validate_str(content: &str, format: SpecFormat) -> Result<OpenApiDocument> {
    validate_value(loader::load_str(content, format)?)
}

/// Resolve and validate an already parsed document tree
pub fn validate_value(raw: JsonValue) -> Result<OpenApiDocument> {
    let version = spec_version(&raw)?;
    let resolved = dereference(raw)?;

    if let SpecVersion::OpenApi(v) = &version
        && v.starts_with(STRICT_OPENAPI_VERSION_PREFIX)
    {
        check_openapi_v3(&resolved)?;
    }

    serde_json::from_value(resolved).map_err(|e| {
        AnalysisError::ValidationFailure(format!("document does not match the OpenAPI structure: {e}"))
    })
}

/// Read the `openapi` / `swagger` version marker
pub fn spec_version(raw: &JsonValue) -> Result<SpecVersion> {
    let root = raw.as_object().ok_or_else(|| {
        AnalysisError::ValidationFailure("document root must be an object".to_string())
    })?;

    if let Some(version) = root.get("openapi") {
        let version = version_text(version).ok_or_else(|| {
            AnalysisError::ValidationFailure("`openapi` must be a version string".to_string())
        })?;
        if !version.starts_with(EXPECTED_OPENAPI_VERSION_PREFIX) {
            return Err(AnalysisError::ValidationFailure(format!(
                "unsupported OpenAPI version {version}; version {EXPECTED_OPENAPI_VERSION_PREFIX}x is expected"
            )));
        }
        return Ok(SpecVersion::OpenApi(version));
    }

    if let Some(version) = root.get("swagger") {
        return match version_text(version) {
            Some(v) if v == SWAGGER_VERSION => Ok(SpecVersion::Swagger),
            _ => Err(AnalysisError::ValidationFailure(format!(
                "unsupported Swagger version; only {SWAGGER_VERSION} is recognised"
            ))),
        };
    }

    Err(AnalysisError::ValidationFailure(
        "not an OpenAPI document: no `openapi` or `swagger` version field".to_string(),
    ))
}

fn version_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn check_openapi_v3(resolved: &JsonValue) -> Result<()> {
    let mut candidate = resolved.clone();
    if let Some(root) = candidate.as_object_mut() {
        // A document without paths is structurally fine for our purposes
        root.entry("paths")
            .or_insert_with(|| JsonValue::Object(Map::new()));
    }

    serde_json::from_value::<OpenAPI>(candidate)
        .map(|_| ())
        .map_err(|e| AnalysisError::ValidationFailure(format!("OpenAPI 3.0 validation failed: {e}")))
}

/// Resolve the internal `$ref`s the readiness engine reads through.
///
/// Every reference in the document must point inside it. Path items,
/// operations, responses and media types are inlined; schema and example
/// subtrees keep their `$ref` objects, so the result grows at most linearly
/// with the number of operations. Circular chains keep their `$ref` object.
pub fn dereference(document: JsonValue) -> Result<JsonValue> {
    let resolver = RefResolver { root: &document };
    resolver.check_all(&document)?;

    let mut resolved = document.clone();
    if let Some(paths) = resolved.get_mut("paths").and_then(JsonValue::as_object_mut) {
        for item in paths.values_mut() {
            resolver.inline(item)?;
            let Some(item) = item.as_object_mut() else {
                continue;
            };
            for (method, operation) in item.iter_mut() {
                if !HTTP_METHODS.contains(&method.as_str()) {
                    continue;
                }
                resolver.inline(operation)?;
                resolver.inline_responses(operation)?;
            }
        }
    }

    Ok(resolved)
}

struct RefResolver<'a> {
    root: &'a JsonValue,
}

impl<'a> RefResolver<'a> {
    /// Fail on the first reference that leaves the document or dangles
    fn check_all(&self, node: &JsonValue) -> Result<()> {
        match node {
            JsonValue::Object(map) => {
                if let Some(JsonValue::String(reference)) = map.get("$ref") {
                    self.target(reference)?;
                }
                map.values().try_for_each(|value| self.check_all(value))
            }
            JsonValue::Array(items) => items.iter().try_for_each(|item| self.check_all(item)),
            _ => Ok(()),
        }
    }

    fn inline_responses(&self, operation: &mut JsonValue) -> Result<()> {
        let Some(responses) = operation
            .get_mut("responses")
            .and_then(JsonValue::as_object_mut)
        else {
            return Ok(());
        };

        for response in responses.values_mut() {
            self.inline(response)?;
            let Some(content) = response
                .get_mut("content")
                .and_then(JsonValue::as_object_mut)
            else {
                continue;
            };
            for media in content.values_mut() {
                self.inline(media)?;
            }
        }
        Ok(())
    }

    /// Replace a `$ref` object with the end of its reference chain
    fn inline(&self, slot: &mut JsonValue) -> Result<()> {
        let Some(mut reference) = reference_of(slot).map(str::to_string) else {
            return Ok(());
        };

        let mut chain: Vec<String> = Vec::new();
        loop {
            if chain.contains(&reference) {
                debug!("keeping circular reference {reference}");
                return Ok(());
            }
            if chain.len() >= MAX_REF_DEPTH {
                warn!("reference chain deeper than {MAX_REF_DEPTH}; keeping {reference}");
                return Ok(());
            }

            let target = self.target(&reference)?;
            match reference_of(target) {
                Some(next) => {
                    chain.push(reference);
                    reference = next.to_string();
                }
                None => {
                    *slot = target.clone();
                    return Ok(());
                }
            }
        }
    }

    fn target(&self, reference: &str) -> Result<&'a JsonValue> {
        let Some(pointer) = reference.strip_prefix('#') else {
            return Err(AnalysisError::ValidationFailure(format!(
                "external reference '{reference}' cannot be resolved"
            )));
        };

        self.root.pointer(pointer).ok_or_else(|| {
            AnalysisError::ValidationFailure(format!(
                "reference '{reference}' does not point into the document"
            ))
        })
    }
}

fn reference_of(value: &JsonValue) -> Option<&str> {
    value.as_object()?.get("$ref")?.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn petstore() -> JsonValue {
        json!({
            "openapi": "3.0.3",
            "info": {"title": "Petstore", "version": "1.0.0"},
            "paths": {
                "/pets": {
                    "get": {
                        "description": "List pets",
                        "responses": {
                            "200": {"$ref": "#/components/responses/PetList"}
                        }
                    }
                }
            },
            "components": {
                "responses": {
                    "PetList": {
                        "description": "A list of pets",
                        "content": {
                            "application/json": {
                                "schema": {"$ref": "#/components/schemas/Pets"}
                            }
                        }
                    }
                },
                "schemas": {
                    "Pets": {"type": "array", "items": {"$ref": "#/components/schemas/Pet"}},
                    "Pet": {"type": "object", "properties": {"name": {"type": "string"}}}
                }
            }
        })
    }

    #[test]
    fn test_response_refs_are_inlined() {
        let resolved = dereference(petstore()).unwrap();
        let response = &resolved["paths"]["/pets"]["get"]["responses"]["200"];

        assert_eq!(response["description"], "A list of pets");
        // Schemas stay referenced; the engine only checks presence
        assert_eq!(
            response["content"]["application/json"]["schema"]["$ref"],
            "#/components/schemas/Pets"
        );
    }

    #[test]
    fn test_validated_document_sees_referenced_schema() {
        let document = validate_value(petstore()).unwrap();
        let operation = &document.paths["/pets"].operations["get"];
        assert!(operation.has_schema());
        assert!(operation.has_description());
    }

    #[test]
    fn test_reference_chains_are_followed() {
        let value = json!({
            "paths": {"/a": {"get": {"responses": {"200": {"$ref": "#/components/responses/Alias"}}}}},
            "components": {
                "responses": {
                    "Alias": {"$ref": "#/components/responses/Ok"},
                    "Ok": {"description": "fine", "content": {"text/plain": {"example": "hi"}}}
                }
            }
        });

        let resolved = dereference(value).unwrap();
        let response = &resolved["paths"]["/a"]["get"]["responses"]["200"];
        assert_eq!(response["content"]["text/plain"]["example"], "hi");
    }

    #[test]
    fn test_circular_refs_are_kept() {
        let value = json!({
            "paths": {"/loop": {"get": {"responses": {"200": {"$ref": "#/components/responses/A"}}}}},
            "components": {
                "responses": {
                    "A": {"$ref": "#/components/responses/B"},
                    "B": {"$ref": "#/components/responses/A"}
                }
            }
        });

        let resolved = dereference(value).unwrap();
        assert_eq!(
            resolved["paths"]["/loop"]["get"]["responses"]["200"]["$ref"],
            "#/components/responses/A"
        );
    }

    #[test]
    fn test_dangling_and_external_refs_fail() {
        let dangling = json!({"a": {"$ref": "#/components/schemas/Missing"}});
        assert!(matches!(
            dereference(dangling),
            Err(AnalysisError::ValidationFailure(m)) if m.contains("does not point")
        ));

        // Nested deep inside a schema that is never inlined
        let external = json!({
            "components": {"schemas": {"Pet": {"properties": {"tag": {"$ref": "common.yaml#/Tag"}}}}}
        });
        assert!(matches!(
            dereference(external),
            Err(AnalysisError::ValidationFailure(m)) if m.contains("external")
        ));
    }

    #[test]
    fn test_escaped_pointer_segments() {
        let value = json!({
            "paths": {
                "/pets/{id}": {"get": {"description": "one pet"}},
                "/pet": {"get": {"$ref": "#/paths/~1pets~1{id}/get"}}
            }
        });
        let resolved = dereference(value).unwrap();
        assert_eq!(resolved["paths"]["/pet"]["get"]["description"], "one pet");
    }

    #[test]
    fn test_doubly_shared_schemas_do_not_expand() {
        let levels = 40;
        let mut schemas = Map::new();
        schemas.insert("S0".to_string(), json!({"type": "string"}));
        for i in 1..=levels {
            let previous = format!("#/components/schemas/S{}", i - 1);
            schemas.insert(
                format!("S{i}"),
                json!({
                    "type": "object",
                    "properties": {"left": {"$ref": previous.clone()}, "right": {"$ref": previous}}
                }),
            );
        }
        let document = json!({
            "openapi": "3.0.0",
            "info": {"title": "Shared", "version": "1"},
            "paths": {
                "/tree": {
                    "get": {
                        "responses": {
                            "200": {
                                "description": "ok",
                                "content": {
                                    "application/json": {
                                        "schema": {"$ref": format!("#/components/schemas/S{levels}")}
                                    }
                                }
                            }
                        }
                    }
                }
            },
            "components": {"schemas": schemas}
        });

        let input_size = serde_json::to_string(&document).unwrap().len();
        let resolved = dereference(document.clone()).unwrap();
        let resolved_size = serde_json::to_string(&resolved).unwrap().len();
        assert!(resolved_size <= input_size * 2, "{resolved_size} vs {input_size}");

        let report = crate::analyze(&validate_value(document).unwrap()).unwrap();
        assert_eq!(report.insights.schema_coverage, "100.0%");
    }

    #[test]
    fn test_version_markers() {
        assert_eq!(
            spec_version(&json!({"openapi": "3.1.0"})).unwrap(),
            SpecVersion::OpenApi("3.1.0".to_string())
        );
        assert_eq!(spec_version(&json!({"swagger": "2.0"})).unwrap(), SpecVersion::Swagger);
        assert!(spec_version(&json!({"openapi": "4.0.0"})).is_err());
        assert!(spec_version(&json!({"info": {}})).is_err());
        assert!(spec_version(&json!(["not", "an", "object"])).is_err());
    }

    #[test]
    fn test_openapi_30_structure_is_checked() {
        // `info` must be an object in OpenAPI 3.0
        let invalid = json!({"openapi": "3.0.0", "info": "nope", "paths": {}});
        assert!(matches!(
            validate_value(invalid),
            Err(AnalysisError::ValidationFailure(m)) if m.contains("OpenAPI 3.0")
        ));
    }

    #[test]
    fn test_missing_paths_is_tolerated() {
        let document = validate_value(json!({
            "openapi": "3.0.0",
            "info": {"title": "No paths", "version": "1"}
        }))
        .unwrap();
        assert!(document.paths.is_empty());
    }

    #[test]
    fn test_yaml_bytes_with_numeric_codes() {
        let yaml = b"openapi: 3.0.1
info:
  title: Ping
  version: 1.0.0
paths:
  /ping:
    get:
      responses:
        200:
          description: pong
";
        let document = validate_bytes(yaml, "ping.yaml").unwrap();
        let codes: Vec<&String> = document.paths["/ping"].operations["get"]
            .responses
            .keys()
            .collect();
        assert_eq!(codes, vec!["200"]);
    }
}
