//! Specification loading: RAML file to [`SpecNode`] tree.
//!
//! [`SpecLoader`] is the seam the generator talks to. [`RamlLoader`] is the
//! built-in implementation for RAML 0.8/1.0 documents. It understands the
//! subset the walker consumes: resources, methods, responses and bodies,
//! base URI metadata, `!include` and named schemas/types. Resource types,
//! traits and overlays are not expanded.

use crate::spec::{BodyNode, MethodNode, ResponseNode, SpecNode, UriParameter};
use crate::types::LoadError;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use serde_yaml::{Mapping, Value as Yaml};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

/// File extension of specification files picked up from a directory.
pub const SPEC_EXTENSION: &str = ".raml";

const HEADER_PREFIX: &str = "#%RAML";
const MAX_INCLUDE_DEPTH: usize = 16;
const MAX_TYPE_DEPTH: usize = 16;
const DEFAULT_MEDIA_TYPE: &str = "application/json";
const HTTP_VERBS: [&str; 9] = [
    "get", "post", "put", "patch", "delete", "options", "head", "trace", "connect",
];

static URI_TOKEN_REGEX: OnceLock<Regex> = OnceLock::new();

fn uri_token_regex() -> &'static Regex {
    URI_TOKEN_REGEX.get_or_init(|| Regex::new(r"\{([^{}/]+)\}").unwrap())
}

/// Options forwarded to the loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParserOptions {
    /// Replace schema/type names in bodies with the named definition.
    #[serde(default = "default_dereference_schemas", alias = "dereference_schemas")]
    pub dereference_schemas: bool,
}

fn default_dereference_schemas() -> bool {
    true
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            dereference_schemas: default_dereference_schemas(),
        }
    }
}

#[async_trait]
pub trait SpecLoader: Send + Sync {
    /// Load and parse one specification file.
    async fn load(&self, path: &Path, options: &ParserOptions) -> Result<SpecNode, LoadError>;
}

#[derive(Debug, Clone, Default)]
pub struct RamlLoader;

impl RamlLoader {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SpecLoader for RamlLoader {
    async fn load(&self, path: &Path, options: &ParserOptions) -> Result<SpecNode, LoadError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| LoadError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        // Include resolution reads further files synchronously.
        let file = path.to_path_buf();
        let options = options.clone();
        let parsed = tokio::task::spawn_blocking(move || parse_raml(&text, &file, &options)).await;
        match parsed {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => Err(LoadError::InvalidDocument {
                path: path.to_path_buf(),
                reason: format!("parser task failed: {e}"),
            }),
        }
    }
}

/// Parse RAML text. `path` anchors relative `!include`s and error messages.
pub fn parse_raml(text: &str, path: &Path, options: &ParserOptions) -> Result<SpecNode, LoadError> {
    let has_header = text
        .trim_start_matches('\u{feff}')
        .lines()
        .next()
        .is_some_and(|line| line.trim_start().starts_with(HEADER_PREFIX));
    if !has_header {
        return Err(LoadError::MissingHeader {
            path: path.to_path_buf(),
        });
    }

    let document: Yaml = serde_yaml::from_str(text).map_err(|source| LoadError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;
    let document = resolve_includes(document, path, 0)?;

    let Yaml::Mapping(root) = document else {
        return Err(LoadError::InvalidDocument {
            path: path.to_path_buf(),
            reason: "document root must be a mapping".to_string(),
        });
    };

    let builder = TreeBuilder {
        schemas: named_schemas(&root),
        options,
        default_media_type: default_media_type(&root),
    };
    let node = builder.build_node(None, &root);
    debug!(
        "Loaded {} with {} top-level resource(s)",
        path.display(),
        node.resources.as_ref().map_or(0, Vec::len)
    );
    Ok(node)
}

/// Replace every `!include <file>` with the included content. YAML/RAML files
/// are parsed (and their own includes resolved); anything else is inlined as text.
fn resolve_includes(value: Yaml, including_file: &Path, depth: usize) -> Result<Yaml, LoadError> {
    match value {
        Yaml::Tagged(tagged) if tagged.tag == "include" => {
            let Some(target) = tagged.value.as_str() else {
                return Err(LoadError::InvalidDocument {
                    path: including_file.to_path_buf(),
                    reason: "!include expects a file path".to_string(),
                });
            };
            if depth >= MAX_INCLUDE_DEPTH {
                return Err(LoadError::InvalidDocument {
                    path: including_file.to_path_buf(),
                    reason: format!("includes nested deeper than {MAX_INCLUDE_DEPTH} levels"),
                });
            }
            let target = include_path(including_file, target.trim());
            load_include(&target, depth + 1).map_err(|source| LoadError::Include {
                path: target,
                source: Box::new(source),
            })
        }
        Yaml::Tagged(tagged) => resolve_includes(tagged.value, including_file, depth),
        Yaml::Mapping(mapping) => {
            let mut resolved = Mapping::with_capacity(mapping.len());
            for (key, value) in mapping {
                resolved.insert(key, resolve_includes(value, including_file, depth)?);
            }
            Ok(Yaml::Mapping(resolved))
        }
        Yaml::Sequence(items) => items
            .into_iter()
            .map(|item| resolve_includes(item, including_file, depth))
            .collect::<Result<Vec<_>, _>>()
            .map(Yaml::Sequence),
        other => Ok(other),
    }
}

fn include_path(including_file: &Path, target: &str) -> PathBuf {
    including_file
        .parent()
        .map(|dir| dir.join(target))
        .unwrap_or_else(|| PathBuf::from(target))
}

fn load_include(target: &Path, depth: usize) -> Result<Yaml, LoadError> {
    let text = std::fs::read_to_string(target).map_err(|source| LoadError::Io {
        path: target.to_path_buf(),
        source,
    })?;

    let is_yaml = target
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| matches!(ext, "raml" | "yaml" | "yml"));
    if !is_yaml {
        return Ok(Yaml::String(text));
    }

    let value: Yaml = serde_yaml::from_str(&text).map_err(|source| LoadError::Yaml {
        path: target.to_path_buf(),
        source,
    })?;
    resolve_includes(value, target, depth)
}

/// Named schemas from `schemas` (0.8 list or map form) and `types` (1.0).
fn named_schemas(root: &Mapping) -> HashMap<String, Yaml> {
    let mut schemas = HashMap::new();
    for section in ["schemas", "types"] {
        match root.get(section) {
            Some(Yaml::Mapping(map)) => collect_named(map, &mut schemas),
            Some(Yaml::Sequence(items)) => {
                for item in items {
                    if let Yaml::Mapping(map) = item {
                        collect_named(map, &mut schemas);
                    }
                }
            }
            _ => {}
        }
    }
    schemas
}

fn collect_named(map: &Mapping, schemas: &mut HashMap<String, Yaml>) {
    for (name, definition) in map {
        if let Some(name) = key_text(name) {
            schemas.insert(name, definition.clone());
        }
    }
}

fn default_media_type(root: &Mapping) -> String {
    match root.get("mediaType") {
        Some(Yaml::String(media_type)) => media_type.clone(),
        Some(Yaml::Sequence(items)) => items
            .iter()
            .find_map(Yaml::as_str)
            .unwrap_or(DEFAULT_MEDIA_TYPE)
            .to_string(),
        _ => DEFAULT_MEDIA_TYPE.to_string(),
    }
}

struct TreeBuilder<'a> {
    schemas: HashMap<String, Yaml>,
    options: &'a ParserOptions,
    default_media_type: String,
}

impl TreeBuilder<'_> {
    fn build_node(&self, relative_uri: Option<String>, map: &Mapping) -> SpecNode {
        let mut node = SpecNode {
            relative_uri,
            ..Default::default()
        };
        let mut methods = Vec::new();
        let mut resources = Vec::new();

        for (key, value) in map {
            let Some(key) = key_text(key) else {
                continue;
            };

            if key.starts_with('/') {
                let child = match value {
                    Yaml::Mapping(child) => child.clone(),
                    _ => Mapping::new(),
                };
                resources.push(self.build_node(Some(key), &child));
            } else if HTTP_VERBS.contains(&key.to_ascii_lowercase().as_str()) {
                methods.push(self.build_method(&key, value));
            } else {
                match key.as_str() {
                    "uriParameters" => node.uri_parameters = Some(parameters(value)),
                    "baseUriParameters" => node.base_uri_parameters = Some(parameters(value)),
                    "baseUri" => node.base_uri = value.as_str().map(str::to_string),
                    _ => {
                        if let Some(scalar) = scalar_json(value) {
                            node.attributes.insert(key, scalar);
                        }
                    }
                }
            }
        }

        if let Some(relative) = node.relative_uri.clone() {
            add_implicit_uri_parameters(&mut node, &relative);
        }
        if let Some(base_uri) = node.base_uri.clone() {
            add_implicit_base_uri_parameters(&mut node, &base_uri);
        }
        if !methods.is_empty() {
            node.methods = Some(methods);
        }
        if !resources.is_empty() {
            node.resources = Some(resources);
        }
        node
    }

    fn build_method(&self, verb: &str, value: &Yaml) -> MethodNode {
        let responses = value.get("responses").and_then(Yaml::as_mapping).map(|map| {
            map.iter()
                .filter_map(|(code, response)| {
                    let code_text = key_text(code)?;
                    let node = response.as_mapping().map(|r| ResponseNode {
                        code: Some(Value::String(code_text.clone())),
                        body: r.get("body").and_then(|b| self.build_body(b)),
                    });
                    Some((code_text, node))
                })
                .collect::<BTreeMap<_, _>>()
        });

        MethodNode {
            method: Some(verb.to_string()),
            responses,
        }
    }

    /// Body declarations keyed by media type. A body without media type keys is
    /// declared under the document's default media type.
    fn build_body(&self, body: &Yaml) -> Option<BTreeMap<String, BodyNode>> {
        let map = body.as_mapping()?;
        let per_media_type = map
            .keys()
            .filter_map(key_text)
            .any(|key| key.contains('/'));

        let mut bodies = BTreeMap::new();
        if per_media_type {
            for (media_type, declaration) in map {
                if let Some(media_type) = key_text(media_type) {
                    let node = self.build_body_node(&media_type, declaration);
                    bodies.insert(media_type, node);
                }
            }
        } else if !map.is_empty() {
            let media_type = self.default_media_type.clone();
            let node = self.build_body_node(&media_type, body);
            bodies.insert(media_type, node);
        }
        Some(bodies)
    }

    fn build_body_node(&self, media_type: &str, declaration: &Yaml) -> BodyNode {
        let mut node = BodyNode {
            name: Some(media_type.to_string()),
            ..Default::default()
        };
        let Some(map) = declaration.as_mapping() else {
            // `application/json: !include schema.json` or `application/json: User`
            if let Yaml::String(text) = declaration {
                node.schema = Some(self.schema_from_text(text));
            }
            return node;
        };

        node.example = map
            .get("example")
            .map(yaml_to_json)
            .or_else(|| first_example(map.get("examples")));

        let is_inline_type = ["properties", "items", "enum"]
            .iter()
            .any(|key| map.contains_key(*key));
        node.schema = if is_inline_type {
            Some(self.type_to_schema(declaration, 0))
        } else {
            match map.get("schema").or_else(|| map.get("type")) {
                Some(Yaml::String(text)) => Some(self.schema_from_text(text)),
                Some(inline @ Yaml::Mapping(_)) => Some(self.type_to_schema(inline, 0)),
                _ => None,
            }
        };
        node
    }

    /// Schema text as declared: JSON Schema source is kept verbatim for the
    /// extractor to parse; names are dereferenced when enabled.
    fn schema_from_text(&self, text: &str) -> Value {
        let trimmed = text.trim();
        if trimmed.starts_with('{') || !self.options.dereference_schemas {
            return Value::String(text.to_string());
        }
        match self.schemas.get(trimmed) {
            Some(Yaml::String(source)) if source.trim_start().starts_with('{') => {
                Value::String(source.clone())
            }
            Some(definition) => self.type_to_schema(definition, 1),
            None if builtin_type(trimmed).is_some() || trimmed.ends_with("[]") => {
                self.type_to_schema(&Yaml::String(trimmed.to_string()), 0)
            }
            None => Value::String(text.to_string()),
        }
    }

    /// Translate a RAML 1.0 type declaration into an equivalent JSON Schema.
    fn type_to_schema(&self, declaration: &Yaml, depth: usize) -> Value {
        if depth > MAX_TYPE_DEPTH {
            return json!({});
        }
        match declaration {
            Yaml::String(text) => {
                let text = text.trim();
                if text.starts_with('{') {
                    return serde_json::from_str(text).unwrap_or_else(|_| json!({}));
                }
                if text.contains('|') {
                    let branches: Vec<Value> = text
                        .split('|')
                        .map(|t| self.type_to_schema(&Yaml::String(t.trim().to_string()), depth + 1))
                        .collect();
                    return json!({ "anyOf": branches });
                }
                if let Some(item) = text.strip_suffix("[]") {
                    let items = self.type_to_schema(&Yaml::String(item.to_string()), depth + 1);
                    return json!({ "type": "array", "items": items });
                }
                if let Some(schema) = builtin_type(text) {
                    return schema;
                }
                match self.schemas.get(text) {
                    Some(named) => self.type_to_schema(named, depth + 1),
                    None => json!({}),
                }
            }
            Yaml::Mapping(map) => {
                let mut schema = match map.get("type").or_else(|| map.get("schema")) {
                    Some(base) => match self.type_to_schema(base, depth + 1) {
                        Value::Object(obj) => obj,
                        _ => Map::new(),
                    },
                    None => Map::new(),
                };

                for facet in [
                    "enum",
                    "format",
                    "pattern",
                    "minimum",
                    "maximum",
                    "multipleOf",
                    "minLength",
                    "maxLength",
                    "minItems",
                    "maxItems",
                ] {
                    if let Some(value) = map.get(facet) {
                        schema.insert(facet.to_string(), yaml_to_json(value));
                    }
                }

                if let Some(properties) = map.get("properties").and_then(Yaml::as_mapping) {
                    let mut props = Map::new();
                    for (name, declaration) in properties {
                        if let Some(name) = key_text(name) {
                            let name = name.strip_suffix('?').unwrap_or(&name).to_string();
                            props.insert(name, self.type_to_schema(declaration, depth + 1));
                        }
                    }
                    schema.insert("type".to_string(), json!("object"));
                    schema.insert("properties".to_string(), Value::Object(props));
                }
                if let Some(items) = map.get("items") {
                    schema.insert("type".to_string(), json!("array"));
                    schema.insert("items".to_string(), self.type_to_schema(items, depth + 1));
                }
                Value::Object(schema)
            }
            _ => json!({}),
        }
    }
}

fn builtin_type(name: &str) -> Option<Value> {
    let schema = match name {
        "string" | "file" => json!({"type": "string"}),
        "number" => json!({"type": "number"}),
        "integer" => json!({"type": "integer"}),
        "boolean" => json!({"type": "boolean"}),
        "nil" | "null" => json!({"type": "null"}),
        "date-only" => json!({"type": "string", "format": "date"}),
        "datetime" | "datetime-only" => json!({"type": "string", "format": "date-time"}),
        "time-only" => json!({"type": "string"}),
        "object" | "any" => json!({"type": "object"}),
        "array" => json!({"type": "array"}),
        _ => return None,
    };
    Some(schema)
}

fn parameters(value: &Yaml) -> BTreeMap<String, UriParameter> {
    let Some(map) = value.as_mapping() else {
        return BTreeMap::new();
    };
    map.iter()
        .filter_map(|(name, declaration)| {
            let name = key_text(name)?;
            let mut parameter = UriParameter::default();
            if let Some(facets) = declaration.as_mapping() {
                for (facet, value) in facets {
                    let Some(facet) = key_text(facet) else {
                        continue;
                    };
                    match facet.as_str() {
                        "default" => parameter.default = Some(yaml_to_json(value)),
                        "name" => parameter.name = value.as_str().map(str::to_string),
                        _ => {
                            parameter.facets.insert(facet, yaml_to_json(value));
                        }
                    }
                }
            }
            Some((name, parameter))
        })
        .collect()
}

/// RAML declares every `{token}` of a relative URI even when the document does not.
fn add_implicit_uri_parameters(node: &mut SpecNode, relative_uri: &str) {
    for captures in uri_token_regex().captures_iter(relative_uri) {
        let name = captures[1].to_string();
        let parameters = node.uri_parameters.get_or_insert_with(BTreeMap::new);
        parameters.entry(name.clone()).or_insert_with(|| UriParameter {
            name: Some(name),
            ..Default::default()
        });
    }
}

/// Undeclared `{token}`s of a base URI get name-less declarations, so they are
/// resolved from the document's attributes (`version`) or reported as unresolved.
fn add_implicit_base_uri_parameters(node: &mut SpecNode, base_uri: &str) {
    for captures in uri_token_regex().captures_iter(base_uri) {
        node.base_uri_parameters
            .get_or_insert_with(BTreeMap::new)
            .entry(captures[1].to_string())
            .or_default();
    }
}

fn first_example(examples: Option<&Yaml>) -> Option<Value> {
    let (_, example) = examples?.as_mapping()?.iter().next()?;
    match example.as_mapping().and_then(|m| m.get("value")) {
        Some(value) => Some(yaml_to_json(value)),
        None => Some(yaml_to_json(example)),
    }
}

fn key_text(key: &Yaml) -> Option<String> {
    match key {
        Yaml::String(s) => Some(s.clone()),
        Yaml::Number(n) => Some(n.to_string()),
        Yaml::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn scalar_json(value: &Yaml) -> Option<Value> {
    match value {
        Yaml::String(_) | Yaml::Number(_) | Yaml::Bool(_) => Some(yaml_to_json(value)),
        _ => None,
    }
}

fn yaml_to_json(value: &Yaml) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn parse(text: &str) -> SpecNode {
        parse_raml(text, Path::new("api.raml"), &ParserOptions::default()).unwrap()
    }

    fn resource<'a>(node: &'a SpecNode, relative_uri: &str) -> &'a SpecNode {
        node.resources
            .as_ref()
            .and_then(|r| r.iter().find(|n| n.relative_uri.as_deref() == Some(relative_uri)))
            .unwrap_or_else(|| panic!("no resource {relative_uri}"))
    }

    #[test]
    fn test_parses_resources_methods_and_bodies() {
        let root = parse(
            r#"#%RAML 1.0
title: Users API
version: v1
baseUri: http://{host}/{version}
baseUriParameters:
  host:
    default: api.example.com
/users:
  get:
    responses:
      200:
        body:
          application/json:
            example: |
              [{"id": 1}]
  /{userId}:
    delete:
      responses:
        204:
"#,
        );

        assert_eq!(root.base_uri.as_deref(), Some("http://{host}/{version}"));
        assert_eq!(root.attribute("version").as_deref(), Some("v1"));
        let host = &root.base_uri_parameters.as_ref().unwrap()["host"];
        assert_eq!(host.default_text().as_deref(), Some("api.example.com"));
        assert_eq!(host.name, None);

        let users = resource(&root, "/users");
        let get = &users.methods.as_ref().unwrap()[0];
        assert_eq!(get.method.as_deref(), Some("get"));
        let body = get.responses.as_ref().unwrap()["200"]
            .as_ref()
            .unwrap()
            .body
            .as_ref()
            .unwrap();
        assert_eq!(
            body["application/json"].example,
            Some(Value::String("[{\"id\": 1}]\n".to_string()))
        );

        let user = resource(users, "/{userId}");
        assert!(user.uri_parameters.as_ref().unwrap().contains_key("userId"));
        let delete = &user.methods.as_ref().unwrap()[0];
        assert_eq!(delete.responses.as_ref().unwrap()["204"], None);
    }

    #[test]
    fn test_base_uri_tokens_get_implicit_parameters() {
        let root = parse(
            "#%RAML 1.0\ntitle: Implicit\nversion: v1\nbaseUri: https://api.example.com/{version}\n/users:\n  get:\n",
        );
        let parameters = root.base_uri_parameters.as_ref().unwrap();
        assert_eq!(parameters.len(), 1);
        assert_eq!(parameters["version"], UriParameter::default());

        let literal = parse("#%RAML 1.0\ntitle: Literal\nbaseUri: https://api.example.com/v2\n");
        assert_eq!(literal.base_uri_parameters, None);
    }

    #[test]
    fn test_missing_header_is_rejected() {
        let err = parse_raml("title: nope\n", Path::new("x.raml"), &ParserOptions::default())
            .unwrap_err();
        assert!(matches!(err, LoadError::MissingHeader { .. }));
    }

    #[test]
    fn test_invalid_yaml_is_rejected() {
        let err = parse_raml(
            "#%RAML 1.0\n/users: [unclosed\n",
            Path::new("x.raml"),
            &ParserOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::Yaml { .. }));
    }

    #[test]
    fn test_named_schema_dereferenced() {
        let text = r#"#%RAML 0.8
title: Schemas
schemas:
  - User: |
      {"type": "object", "properties": {"id": {"type": "integer"}}}
/users:
  get:
    responses:
      200:
        body:
          application/json:
            schema: User
"#;
        let root = parse(text);
        let body = &resource(&root, "/users").methods.as_ref().unwrap()[0]
            .responses
            .as_ref()
            .unwrap()["200"];
        let schema = body.as_ref().unwrap().body.as_ref().unwrap()["application/json"]
            .schema
            .clone()
            .unwrap();
        let schema: Value = serde_json::from_str(schema.as_str().unwrap()).unwrap();
        assert_eq!(schema["properties"]["id"]["type"], "integer");

        let raw = parse_raml(
            text,
            Path::new("api.raml"),
            &ParserOptions {
                dereference_schemas: false,
            },
        )
        .unwrap();
        let body = &resource(&raw, "/users").methods.as_ref().unwrap()[0]
            .responses
            .as_ref()
            .unwrap()["200"];
        assert_eq!(
            body.as_ref().unwrap().body.as_ref().unwrap()["application/json"].schema,
            Some(Value::String("User".to_string()))
        );
    }

    #[test]
    fn test_raml_types_become_json_schema() {
        let root = parse(
            r#"#%RAML 1.0
title: Types
types:
  Pet:
    type: object
    properties:
      name: string
      age?: integer
      tags: string[]
/pets:
  get:
    responses:
      200:
        body:
          application/json:
            type: Pet[]
"#,
        );
        let schema = resource(&root, "/pets").methods.as_ref().unwrap()[0]
            .responses
            .as_ref()
            .unwrap()["200"]
            .as_ref()
            .unwrap()
            .body
            .as_ref()
            .unwrap()["application/json"]
            .schema
            .clone()
            .unwrap();

        assert_eq!(schema["type"], "array");
        assert_eq!(schema["items"]["properties"]["name"]["type"], "string");
        assert_eq!(schema["items"]["properties"]["age"]["type"], "integer");
        assert_eq!(schema["items"]["properties"]["tags"]["items"]["type"], "string");
    }

    #[test]
    fn test_body_without_media_type_uses_default() {
        let root = parse(
            r#"#%RAML 1.0
title: Default media type
mediaType: application/xml
/ping:
  get:
    responses:
      200:
        body:
          example: pong
"#,
        );
        let body = resource(&root, "/ping").methods.as_ref().unwrap()[0]
            .responses
            .as_ref()
            .unwrap()["200"]
            .as_ref()
            .unwrap()
            .body
            .clone()
            .unwrap();
        assert_eq!(body["application/xml"].example, Some(Value::String("pong".into())));
    }

    #[test]
    fn test_includes_are_resolved_relative_to_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("schemas")).unwrap();
        fs::write(
            dir.path().join("schemas/item.json"),
            r#"{"type": "object", "properties": {"sku": {"type": "string"}}}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("items.raml"),
            "get:\n  responses:\n    200:\n      body:\n        application/json:\n          schema: !include schemas/item.json\n",
        )
        .unwrap();
        let main = dir.path().join("api.raml");
        let text = "#%RAML 1.0\ntitle: Includes\n/items: !include items.raml\n";

        let root = parse_raml(text, &main, &ParserOptions::default()).unwrap();
        let schema = resource(&root, "/items").methods.as_ref().unwrap()[0]
            .responses
            .as_ref()
            .unwrap()["200"]
            .as_ref()
            .unwrap()
            .body
            .as_ref()
            .unwrap()["application/json"]
            .schema
            .clone()
            .unwrap();
        assert!(schema.as_str().unwrap().contains("\"sku\""));
    }

    #[test]
    fn test_missing_include_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let main = dir.path().join("api.raml");
        let err = parse_raml(
            "#%RAML 1.0\n/items: !include nowhere.raml\n",
            &main,
            &ParserOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::Include { .. }));
        assert!(err.to_string().contains("nowhere.raml"));
    }

    #[test]
    fn test_parser_options_default_and_aliases() {
        assert!(ParserOptions::default().dereference_schemas);
        let options: ParserOptions = serde_json::from_str("{}").unwrap();
        assert!(options.dereference_schemas);
        let options: ParserOptions =
            serde_json::from_str(r#"{"dereferenceSchemas": false}"#).unwrap();
        assert!(!options.dereference_schemas);
    }

    #[tokio::test]
    async fn test_loader_resolves_includes_off_the_runtime() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("health.raml"),
            "get:\n  responses:\n    200:\n      body:\n        text/plain:\n          example: ok\n",
        )
        .unwrap();
        let main = dir.path().join("api.raml");
        fs::write(&main, "#%RAML 1.0\ntitle: Health\n/health: !include health.raml\n").unwrap();

        let root = RamlLoader::new()
            .load(&main, &ParserOptions::default())
            .await
            .unwrap();
        let health = resource(&root, "/health");
        assert_eq!(health.methods.as_ref().unwrap()[0].method.as_deref(), Some("get"));

        fs::remove_file(dir.path().join("health.raml")).unwrap();
        let err = RamlLoader::new()
            .load(&main, &ParserOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::Include { .. }));
    }

    #[tokio::test]
    async fn test_loader_reports_missing_file() {
        let err = RamlLoader::new()
            .load(Path::new("/definitely/not/here.raml"), &ParserOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
