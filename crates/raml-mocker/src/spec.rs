//! In-memory specification tree consumed by the walker.
//!
//! The shape follows the JSON the RAML parser ecosystem emits for a loaded API
//! (`relativeUri`, `uriParameters`, `baseUriParameters`, ...), so a tree can be
//! produced by [`crate::loader::RamlLoader`] or deserialized from such a dump.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A resource node. The root node additionally carries the base URI metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri_parameters: Option<BTreeMap<String, UriParameter>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub methods: Option<Vec<MethodNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<SpecNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_uri_parameters: Option<BTreeMap<String, UriParameter>>,
    /// Every other key on the node (`title`, `version`, ...).
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl SpecNode {
    /// A same-named scalar attribute on the node, rendered as text.
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.get(name).and_then(scalar_text)
    }

    pub fn has_resources(&self) -> bool {
        self.resources.as_ref().is_some_and(|r| !r.is_empty())
    }
}

/// Declaration of a URI or base URI parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UriParameter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(flatten)]
    pub facets: Map<String, Value>,
}

impl UriParameter {
    /// Declared default, ignoring empty values.
    pub fn default_text(&self) -> Option<String> {
        self.default.as_ref().and_then(scalar_text)
    }

    /// Declared name, ignoring empty values.
    pub fn name_text(&self) -> Option<String> {
        self.name.clone().filter(|n| !n.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MethodNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Status code (as written in the document) to response. `None` entries are
    /// declared but empty responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responses: Option<BTreeMap<String, Option<ResponseNode>>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<Value>,
    /// Media type (or role) to body declaration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<BTreeMap<String, BodyNode>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BodyNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    /// JSON Schema, usually as text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_parser_dump() {
        let node: SpecNode = serde_json::from_value(json!({
            "title": "Example",
            "version": "v2",
            "baseUri": "http://{host}/{version}",
            "baseUriParameters": {"host": {"name": "host", "default": "api.example.com"}},
            "resources": [{
                "relativeUri": "/users",
                "methods": [{
                    "method": "get",
                    "responses": {"200": {"code": "200", "body": {
                        "application/json": {"name": "application/json", "example": "[]"}
                    }}}
                }]
            }]
        }))
        .unwrap();

        assert_eq!(node.base_uri.as_deref(), Some("http://{host}/{version}"));
        assert_eq!(node.attribute("version").as_deref(), Some("v2"));
        assert_eq!(node.attribute("title").as_deref(), Some("Example"));
        assert!(node.has_resources());

        let users = &node.resources.as_ref().unwrap()[0];
        assert_eq!(users.relative_uri.as_deref(), Some("/users"));
        let responses = users.methods.as_ref().unwrap()[0].responses.as_ref().unwrap();
        assert!(responses["200"].as_ref().unwrap().body.is_some());
    }

    #[test]
    fn test_uri_parameter_empty_values_are_absent() {
        let param: UriParameter =
            serde_json::from_value(json!({"name": "", "default": ""})).unwrap();
        assert_eq!(param.default_text(), None);
        assert_eq!(param.name_text(), None);

        let param: UriParameter = serde_json::from_value(json!({"default": 8080})).unwrap();
        assert_eq!(param.default_text().as_deref(), Some("8080"));
    }

    #[test]
    fn test_null_response_entry() {
        let method: MethodNode =
            serde_json::from_value(json!({"method": "get", "responses": {"204": null}})).unwrap();
        assert!(method.responses.unwrap()["204"].is_none());
    }
}
