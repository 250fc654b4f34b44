//! Per-method response extraction.
//!
//! Turns the `methods` of one resource into [`Endpoint`]s, grouping declared
//! responses by numeric status code and attaching an example and/or a
//! schema-derived mock to each body variant.

use crate::endpoint::{Endpoint, HttpMethod, ResponseVariant};
use crate::mocker::{Formats, SchemaMocker};
use crate::spec::{BodyNode, MethodNode, ResponseNode};
use crate::types::Diagnostic;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// A body variant before mocking.
#[derive(Debug, Clone, PartialEq)]
struct BodyEntry {
    role: String,
    example: Option<Value>,
    schema: Option<Value>,
}

/// All variants declared for one admitted status code.
#[derive(Debug, Clone, PartialEq)]
struct CodeGroup {
    code: u16,
    entries: Vec<BodyEntry>,
}

pub struct ResponseExtractor<'a> {
    mocker: &'a dyn SchemaMocker,
    formats: &'a Formats,
}

impl<'a> ResponseExtractor<'a> {
    pub fn new(mocker: &'a dyn SchemaMocker, formats: &'a Formats) -> Self {
        Self { mocker, formats }
    }

    /// One endpoint per mockable method that declares responses.
    pub fn extract(
        &self,
        methods: &[MethodNode],
        uri: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<Endpoint> {
        let mut endpoints = Vec::new();

        for method in methods {
            let Some(verb) = method.method.as_deref() else {
                continue;
            };
            let Ok(http_method) = verb.parse::<HttpMethod>() else {
                debug!("Skipping {} {}: method is not mockable", verb, uri);
                continue;
            };
            let Some(responses) = method.responses.as_ref().filter(|r| !r.is_empty()) else {
                continue;
            };

            let location = format!("{http_method} {uri}");
            let mut endpoint = Endpoint::new(uri, http_method);

            for group in group_by_code(responses, &location, diagnostics) {
                for entry in group.entries {
                    let mock = entry
                        .schema
                        .as_ref()
                        .map(|schema| self.mocker.mock(schema, self.formats));
                    endpoint.add_response(
                        group.code,
                        ResponseVariant {
                            role: entry.role,
                            example: entry.example,
                            mock,
                        },
                    );
                }
            }

            debug!(
                "Extracted {} with {} status code(s)",
                location,
                endpoint.responses.len()
            );
            endpoints.push(endpoint);
        }

        endpoints
    }
}

fn group_by_code(
    responses: &BTreeMap<String, Option<ResponseNode>>,
    location: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<CodeGroup> {
    let mut groups = Vec::new();

    for (code, response) in responses {
        let Some(body) = response
            .as_ref()
            .and_then(|r| r.body.as_ref())
            .filter(|b| !b.is_empty())
        else {
            continue;
        };
        let Some(code) = parse_status_code(code) else {
            debug!("Dropping non-numeric status code '{}' on {}", code, location);
            continue;
        };

        let entries = body
            .iter()
            .map(|(media_type, body)| {
                body_entry(media_type, body, &format!("{location} {code}"), diagnostics)
            })
            .collect();
        groups.push(CodeGroup { code, entries });
    }

    groups
}

fn body_entry(
    media_type: &str,
    body: &BodyNode,
    location: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> BodyEntry {
    let role = body
        .name
        .clone()
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| media_type.to_string());

    let schema = match &body.schema {
        Some(Value::String(text)) => match serde_json::from_str::<Value>(text) {
            Ok(schema) => Some(schema),
            Err(e) => {
                debug!("Ignoring unparseable schema at {} {}: {}", location, role, e);
                diagnostics.push(
                    Diagnostic::info("I001", format!("Schema is not valid JSON: {e}"))
                        .with_location(format!("{location} {role}")),
                );
                None
            }
        },
        Some(schema @ Value::Object(_)) => Some(schema.clone()),
        _ => None,
    };

    BodyEntry {
        role,
        example: body.example.clone().filter(is_present),
        schema,
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Integral HTTP status code from a response key such as "200".
pub fn parse_status_code(code: &str) -> Option<u16> {
    code.trim().parse::<u16>().ok()
}
