//! Mountebank-compatible imposter export.
//!
//! Each endpoint becomes one stub answering with its default status code and
//! payload. Stubs for literal paths are emitted before parameterized ones so a
//! first-match server prefers `/users/me` over `/users/:id`.

use crate::endpoint::{Catalog, Endpoint};
use serde_json::{json, Map, Value};

/// Imposter document serving every endpoint of `catalog` on `port`.
pub fn to_imposter(catalog: &Catalog, port: u16) -> Value {
    let (literal, parameterized): (Vec<&Endpoint>, Vec<&Endpoint>) =
        catalog.iter().partition(|e| !has_parameters(&e.uri));

    let stubs: Vec<Value> = literal
        .into_iter()
        .chain(parameterized)
        .map(endpoint_stub)
        .collect();

    json!({
        "port": port,
        "protocol": "http",
        "name": "raml-mocker",
        "stubs": stubs,
    })
}

/// A single stub for `endpoint`.
pub fn endpoint_stub(endpoint: &Endpoint) -> Value {
    let path_predicate = if has_parameters(&endpoint.uri) {
        json!({ "matches": { "path": path_pattern(&endpoint.uri) } })
    } else {
        json!({ "equals": { "path": endpoint.uri } })
    };
    let predicates = json!([
        { "equals": { "method": endpoint.method.as_str() } },
        path_predicate,
    ]);

    let code = endpoint.default_code();
    let mut response = Map::new();
    response.insert("statusCode".to_string(), json!(code.unwrap_or(200)));

    let variant = code.and_then(|code| {
        endpoint
            .responses
            .get(&code)
            .and_then(|variants| variants.iter().next())
    });
    if let Some((role, variant)) = variant {
        if role.contains('/') {
            response.insert("headers".to_string(), json!({ "Content-Type": role }));
        }
        if let Some(payload) = variant.payload() {
            response.insert("body".to_string(), payload.clone());
        }
    }

    json!({
        "predicates": predicates,
        "responses": [{ "is": response }],
    })
}

fn has_parameters(uri: &str) -> bool {
    uri.split('/').any(|segment| segment.starts_with(':'))
}

/// Anchored regex matching `uri` with every `:param` segment as a wildcard.
fn path_pattern(uri: &str) -> String {
    let segments: Vec<String> = uri
        .split('/')
        .map(|segment| {
            if segment.starts_with(':') {
                "[^/]+".to_string()
            } else {
                regex::escape(segment)
            }
        })
        .collect();
    format!("^{}$", segments.join("/"))
}
