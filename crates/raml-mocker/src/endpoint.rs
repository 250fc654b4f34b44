//! Endpoint model: one route + method with its responses by status code.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// HTTP methods a stub server can be asked to mock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// Uppercase method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    /// Case-insensitive; anything outside the five mockable verbs is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "get" => Ok(HttpMethod::Get),
            "post" => Ok(HttpMethod::Post),
            "put" => Ok(HttpMethod::Put),
            "patch" => Ok(HttpMethod::Patch),
            "delete" => Ok(HttpMethod::Delete),
            other => Err(format!("unsupported method: {other}")),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One body alternative for a status code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseVariant {
    #[serde(skip)]
    pub role: String,
    pub example: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mock: Option<Value>,
}

impl ResponseVariant {
    /// The value a stub should serve: the mock if one was generated, else the example.
    pub fn payload(&self) -> Option<&Value> {
        self.mock.as_ref().or(self.example.as_ref())
    }
}

/// Status code to role (media type) to variant.
pub type ResponseSet = BTreeMap<u16, BTreeMap<String, ResponseVariant>>;

/// Identity of an endpoint in a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EndpointKey {
    pub uri: String,
    pub method: HttpMethod,
}

impl fmt::Display for EndpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.uri)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub uri: String,
    pub method: HttpMethod,
    pub responses: ResponseSet,
}

impl Endpoint {
    /// Create an endpoint with no responses.
    pub fn new(uri: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            uri: uri.into(),
            method,
            responses: BTreeMap::new(),
        }
    }

    /// Catalog identity of this endpoint.
    pub fn key(&self) -> EndpointKey {
        EndpointKey {
            uri: self.uri.clone(),
            method: self.method,
        }
    }

    /// Attach a variant to a status code. A later variant for the same role replaces
    /// the earlier one.
    pub fn add_response(&mut self, code: u16, variant: ResponseVariant) {
        self.responses
            .entry(code)
            .or_default()
            .insert(variant.role.clone(), variant);
    }

    /// Lowest 2xx code, falling back to the lowest declared code.
    pub fn default_code(&self) -> Option<u16> {
        self.responses
            .keys()
            .copied()
            .find(|code| (200..300).contains(code))
            .or_else(|| self.responses.keys().next().copied())
    }

    /// First variant (by role) declared for `code`.
    pub fn variant(&self, code: u16) -> Option<&ResponseVariant> {
        self.responses.get(&code).and_then(|v| v.values().next())
    }

    /// Payload for `code`, or for the default code when `code` is `None`.
    pub fn payload(&self, code: Option<u16>) -> Option<&Value> {
        let code = code.or_else(|| self.default_code())?;
        self.variant(code).and_then(ResponseVariant::payload)
    }
}

/// How the catalog treats two endpoints with the same key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// The endpoint merged last replaces the earlier one.
    #[default]
    LastWins,
    /// The first endpoint is kept and later ones are dropped.
    KeepFirst,
    /// Response codes of both are combined; the later one wins per code and role.
    MergeResponses,
}

impl FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "last-wins" => Ok(DuplicatePolicy::LastWins),
            "keep-first" => Ok(DuplicatePolicy::KeepFirst),
            "merge-responses" => Ok(DuplicatePolicy::MergeResponses),
            other => Err(format!(
                "unknown duplicate policy '{other}' (expected last-wins, keep-first or merge-responses)"
            )),
        }
    }
}

/// Flat, key-unique collection of endpoints.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    endpoints: Vec<Endpoint>,
    index: HashMap<EndpointKey, usize>,
    policy: DuplicatePolicy,
}

impl Catalog {
    /// Create an empty catalog using `policy` for collisions.
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self {
            endpoints: Vec::new(),
            index: HashMap::new(),
            policy,
        }
    }

    /// Insert an endpoint, applying the duplicate policy.
    ///
    /// Returns the key when an endpoint with the same key was already present.
    pub fn insert(&mut self, endpoint: Endpoint) -> Option<EndpointKey> {
        let key = endpoint.key();
        let Some(&pos) = self.index.get(&key) else {
            self.index.insert(key, self.endpoints.len());
            self.endpoints.push(endpoint);
            return None;
        };

        match self.policy {
            DuplicatePolicy::LastWins => self.endpoints[pos] = endpoint,
            DuplicatePolicy::KeepFirst => {}
            DuplicatePolicy::MergeResponses => {
                let existing = &mut self.endpoints[pos];
                for (code, variants) in endpoint.responses {
                    existing.responses.entry(code).or_default().extend(variants);
                }
            }
        }
        Some(key)
    }

    /// Insert every endpoint, returning the keys that collided.
    pub fn extend(&mut self, endpoints: impl IntoIterator<Item = Endpoint>) -> Vec<EndpointKey> {
        endpoints
            .into_iter()
            .filter_map(|endpoint| self.insert(endpoint))
            .collect()
    }

    /// Look up an endpoint by URI and method.
    pub fn get(&self, uri: &str, method: HttpMethod) -> Option<&Endpoint> {
        let key = EndpointKey {
            uri: uri.to_string(),
            method,
        };
        self.index.get(&key).map(|&pos| &self.endpoints[pos])
    }

    /// Duplicate policy the catalog was built with.
    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Number of distinct endpoints.
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Endpoints in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Endpoint> {
        self.endpoints.iter()
    }

    /// Consume the catalog, keeping insertion order.
    pub fn into_endpoints(self) -> Vec<Endpoint> {
        self.endpoints
    }
}

impl Serialize for Catalog {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.endpoints.serialize(serializer)
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Endpoint;
    type IntoIter = std::slice::Iter<'a, Endpoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.endpoints.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn variant(role: &str, example: Value) -> ResponseVariant {
        ResponseVariant {
            role: role.to_string(),
            example: Some(example),
            mock: None,
        }
    }

    fn endpoint_with(uri: &str, code: u16, example: Value) -> Endpoint {
        let mut endpoint = Endpoint::new(uri, HttpMethod::Get);
        endpoint.add_response(code, variant("application/json", example));
        endpoint
    }

    #[test]
    fn test_method_parsing_is_case_insensitive() {
        assert_eq!("GET".parse::<HttpMethod>(), Ok(HttpMethod::Get));
        assert_eq!("pAtCh".parse::<HttpMethod>(), Ok(HttpMethod::Patch));
        assert!("options".parse::<HttpMethod>().is_err());
        assert!("head".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn test_default_code_prefers_success() {
        let mut endpoint = Endpoint::new("/users", HttpMethod::Post);
        endpoint.add_response(400, variant("application/json", json!({"error": true})));
        endpoint.add_response(201, variant("application/json", json!({"id": 1})));
        endpoint.add_response(200, variant("application/json", json!({"id": 2})));
        assert_eq!(endpoint.default_code(), Some(200));
        assert_eq!(endpoint.payload(None), Some(&json!({"id": 2})));
        assert_eq!(endpoint.payload(Some(400)), Some(&json!({"error": true})));

        let mut errors_only = Endpoint::new("/fail", HttpMethod::Get);
        errors_only.add_response(503, variant("text/plain", json!("down")));
        errors_only.add_response(404, variant("text/plain", json!("missing")));
        assert_eq!(errors_only.default_code(), Some(404));
    }

    #[test]
    fn test_payload_prefers_mock_over_example() {
        let v = ResponseVariant {
            role: "application/json".into(),
            example: Some(json!("example")),
            mock: Some(json!("mock")),
        };
        assert_eq!(v.payload(), Some(&json!("mock")));
    }

    #[test]
    fn test_serialized_shape() {
        let mut endpoint = Endpoint::new("/users/:id", HttpMethod::Get);
        endpoint.add_response(
            200,
            ResponseVariant {
                role: "application/json".into(),
                example: None,
                mock: Some(json!({"id": 7})),
            },
        );
        endpoint.add_response(404, variant("text/plain", json!("nope")));

        assert_eq!(
            serde_json::to_value(&endpoint).unwrap(),
            json!({
                "uri": "/users/:id",
                "method": "GET",
                "responses": {
                    "200": {"application/json": {"example": null, "mock": {"id": 7}}},
                    "404": {"text/plain": {"example": "nope"}}
                }
            })
        );
    }

    #[test]
    fn test_catalog_last_wins() {
        let mut catalog = Catalog::new(DuplicatePolicy::LastWins);
        assert!(catalog.insert(endpoint_with("/a", 200, json!(1))).is_none());
        let dup = catalog.insert(endpoint_with("/a", 200, json!(2)));
        assert_eq!(dup.map(|k| k.to_string()).as_deref(), Some("GET /a"));
        assert_eq!(catalog.len(), 1);
        assert_eq!(
            catalog.get("/a", HttpMethod::Get).unwrap().payload(None),
            Some(&json!(2))
        );
    }

    #[test]
    fn test_catalog_keep_first() {
        let mut catalog = Catalog::new(DuplicatePolicy::KeepFirst);
        catalog.insert(endpoint_with("/a", 200, json!(1)));
        catalog.insert(endpoint_with("/a", 200, json!(2)));
        assert_eq!(
            catalog.get("/a", HttpMethod::Get).unwrap().payload(None),
            Some(&json!(1))
        );
    }

    #[test]
    fn test_catalog_merge_responses() {
        let mut catalog = Catalog::new(DuplicatePolicy::MergeResponses);
        let collisions = catalog.extend([
            endpoint_with("/a", 200, json!(1)),
            endpoint_with("/a", 404, json!("missing")),
            endpoint_with("/b", 200, json!(3)),
        ]);
        assert_eq!(collisions.len(), 1);
        assert_eq!(catalog.len(), 2);

        let merged = catalog.get("/a", HttpMethod::Get).unwrap();
        let codes: Vec<u16> = merged.responses.keys().copied().collect();
        assert_eq!(codes, vec![200, 404]);
    }

    #[test]
    fn test_same_uri_different_method_is_distinct() {
        let mut catalog = Catalog::default();
        catalog.insert(Endpoint::new("/a", HttpMethod::Get));
        catalog.insert(Endpoint::new("/a", HttpMethod::Delete));
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_duplicate_policy_from_str() {
        assert_eq!(
            "merge-responses".parse::<DuplicatePolicy>(),
            Ok(DuplicatePolicy::MergeResponses)
        );
        assert!("replace".parse::<DuplicatePolicy>().is_err());
    }
}
