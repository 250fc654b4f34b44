//! JSON Schema to synthetic value generation.
//!
//! [`SchemaMocker`] is the seam; [`JsonSchemaMocker`] is the default implementation
//! built on `fake` and `rand`. String formats can be overridden through [`Formats`].

use fake::faker::chrono::en::{Date, DateTime};
use fake::faker::internet::en::{DomainSuffix, IPv4, IPv6, SafeEmail};
use fake::faker::lorem::en::{Sentence, Word};
use fake::Fake;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Nesting depth after which objects and arrays are no longer expanded.
const MAX_DEPTH: usize = 8;
const DEFAULT_MAX_ITEMS: u64 = 5;
const DEFAULT_MAX_LENGTH: u64 = 24;
/// Upper bounds applied to `minItems`/`maxItems` and `minLength`/`maxLength`.
const MAX_ITEMS: u64 = 100;
const MAX_LENGTH: u64 = 4096;

/// Produces a value for a schema carrying a `format` keyword.
pub type FormatGenerator = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// Caller-supplied generators keyed by string format name.
#[derive(Clone, Default)]
pub struct Formats {
    generators: BTreeMap<String, FormatGenerator>,
}

impl Formats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a generator for `format`, replacing any previous one.
    pub fn with<F>(mut self, format: impl Into<String>, generator: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.generators.insert(format.into(), Arc::new(generator));
        self
    }

    /// Register a format that always produces `value`.
    pub fn with_constant(self, format: impl Into<String>, value: Value) -> Self {
        self.with(format, move |_| value.clone())
    }

    pub fn get(&self, format: &str) -> Option<&FormatGenerator> {
        self.generators.get(format)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.generators.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }
}

impl fmt::Debug for Formats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

/// Configuration files can only express constant formats.
impl<'de> Deserialize<'de> for Formats {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let constants = BTreeMap::<String, Value>::deserialize(deserializer)?;
        Ok(constants
            .into_iter()
            .fold(Formats::new(), |formats, (name, value)| {
                formats.with_constant(name, value)
            }))
    }
}

pub trait SchemaMocker: Send + Sync {
    /// Produce a value conforming to `schema`.
    fn mock(&self, schema: &Value, formats: &Formats) -> Value;
}

/// Default mocker for draft-04 style JSON Schemas. `$ref` is not followed.
#[derive(Debug, Clone, Default)]
pub struct JsonSchemaMocker;

impl JsonSchemaMocker {
    pub fn new() -> Self {
        Self
    }

    fn mock_at(&self, schema: &Value, formats: &Formats, depth: usize) -> Value {
        let Some(obj) = schema.as_object() else {
            return Value::Null;
        };

        if let Some(value) = obj.get("const") {
            return value.clone();
        }
        if let Some(choices) = obj.get("enum").and_then(Value::as_array) {
            return choices
                .choose(&mut rand::thread_rng())
                .cloned()
                .unwrap_or(Value::Null);
        }
        if let Some(format) = obj.get("format").and_then(Value::as_str) {
            if let Some(generator) = formats.get(format) {
                return generator(schema);
            }
        }
        for key in ["oneOf", "anyOf"] {
            if let Some(options) = obj.get(key).and_then(Value::as_array) {
                return match options.choose(&mut rand::thread_rng()) {
                    Some(option) => self.mock_at(option, formats, depth + 1),
                    None => Value::Null,
                };
            }
        }
        if let Some(parts) = obj.get("allOf").and_then(Value::as_array) {
            return self.mock_at(&merge_all_of(parts), formats, depth + 1);
        }

        match schema_type(obj).as_deref() {
            Some("object") => self.mock_object(obj, formats, depth),
            Some("array") => self.mock_array(obj, formats, depth),
            Some("string") => mock_string(obj),
            Some("integer") => mock_integer(obj),
            Some("number") => mock_number(obj),
            Some("boolean") => Value::Bool(rand::thread_rng().gen_bool(0.5)),
            _ => Value::Null,
        }
    }

    fn mock_object(&self, obj: &Map<String, Value>, formats: &Formats, depth: usize) -> Value {
        let mut out = Map::new();
        if depth >= MAX_DEPTH {
            return Value::Object(out);
        }
        if let Some(properties) = obj.get("properties").and_then(Value::as_object) {
            for (name, property) in properties {
                out.insert(name.clone(), self.mock_at(property, formats, depth + 1));
            }
        }
        Value::Object(out)
    }

    fn mock_array(&self, obj: &Map<String, Value>, formats: &Formats, depth: usize) -> Value {
        if depth >= MAX_DEPTH {
            return Value::Array(Vec::new());
        }
        let min = obj
            .get("minItems")
            .and_then(Value::as_u64)
            .unwrap_or(1)
            .min(MAX_ITEMS);
        let max = obj
            .get("maxItems")
            .and_then(Value::as_u64)
            .unwrap_or(min.max(DEFAULT_MAX_ITEMS))
            .clamp(min, MAX_ITEMS);
        let count = rand::thread_rng().gen_range(min..=max);

        let items = match obj.get("items") {
            // Tuple form: one schema per position.
            Some(Value::Array(tuple)) => tuple
                .iter()
                .map(|item| self.mock_at(item, formats, depth + 1))
                .collect(),
            Some(item) => (0..count)
                .map(|_| self.mock_at(item, formats, depth + 1))
                .collect(),
            None => Vec::new(),
        };
        Value::Array(items)
    }
}

impl SchemaMocker for JsonSchemaMocker {
    fn mock(&self, schema: &Value, formats: &Formats) -> Value {
        self.mock_at(schema, formats, 0)
    }
}

/// Resolve `type`, picking one entry when a list is given and inferring from
/// structural keywords when it is missing.
fn schema_type(obj: &Map<String, Value>) -> Option<String> {
    match obj.get("type") {
        Some(Value::String(t)) => Some(t.clone()),
        Some(Value::Array(types)) => {
            let concrete: Vec<&str> = types
                .iter()
                .filter_map(Value::as_str)
                .filter(|t| *t != "null")
                .collect();
            match concrete.choose(&mut rand::thread_rng()) {
                Some(t) => Some((*t).to_string()),
                None if !types.is_empty() => Some("null".to_string()),
                None => None,
            }
        }
        _ if obj.contains_key("properties") => Some("object".to_string()),
        _ if obj.contains_key("items") => Some("array".to_string()),
        _ => None,
    }
}

fn merge_all_of(parts: &[Value]) -> Value {
    let mut merged = Map::new();
    let mut properties = Map::new();
    for part in parts.iter().filter_map(Value::as_object) {
        for (key, value) in part {
            if key == "properties" {
                if let Some(props) = value.as_object() {
                    properties.extend(props.clone());
                }
            } else {
                merged.insert(key.clone(), value.clone());
            }
        }
    }
    if !properties.is_empty() {
        merged.insert("properties".to_string(), Value::Object(properties));
        merged
            .entry("type")
            .or_insert_with(|| Value::String("object".to_string()));
    }
    Value::Object(merged)
}

fn mock_string(obj: &Map<String, Value>) -> Value {
    if let Some(format) = obj.get("format").and_then(Value::as_str) {
        if let Some(value) = builtin_format(format) {
            return Value::String(value);
        }
    }

    let min = obj
        .get("minLength")
        .and_then(Value::as_u64)
        .unwrap_or(0)
        .min(MAX_LENGTH);
    let max = obj
        .get("maxLength")
        .and_then(Value::as_u64)
        .unwrap_or(DEFAULT_MAX_LENGTH.max(min))
        .clamp(min, MAX_LENGTH);

    let mut text: String = Sentence(1..4).fake();
    while (text.chars().count() as u64) < min {
        text.push(' ');
        text.push_str(&Word().fake::<String>());
    }
    let text: String = text.chars().take(max as usize).collect();
    Value::String(text)
}

fn builtin_format(format: &str) -> Option<String> {
    let value = match format {
        "email" => SafeEmail().fake(),
        "uri" | "url" => format!(
            "https://{}.{}/{}",
            Word().fake::<String>(),
            DomainSuffix().fake::<String>(),
            Word().fake::<String>()
        ),
        "hostname" => format!(
            "{}.{}",
            Word().fake::<String>(),
            DomainSuffix().fake::<String>()
        ),
        "ipv4" => IPv4().fake(),
        "ipv6" => IPv6().fake(),
        "date-time" => DateTime()
            .fake::<chrono::DateTime<chrono::Utc>>()
            .to_rfc3339(),
        "date" => Date().fake::<chrono::NaiveDate>().to_string(),
        "uuid" => uuid::Uuid::new_v4().to_string(),
        _ => return None,
    };
    Some(value)
}

fn numeric_bounds(obj: &Map<String, Value>, default_span: f64) -> (f64, f64) {
    let mut min = obj.get("minimum").and_then(Value::as_f64);
    let mut max = obj.get("maximum").and_then(Value::as_f64);

    // Draft-06 numeric form; the draft-04 boolean form is handled below.
    if let Some(exclusive) = obj.get("exclusiveMinimum").and_then(Value::as_f64) {
        min = Some(exclusive + 1.0);
    }
    if let Some(exclusive) = obj.get("exclusiveMaximum").and_then(Value::as_f64) {
        max = Some(exclusive - 1.0);
    }
    if obj.get("exclusiveMinimum").and_then(Value::as_bool) == Some(true) {
        min = min.map(|m| m + 1.0);
    }
    if obj.get("exclusiveMaximum").and_then(Value::as_bool) == Some(true) {
        max = max.map(|m| m - 1.0);
    }

    match (min, max) {
        (Some(lo), Some(hi)) if lo <= hi => (lo, hi),
        (Some(lo), Some(_)) => (lo, lo),
        (Some(lo), None) => (lo, lo + default_span),
        (None, Some(hi)) => (hi - default_span, hi),
        (None, None) => (0.0, default_span),
    }
}

fn mock_integer(obj: &Map<String, Value>) -> Value {
    let (lo, hi) = numeric_bounds(obj, 1000.0);
    // `as` saturates at the i64 range.
    let (lo, hi) = (lo.ceil() as i64, hi.floor() as i64);
    let mut value = if lo <= hi {
        rand::thread_rng().gen_range(lo..=hi)
    } else {
        lo
    };
    if let Some(step) = obj.get("multipleOf").and_then(Value::as_i64) {
        if step > 0 {
            value = snap_to_multiple(value, step, lo).unwrap_or(lo);
        }
    }
    Value::Number(value.into())
}

/// Largest multiple of `step` not above `value`, moved up one step when that
/// falls below `lo`. `None` when the arithmetic leaves the i64 range.
fn snap_to_multiple(value: i64, step: i64, lo: i64) -> Option<i64> {
    let snapped = value.div_euclid(step).checked_mul(step)?;
    if snapped < lo {
        snapped.checked_add(step)
    } else {
        Some(snapped)
    }
}

fn mock_number(obj: &Map<String, Value>) -> Value {
    let (lo, hi) = numeric_bounds(obj, 1000.0);
    let mut value = if lo < hi {
        sample_between(lo, hi, rand::thread_rng().gen::<f64>())
    } else {
        lo
    };
    if let Some(step) = obj.get("multipleOf").and_then(Value::as_f64) {
        if step > 0.0 {
            let mut snapped = (value / step).floor() * step;
            if snapped < lo {
                snapped += step;
            }
            if snapped.is_finite() {
                value = snapped;
            }
        }
    }
    Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Point at fraction `t` of `[lo, hi]`. Halves the operands when the span
/// itself is not representable.
fn sample_between(lo: f64, hi: f64, t: f64) -> f64 {
    let span = hi - lo;
    let value = if span.is_finite() {
        lo + t * span
    } else {
        let (half_lo, half_hi) = (lo / 2.0, hi / 2.0);
        (half_lo + t * (half_hi - half_lo)) * 2.0
    };
    value.clamp(lo, hi)
}
