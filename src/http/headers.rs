//! Header canonicalization.
//!
//! # Responsibilities
//! - Convert any accepted header source into an ordered `Headers` map
//! - Case-insensitive lookup through a lowercased copy
//! - Positional value equality for multi-valued headers
//!
//! # Design Decisions
//! - Source order is kept; a repeated key overwrites the value in its first position
//! - Names keep their case; lowercasing happens only on the lookup copy
//! - Sources are probed in a fixed order: raw multi-value map, pairs, plain object

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A header value: one string, or an ordered list for multi-valued headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderValue {
    Single(String),
    Multi(Vec<String>),
}

impl HeaderValue {
    /// View as a sequence; a single value is a one-element sequence.
    pub fn as_slice(&self) -> &[String] {
        match self {
            HeaderValue::Single(value) => std::slice::from_ref(value),
            HeaderValue::Multi(values) => values,
        }
    }

    /// Comma-joined form, as sent on the wire.
    pub fn joined(&self) -> String {
        self.as_slice().join(", ")
    }
}

impl From<&str> for HeaderValue {
    fn from(value: &str) -> Self {
        HeaderValue::Single(value.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(value: String) -> Self {
        HeaderValue::Single(value)
    }
}

impl From<Vec<String>> for HeaderValue {
    fn from(values: Vec<String>) -> Self {
        HeaderValue::Multi(values)
    }
}

impl From<Vec<&str>> for HeaderValue {
    fn from(values: Vec<&str>) -> Self {
        HeaderValue::Multi(values.into_iter().map(str::to_string).collect())
    }
}

impl From<&Value> for HeaderValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::String(s) => HeaderValue::Single(s.clone()),
            Value::Array(items) => HeaderValue::Multi(
                items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
            ),
            other => HeaderValue::Single(other.to_string()),
        }
    }
}

/// Ordered mapping from header name to value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Headers {
    entries: Vec<(String, HeaderValue)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a header. An existing identical name keeps its position and takes the new value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<HeaderValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Exact-name lookup.
    pub fn get(&self, name: &str) -> Option<&HeaderValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    /// Lookup ignoring ASCII case. The first matching name wins.
    pub fn get_ignore_case(&self, name: &str) -> Option<&HeaderValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// This map as a pair-sequence source.
    pub fn as_source(&self) -> HeaderSource<'_> {
        HeaderSource::Pairs(&self.entries)
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<HeaderValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

impl From<Map<String, Value>> for Headers {
    fn from(map: Map<String, Value>) -> Self {
        to_mapping(HeaderSource::Object(&map))
    }
}

impl From<Headers> for Map<String, Value> {
    fn from(headers: Headers) -> Self {
        headers
            .entries
            .into_iter()
            .map(|(name, value)| {
                let value = match value {
                    HeaderValue::Single(s) => Value::String(s),
                    HeaderValue::Multi(values) => {
                        Value::Array(values.into_iter().map(Value::String).collect())
                    }
                };
                (name, value)
            })
            .collect()
    }
}

/// Accepted header inputs, in probe priority order.
#[derive(Debug, Clone, Copy)]
pub enum HeaderSource<'a> {
    /// Multi-value accessor: every name yields all of its values.
    Raw(&'a http::HeaderMap),
    /// Ordered name/value pairs.
    Pairs(&'a [(String, HeaderValue)]),
    /// Plain key to value object.
    Object(&'a Map<String, Value>),
}

impl<'a> From<&'a http::HeaderMap> for HeaderSource<'a> {
    fn from(map: &'a http::HeaderMap) -> Self {
        HeaderSource::Raw(map)
    }
}

impl<'a> From<&'a Headers> for HeaderSource<'a> {
    fn from(headers: &'a Headers) -> Self {
        headers.as_source()
    }
}

impl<'a> From<&'a Map<String, Value>> for HeaderSource<'a> {
    fn from(map: &'a Map<String, Value>) -> Self {
        HeaderSource::Object(map)
    }
}

/// Flatten a header source into ordered pairs.
pub fn to_pairs(source: HeaderSource<'_>) -> Vec<(String, HeaderValue)> {
    match source {
        HeaderSource::Raw(map) => map
            .keys()
            .map(|name| {
                let values = map
                    .get_all(name)
                    .iter()
                    .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                    .collect();
                (name.as_str().to_string(), HeaderValue::Multi(values))
            })
            .collect(),
        HeaderSource::Pairs(pairs) => pairs.to_vec(),
        HeaderSource::Object(map) => map
            .iter()
            .map(|(name, value)| (name.clone(), HeaderValue::from(value)))
            .collect(),
    }
}

/// Fold a header source into a `Headers` map.
pub fn to_mapping(source: HeaderSource<'_>) -> Headers {
    to_pairs(source).into_iter().collect()
}

/// Copy with every name lowercased. Names that collide after lowercasing
/// overwrite in encounter order.
pub fn to_lowercase_keys(headers: &Headers) -> Headers {
    headers
        .iter()
        .map(|(name, value)| (name.to_lowercase(), value.clone()))
        .collect()
}

/// Positional equality: `["a", "b"]` does not equal `["b", "a"]`.
pub fn headers_equal(actual: &HeaderValue, expected: &HeaderValue) -> bool {
    actual.as_slice() == expected.as_slice()
}
