//! Request normalization.
//!
//! # Responsibilities
//! - Accept the argument shapes a fetch call can receive
//! - Produce a `NormalizedRequest` with a canonical URL and header map
//! - Reject unrecognized shapes before any partial result exists
//!
//! # Design Decisions
//! - Input kinds are an explicit enum; dynamic values are probed in a fixed order
//! - Rich requests are detected by capability (`RichRequest`), not by concrete type
//! - The original rich request is shared, never mutated

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{MockError, Result};
use crate::http::headers::{to_mapping, HeaderSource, HeaderValue, Headers};
use crate::http::url::normalize_url;

/// Anything exposing a URL, a method and headers.
pub trait RichRequest: Send + Sync {
    fn url(&self) -> String;
    fn method(&self) -> String;
    fn header_source(&self) -> HeaderSource<'_>;
}

impl<B: Send + Sync> RichRequest for http::Request<B> {
    fn url(&self) -> String {
        http::Request::uri(self).to_string()
    }

    fn method(&self) -> String {
        http::Request::method(self).as_str().to_string()
    }

    fn header_source(&self) -> HeaderSource<'_> {
        HeaderSource::Raw(http::Request::headers(self))
    }
}

/// Per-call options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Headers>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<HeaderValue>) -> Self {
        self.headers.get_or_insert_with(Headers::new).insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// First argument of a fetch call.
#[derive(Clone)]
pub enum FetchInput {
    /// A URL string.
    Url(String),
    /// A parsed URL object.
    Href(url::Url),
    /// A rich request carrying its own method and headers.
    Request(Arc<dyn RichRequest>),
    /// An untyped value, probed as string, then `href`-bearing object.
    Dynamic(Value),
}

impl From<&str> for FetchInput {
    fn from(url: &str) -> Self {
        FetchInput::Url(url.to_string())
    }
}

impl From<String> for FetchInput {
    fn from(url: String) -> Self {
        FetchInput::Url(url)
    }
}

impl From<url::Url> for FetchInput {
    fn from(url: url::Url) -> Self {
        FetchInput::Href(url)
    }
}

impl From<Value> for FetchInput {
    fn from(value: Value) -> Self {
        FetchInput::Dynamic(value)
    }
}

impl<B: Send + Sync + 'static> From<http::Request<B>> for FetchInput {
    fn from(request: http::Request<B>) -> Self {
        FetchInput::Request(Arc::new(request))
    }
}

/// A fetch call reduced to a comparable form.
#[derive(Clone)]
pub struct NormalizedRequest {
    pub url: String,
    pub options: RequestOptions,
    pub request: Option<Arc<dyn RichRequest>>,
}

impl NormalizedRequest {
    /// Uppercase method, `GET` when none was given.
    pub fn method(&self) -> String {
        self.options
            .method
            .as_deref()
            .unwrap_or("GET")
            .to_uppercase()
    }
}

impl fmt::Debug for NormalizedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NormalizedRequest")
            .field("url", &self.url)
            .field("options", &self.options)
            .field("request", &self.request.as_ref().map(|_| "<request>"))
            .finish()
    }
}

fn literal(url: &str, options: RequestOptions) -> NormalizedRequest {
    NormalizedRequest {
        url: normalize_url(url),
        options,
        request: None,
    }
}

/// Normalize the arguments of a fetch call.
///
/// For rich requests the per-call `options` are ignored; method and headers come
/// from the request, and `headers` is left unset when the request has none.
pub fn normalize_request(input: FetchInput, options: RequestOptions) -> Result<NormalizedRequest> {
    match input {
        FetchInput::Request(request) => {
            let headers = to_mapping(request.header_source());
            let options = RequestOptions {
                method: Some(request.method()),
                headers: (!headers.is_empty()).then_some(headers),
                body: None,
            };
            Ok(NormalizedRequest {
                url: normalize_url(&request.url()),
                options,
                request: Some(request),
            })
        }
        FetchInput::Url(url) => Ok(literal(&url, options)),
        FetchInput::Href(url) => Ok(literal(url.as_str(), options)),
        FetchInput::Dynamic(Value::String(url)) => Ok(literal(&url, options)),
        FetchInput::Dynamic(Value::Object(map)) => match map.get("href") {
            Some(Value::String(href)) => Ok(literal(href, options)),
            _ => Err(MockError::UnrecognizedRequest),
        },
        FetchInput::Dynamic(Value::Array(_)) => Err(MockError::UnrecognizedRequest),
        FetchInput::Dynamic(_) => Err(MockError::InvalidArguments),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_input_passes_options_through() {
        let options = RequestOptions::new().with_method("GET");
        let normalized = normalize_request("/foo".into(), options.clone()).unwrap();
        assert_eq!(normalized.url, "/foo");
        assert_eq!(normalized.options, options);
        assert!(normalized.options.headers.is_none());
        assert!(normalized.request.is_none());
    }

    #[test]
    fn test_url_object_uses_href() {
        let url = url::Url::parse("http://example.com").unwrap();
        let normalized = normalize_request(url.into(), RequestOptions::new()).unwrap();
        assert_eq!(normalized.url, "http://example.com/");

        let duck = json!({ "href": "http://example.com/a?b=1" });
        let normalized = normalize_request(duck.into(), RequestOptions::new()).unwrap();
        assert_eq!(normalized.url, "http://example.com/a?b=1");
    }

    #[test]
    fn test_rich_request_extracts_method_and_headers() {
        let request = http::Request::builder()
            .method("POST")
            .uri("http://example.com/users")
            .header("X-Token", "abc")
            .body(())
            .unwrap();
        let normalized = normalize_request(request.into(), RequestOptions::new().with_method("PUT")).unwrap();
        assert_eq!(normalized.url, "http://example.com/users");
        assert_eq!(normalized.options.method.as_deref(), Some("POST"));
        let headers = normalized.options.headers.as_ref().unwrap();
        assert_eq!(headers.get("x-token"), Some(&HeaderValue::from(vec!["abc"])));
        assert!(normalized.request.is_some());
    }

    #[test]
    fn test_rich_request_without_headers_omits_them() {
        let request = http::Request::builder()
            .uri("http://example.com")
            .body(())
            .unwrap();
        let normalized = normalize_request(request.into(), RequestOptions::new()).unwrap();
        assert_eq!(normalized.options.method.as_deref(), Some("GET"));
        assert!(normalized.options.headers.is_none());
    }

    #[test]
    fn test_unrecognized_object_shape() {
        for value in [json!({ "url": "/a" }), json!({ "href": 1 }), json!(["/a"])] {
            let err = normalize_request(value.into(), RequestOptions::new()).unwrap_err();
            assert!(matches!(err, MockError::UnrecognizedRequest));
        }
    }

    #[test]
    fn test_non_object_is_invalid() {
        for value in [json!(42), json!(null), json!(true)] {
            let err = normalize_request(value.into(), RequestOptions::new()).unwrap_err();
            assert!(matches!(err, MockError::InvalidArguments));
        }
    }

    #[test]
    fn test_method_defaults_to_get() {
        let normalized = normalize_request("/a".into(), RequestOptions::new()).unwrap();
        assert_eq!(normalized.method(), "GET");
        let normalized = normalize_request("/a".into(), RequestOptions::new().with_method("post")).unwrap();
        assert_eq!(normalized.method(), "POST");
    }
}
