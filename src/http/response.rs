//! Canned responses.
//!
//! Bodies are carried as opaque strings; no content encoding is applied.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::http::headers::{HeaderValue, Headers};
use crate::http::request::NormalizedRequest;

/// A response returned in place of a network call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockResponse {
    #[serde(default = "default_status")]
    pub status: u16,
    #[serde(default, skip_serializing_if = "Headers::is_empty")]
    pub headers: Headers,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

fn default_status() -> u16 {
    200
}

impl MockResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: None,
        }
    }

    /// `200` with a text body.
    pub fn text(body: impl Into<String>) -> Self {
        Self::new(200).with_body(body)
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<HeaderValue>) -> Self {
        self.headers.insert(name, value);
        self
    }
}

impl Default for MockResponse {
    fn default() -> Self {
        Self::new(200)
    }
}

/// Shape of a response in a route file: a status, a body, or a full table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseConfig {
    Status(u16),
    Body(String),
    Full(MockResponse),
}

impl From<ResponseConfig> for MockResponse {
    fn from(config: ResponseConfig) -> Self {
        match config {
            ResponseConfig::Status(status) => MockResponse::new(status),
            ResponseConfig::Body(body) => MockResponse::text(body),
            ResponseConfig::Full(response) => response,
        }
    }
}

type ResponseFn = dyn Fn(&NormalizedRequest) -> MockResponse + Send + Sync;

/// What a route answers with.
#[derive(Clone)]
pub enum ResponseSpec {
    Static(MockResponse),
    Dynamic(Arc<ResponseFn>),
}

impl ResponseSpec {
    /// Build a response computed from the incoming request.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&NormalizedRequest) -> MockResponse + Send + Sync + 'static,
    {
        ResponseSpec::Dynamic(Arc::new(f))
    }

    pub fn respond(&self, request: &NormalizedRequest) -> MockResponse {
        match self {
            ResponseSpec::Static(response) => response.clone(),
            ResponseSpec::Dynamic(f) => f(request),
        }
    }
}

impl fmt::Debug for ResponseSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseSpec::Static(response) => f.debug_tuple("Static").field(response).finish(),
            ResponseSpec::Dynamic(_) => f.write_str("Dynamic(<fn>)"),
        }
    }
}

impl From<MockResponse> for ResponseSpec {
    fn from(response: MockResponse) -> Self {
        ResponseSpec::Static(response)
    }
}

impl From<u16> for ResponseSpec {
    fn from(status: u16) -> Self {
        ResponseSpec::Static(MockResponse::new(status))
    }
}

impl From<&str> for ResponseSpec {
    fn from(body: &str) -> Self {
        ResponseSpec::Static(MockResponse::text(body))
    }
}

impl From<String> for ResponseSpec {
    fn from(body: String) -> Self {
        ResponseSpec::Static(MockResponse::text(body))
    }
}

impl From<ResponseConfig> for ResponseSpec {
    fn from(config: ResponseConfig) -> Self {
        ResponseSpec::Static(config.into())
    }
}
