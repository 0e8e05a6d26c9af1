//! Real network fetch, used as the binding a spying mock falls through to.

use std::time::Duration;

use futures_util::future::BoxFuture;

use crate::error::{MockError, Result};
use crate::http::headers::{to_mapping, HeaderSource};
use crate::http::request::NormalizedRequest;
use crate::http::response::MockResponse;
use crate::interception::slot::Fetch;

/// Fetch over HTTP with a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct NetworkFetch {
    client: reqwest::Client,
}

impl NetworkFetch {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    async fn send(&self, request: NormalizedRequest) -> Result<MockResponse> {
        let method = reqwest::Method::from_bytes(request.method().as_bytes())
            .map_err(|e| MockError::Network(format!("invalid method: {}", e)))?;

        let mut builder = self.client.request(method, request.url.as_str());
        if let Some(headers) = &request.options.headers {
            for (name, value) in headers.iter() {
                for single in value.as_slice() {
                    builder = builder.header(name, single.as_str());
                }
            }
        }
        if let Some(body) = &request.options.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = to_mapping(HeaderSource::Raw(response.headers()));
        let body = response.text().await?;

        tracing::debug!(url = %request.url, status, "Passed through to network");

        Ok(MockResponse {
            status,
            headers,
            body: Some(body),
        })
    }
}

impl Fetch for NetworkFetch {
    fn fetch(&self, request: NormalizedRequest) -> BoxFuture<'_, Result<MockResponse>> {
        Box::pin(self.send(request))
    }
}
