//! Request matching engine for mocking HTTP fetch calls in tests.

pub mod config;
pub mod error;
pub mod http;
pub mod interception;
pub mod observability;
pub mod routing;

pub use config::schema::RouteFile;
pub use error::{MockError, Result};
pub use crate::http::{normalize_request, normalize_url, FetchInput, MockResponse, NormalizedRequest, RequestOptions};
pub use interception::{CallFilter, FetchMock, FetchSlot, MockConfig};
pub use routing::{RouteConfig, UrlMatcher};
