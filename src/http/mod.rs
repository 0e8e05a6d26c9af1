//! HTTP value canonicalization.
//!
//! # Data Flow
//! ```text
//! fetch(input, options)
//!     → request.rs (probe input shape, build NormalizedRequest)
//!         → url.rs (canonical URL string)
//!         → headers.rs (ordered header map)
//!     → [routing layer evaluates compiled routes]
//!     → response.rs (canned response for the matched route)
//! ```

pub mod headers;
pub mod request;
pub mod response;
pub mod url;

pub use headers::{HeaderSource, HeaderValue, Headers};
pub use request::{normalize_request, FetchInput, NormalizedRequest, RequestOptions, RichRequest};
pub use response::{MockResponse, ResponseConfig, ResponseSpec};
pub use self::url::{get_path, get_query, normalize_url};
