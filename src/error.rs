//! Error types shared by the matching engine.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MockError>;

/// Failures raised by route registration and request handling.
///
/// Configuration errors (`InvalidRoute`, `DuplicateRoute`) leave the registry
/// untouched. Request errors are raised before any normalization result is
/// produced.
#[derive(Debug, Error)]
pub enum MockError {
    #[error("fetch-mock: invalid parameters passed to fetch-mock: {0}")]
    InvalidRoute(String),

    #[error(
        "fetch-mock: adding route {identifier} with same name or matcher as existing route. \
         See `overwrite_routes` option."
    )]
    DuplicateRoute { identifier: String },

    #[error(
        "fetch-mock: unrecognised Request object. Read the Config and Installation sections of the docs"
    )]
    UnrecognizedRequest,

    #[error("fetch-mock: invalid arguments passed to fetch")]
    InvalidArguments,

    #[error("fetch-mock: no fallback response defined for {method} to {url}")]
    NoFallback { method: String, url: String },

    #[error("fetch-mock: no native fetch available to spy on")]
    NoNativeFetch,

    #[error("fetch-mock: handler called after the mock was dropped")]
    Detached,

    #[error("network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for MockError {
    fn from(err: reqwest::Error) -> Self {
        MockError::Network(err.to_string())
    }
}
