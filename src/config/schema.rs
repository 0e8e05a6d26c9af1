//! Route-file schema.
//!
//! All types derive Serde traits for deserialization from TOML.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::http::headers::Headers;
use crate::http::response::ResponseConfig;
use crate::interception::fetch_mock::MockConfig;

/// Root of a route file.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouteFile {
    /// Engine-wide settings.
    pub settings: Settings,

    /// Routes, registered in file order.
    pub routes: Vec<RouteEntryConfig>,
}

/// Engine-wide settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Replace duplicate routes instead of rejecting them.
    pub overwrite_routes: bool,

    /// Warn whenever the fallback answers an unmatched call.
    pub warn_on_fallback: bool,

    /// Response for unmatched calls.
    pub fallback: Option<ResponseConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        let defaults = MockConfig::default();
        Self {
            overwrite_routes: defaults.overwrite_routes,
            warn_on_fallback: defaults.warn_on_fallback,
            fallback: None,
        }
    }
}

impl From<&Settings> for MockConfig {
    fn from(settings: &Settings) -> Self {
        MockConfig {
            overwrite_routes: settings.overwrite_routes,
            warn_on_fallback: settings.warn_on_fallback,
        }
    }
}

/// One `[[routes]]` entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteEntryConfig {
    /// Route name; doubles as its identifier.
    #[serde(default)]
    pub name: Option<String>,

    /// URL pattern (`begin:`, `end:`, `glob:`, `express:`, `path:`, `*`, or a URL).
    #[serde(default)]
    pub matcher: Option<String>,

    /// Regular expression tested against the normalized URL, instead of `matcher`.
    #[serde(default)]
    pub regex: Option<String>,

    pub response: ResponseConfig,

    #[serde(default)]
    pub method: Option<String>,

    #[serde(default)]
    pub query: Option<BTreeMap<String, String>>,

    #[serde(default)]
    pub headers: Option<Headers>,

    /// Number of calls the route answers before it stops matching.
    #[serde(default)]
    pub repeat: Option<u32>,

    /// Per-route override of `settings.overwrite_routes`.
    #[serde(default)]
    pub overwrite_routes: Option<bool>,
}
