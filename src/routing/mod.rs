//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Registration:
//!     RouteConfig (matcher, response, options)
//!     → route.rs (compile: identifier, method, matcher chain)
//!     → registry.rs (duplicate check → append | replace | reject)
//!
//! Incoming Request (NormalizedRequest):
//!     → registry.rs (first_match, in registration order)
//!     → matcher.rs (url, method, headers, query)
//!     → Return: matched CompiledRoute or None
//! ```
//!
//! # Design Decisions
//! - Routes are compiled once, at registration
//! - Uncompiled and compiled forms are stored together and never drift apart
//! - First match wins (registration order)

pub mod matcher;
pub mod registry;
pub mod route;

pub use matcher::{compile_url_matcher, Matcher, UrlMatcher};
pub use registry::{Registration, RouteEntry, RouteRegistry};
pub use route::{compile, CompiledRoute, RouteConfig};
