//! Route-file configuration.
//!
//! # Data Flow
//! ```text
//! routes.toml
//!     → loader.rs (read & deserialize)
//!     → validation.rs (semantic checks, all errors collected)
//!     → RouteFile (validated)
//!     → loader.rs::build_mock (register every route on a FetchMock)
//! ```
//!
//! # Design Decisions
//! - Every field has a default so a file can be as small as one route
//! - Validation separates syntactic (serde) from semantic checks
//! - Registration errors (duplicates, bad regex) surface as `ConfigError::Route`

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{build_mock, load_config, ConfigError};
pub use schema::{RouteEntryConfig, RouteFile, Settings};
pub use validation::{validate_config, ValidationError};
