//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Registry, engine and slot produce:
//!     → tracing events with structured fields (route, url, method, index)
//!
//! Binary installs:
//!     → logging.rs (EnvFilter + fmt layer)
//! ```
//!
//! # Design Decisions
//! - The library only emits events; installing a subscriber is left to the binary
//! - `RUST_LOG` overrides the configured level

pub mod logging;

pub use logging::init_logging;
