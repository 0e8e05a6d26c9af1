//! Interception subsystem.
//!
//! # Data Flow
//! ```text
//! Caller
//!     → FetchSlot::call (or FetchMock::fetch in a sandbox)
//!     → normalize_request
//!     → MockHandler → FetchMock::handle
//!         → RouteRegistry::first_match
//!         → CallHistory::record
//!         → matched route response
//!           | fallback response
//!           | native fetch (spy)
//!           | NoFallback error
//! ```
//!
//! # Design Decisions
//! - The global fetch binding is an explicit `FetchSlot`, shared by `Arc`
//! - Engine state sits behind one mutex that is released before any await
//! - Restoring puts back exactly the binding captured at install

pub mod fetch_mock;
pub mod history;
pub mod network;
pub mod slot;

pub use fetch_mock::{FetchMock, MockConfig};
pub use history::{CallFilter, CallHistory, CallRecord};
pub use network::NetworkFetch;
pub use slot::{fetch_fn, Fetch, FetchRef, FetchSlot, Installation};
