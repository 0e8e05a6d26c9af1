//! The swappable fetch binding.
//!
//! # Responsibilities
//! - Hold whichever fetch implementation callers currently reach
//! - Swap the mock handler in and the original binding back out
//!
//! # Design Decisions
//! - The binding lives in an explicit `FetchSlot` handle, not a global
//! - The original binding is captured once, at install, and restored verbatim
//! - Install and uninstall are idempotent under an `active` flag

use std::sync::Arc;

use arc_swap::ArcSwap;
use futures_util::future::{self, BoxFuture};

use crate::error::Result;
use crate::http::request::{normalize_request, FetchInput, NormalizedRequest, RequestOptions};
use crate::http::response::MockResponse;

/// A fetch implementation.
pub trait Fetch: Send + Sync {
    fn fetch(&self, request: NormalizedRequest) -> BoxFuture<'_, Result<MockResponse>>;
}

pub type FetchRef = Arc<dyn Fetch>;

/// Adapts a synchronous closure into a `Fetch`.
pub struct FnFetch<F>(pub F);

impl<F> Fetch for FnFetch<F>
where
    F: Fn(NormalizedRequest) -> Result<MockResponse> + Send + Sync,
{
    fn fetch(&self, request: NormalizedRequest) -> BoxFuture<'_, Result<MockResponse>> {
        Box::pin(future::ready((self.0)(request)))
    }
}

/// Wrap a closure as a shareable fetch implementation.
pub fn fetch_fn<F>(f: F) -> FetchRef
where
    F: Fn(NormalizedRequest) -> Result<MockResponse> + Send + Sync + 'static,
{
    Arc::new(FnFetch(f))
}

/// Process-wide fetch binding, passed explicitly to whoever installs into it.
pub struct FetchSlot {
    current: ArcSwap<FetchRef>,
}

impl FetchSlot {
    pub fn new(fetch: FetchRef) -> Self {
        Self {
            current: ArcSwap::from_pointee(fetch),
        }
    }

    /// The implementation currently bound.
    pub fn current(&self) -> FetchRef {
        FetchRef::clone(&self.current.load_full())
    }

    /// Bind `fetch` and return what was bound before.
    pub fn replace(&self, fetch: FetchRef) -> FetchRef {
        FetchRef::clone(&self.current.swap(Arc::new(fetch)))
    }

    /// Make a call through whatever is currently bound.
    pub async fn call(&self, input: FetchInput, options: RequestOptions) -> Result<MockResponse> {
        let request = normalize_request(input, options)?;
        let fetch = self.current();
        fetch.fetch(request).await
    }
}

/// Install state for one slot.
pub struct Installation {
    slot: Arc<FetchSlot>,
    original: Option<FetchRef>,
    active: bool,
}

impl Installation {
    pub fn new(slot: Arc<FetchSlot>) -> Self {
        Self {
            slot,
            original: None,
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Bind `handler`, remembering the original binding. Returns false if already installed.
    pub fn install(&mut self, handler: FetchRef) -> bool {
        if self.active {
            return false;
        }
        let original = self.slot.replace(handler);
        self.original.get_or_insert(original);
        self.active = true;
        tracing::debug!("Fetch handler installed");
        true
    }

    /// Put the original binding back. Returns false if nothing was installed.
    pub fn uninstall(&mut self) -> bool {
        if !self.active {
            return false;
        }
        if let Some(original) = self.original.take() {
            self.slot.replace(original);
        }
        self.active = false;
        tracing::debug!("Fetch handler uninstalled");
        true
    }

    /// The binding that answers calls the mock lets through.
    pub fn native(&self) -> FetchRef {
        match (&self.original, self.active) {
            (Some(original), true) => original.clone(),
            _ => self.slot.current(),
        }
    }
}
