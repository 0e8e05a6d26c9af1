//! The public mocking surface.
//!
//! # Responsibilities
//! - Register routes (`mock`, `once`, per-method helpers)
//! - Configure the fallback (`catch`, `spy`)
//! - Answer fetch calls from the registry and record them
//! - Reset behavior and history, and restore the original fetch binding
//!
//! # Design Decisions
//! - `FetchMock` is a cheap handle; all state sits behind one mutex
//! - The mutex is never held across an `.await`
//! - Installation into a `FetchSlot` happens on first registration
//! - Without a slot the mock runs sandboxed and only answers direct calls
//! - Dropping the last handle restores the slot's original binding

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use futures_util::future::BoxFuture;

use crate::error::{MockError, Result};
use crate::http::request::{normalize_request, FetchInput, NormalizedRequest, RequestOptions};
use crate::http::response::{MockResponse, ResponseSpec};
use crate::interception::history::{CallFilter, CallHistory, CallRecord};
use crate::interception::slot::{Fetch, FetchRef, FetchSlot, Installation};
use crate::routing::matcher::UrlMatcher;
use crate::routing::registry::{Registration, RouteRegistry};
use crate::routing::route::{CompiledRoute, RouteConfig};

/// Engine-wide settings.
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Replace duplicate routes instead of rejecting them, for routes that do not say.
    pub overwrite_routes: bool,
    /// Log a warning whenever an unmatched call is answered by the fallback.
    pub warn_on_fallback: bool,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            overwrite_routes: false,
            warn_on_fallback: true,
        }
    }
}

#[derive(Clone)]
enum Fallback {
    Response(ResponseSpec),
    Native(FetchRef),
}

struct MockState {
    registry: RouteRegistry,
    fallback: Option<Fallback>,
    history: CallHistory,
    installation: Option<Installation>,
    native_fetch: Option<FetchRef>,
}

struct Inner {
    config: MockConfig,
    state: Mutex<MockState>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Ok(state) = self.state.get_mut() {
            if let Some(installation) = state.installation.as_mut() {
                installation.uninstall();
            }
        }
    }
}

/// Handle to a mock fetch engine. Clones share state.
#[derive(Clone)]
pub struct FetchMock {
    inner: Arc<Inner>,
}

/// The handler bound into a slot. Holds the engine weakly so the slot does not keep it alive.
struct MockHandler {
    inner: Weak<Inner>,
}

impl Fetch for MockHandler {
    fn fetch(&self, request: NormalizedRequest) -> BoxFuture<'_, Result<MockResponse>> {
        let engine = self.inner.upgrade().map(|inner| FetchMock { inner });
        Box::pin(async move {
            match engine {
                Some(engine) => engine.handle(request).await,
                None => Err(MockError::Detached),
            }
        })
    }
}

impl FetchMock {
    /// A sandboxed engine: answers calls made through it, installs nowhere.
    pub fn new(config: MockConfig) -> Self {
        Self::build(config, None)
    }

    /// An engine that installs itself into `slot` on first registration.
    pub fn with_slot(config: MockConfig, slot: Arc<FetchSlot>) -> Self {
        Self::build(config, Some(Installation::new(slot)))
    }

    fn build(config: MockConfig, installation: Option<Installation>) -> Self {
        let state = MockState {
            registry: RouteRegistry::new(config.overwrite_routes),
            fallback: None,
            history: CallHistory::default(),
            installation,
            native_fetch: None,
        };
        Self {
            inner: Arc::new(Inner {
                config,
                state: Mutex::new(state),
            }),
        }
    }

    /// Set the implementation `spy` falls through to when no slot provides one.
    pub fn with_native_fetch(self, fetch: FetchRef) -> Self {
        self.state().native_fetch = Some(fetch);
        self
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner
            .state
            .lock()
            .expect("fetch-mock state mutex poisoned")
    }

    pub fn config(&self) -> &MockConfig {
        &self.inner.config
    }

    /// Install the handler into the slot, if there is one and it is not installed yet.
    fn activate(&self, state: &mut MockState) {
        if let Some(installation) = state.installation.as_mut() {
            let handler: FetchRef = Arc::new(MockHandler {
                inner: Arc::downgrade(&self.inner),
            });
            installation.install(handler);
        }
    }

    /// True while the handler is bound into the slot.
    pub fn is_active(&self) -> bool {
        self.state()
            .installation
            .as_ref()
            .is_some_and(Installation::is_active)
    }

    /// Register a route built from a matcher, a response and extra options.
    pub fn mock(
        &self,
        matcher: impl Into<UrlMatcher>,
        response: impl Into<ResponseSpec>,
        options: RouteConfig,
    ) -> Result<&Self> {
        self.mock_route(RouteConfig::new(matcher, response).merge(options))
    }

    /// Register a fully specified route.
    pub fn mock_route(&self, route: RouteConfig) -> Result<&Self> {
        let mut state = self.state();
        match state.registry.add_route(route)? {
            Registration::Added { index } | Registration::Replaced { index } => {
                tracing::trace!(index, routes = state.registry.len(), "Registry updated");
            }
        }
        self.activate(&mut state);
        Ok(self)
    }

    /// Register a route that answers a single call.
    pub fn once(
        &self,
        matcher: impl Into<UrlMatcher>,
        response: impl Into<ResponseSpec>,
        options: RouteConfig,
    ) -> Result<&Self> {
        self.mock(matcher, response, options.with_repeat(1))
    }

    fn verb(
        &self,
        method: &str,
        matcher: UrlMatcher,
        response: ResponseSpec,
        options: RouteConfig,
        once: bool,
    ) -> Result<&Self> {
        let options = options.with_method(method);
        if once {
            self.once(matcher, response, options)
        } else {
            self.mock(matcher, response, options)
        }
    }

    pub fn get(
        &self,
        matcher: impl Into<UrlMatcher>,
        response: impl Into<ResponseSpec>,
        options: RouteConfig,
    ) -> Result<&Self> {
        self.verb("GET", matcher.into(), response.into(), options, false)
    }

    pub fn get_once(
        &self,
        matcher: impl Into<UrlMatcher>,
        response: impl Into<ResponseSpec>,
        options: RouteConfig,
    ) -> Result<&Self> {
        self.verb("GET", matcher.into(), response.into(), options, true)
    }

    pub fn post(
        &self,
        matcher: impl Into<UrlMatcher>,
        response: impl Into<ResponseSpec>,
        options: RouteConfig,
    ) -> Result<&Self> {
        self.verb("POST", matcher.into(), response.into(), options, false)
    }

    pub fn post_once(
        &self,
        matcher: impl Into<UrlMatcher>,
        response: impl Into<ResponseSpec>,
        options: RouteConfig,
    ) -> Result<&Self> {
        self.verb("POST", matcher.into(), response.into(), options, true)
    }

    pub fn put(
        &self,
        matcher: impl Into<UrlMatcher>,
        response: impl Into<ResponseSpec>,
        options: RouteConfig,
    ) -> Result<&Self> {
        self.verb("PUT", matcher.into(), response.into(), options, false)
    }

    pub fn put_once(
        &self,
        matcher: impl Into<UrlMatcher>,
        response: impl Into<ResponseSpec>,
        options: RouteConfig,
    ) -> Result<&Self> {
        self.verb("PUT", matcher.into(), response.into(), options, true)
    }

    pub fn delete(
        &self,
        matcher: impl Into<UrlMatcher>,
        response: impl Into<ResponseSpec>,
        options: RouteConfig,
    ) -> Result<&Self> {
        self.verb("DELETE", matcher.into(), response.into(), options, false)
    }

    pub fn delete_once(
        &self,
        matcher: impl Into<UrlMatcher>,
        response: impl Into<ResponseSpec>,
        options: RouteConfig,
    ) -> Result<&Self> {
        self.verb("DELETE", matcher.into(), response.into(), options, true)
    }

    pub fn head(
        &self,
        matcher: impl Into<UrlMatcher>,
        response: impl Into<ResponseSpec>,
        options: RouteConfig,
    ) -> Result<&Self> {
        self.verb("HEAD", matcher.into(), response.into(), options, false)
    }

    pub fn head_once(
        &self,
        matcher: impl Into<UrlMatcher>,
        response: impl Into<ResponseSpec>,
        options: RouteConfig,
    ) -> Result<&Self> {
        self.verb("HEAD", matcher.into(), response.into(), options, true)
    }

    pub fn patch(
        &self,
        matcher: impl Into<UrlMatcher>,
        response: impl Into<ResponseSpec>,
        options: RouteConfig,
    ) -> Result<&Self> {
        self.verb("PATCH", matcher.into(), response.into(), options, false)
    }

    pub fn patch_once(
        &self,
        matcher: impl Into<UrlMatcher>,
        response: impl Into<ResponseSpec>,
        options: RouteConfig,
    ) -> Result<&Self> {
        self.verb("PATCH", matcher.into(), response.into(), options, true)
    }

    fn set_fallback(&self, state: &mut MockState, fallback: Fallback) {
        if state.fallback.is_some() {
            tracing::warn!("catch() called twice, previous fallback response overwritten");
        }
        state.fallback = Some(fallback);
        self.activate(state);
    }

    /// Answer every unmatched call with `response`. A second call replaces the first.
    pub fn catch(&self, response: impl Into<ResponseSpec>) -> &Self {
        let mut state = self.state();
        self.set_fallback(&mut state, Fallback::Response(response.into()));
        self
    }

    /// `catch` with a plain `200 ok` response.
    pub fn catch_default(&self) -> &Self {
        self.catch("ok")
    }

    /// Let unmatched calls through to the native fetch.
    pub fn spy(&self) -> Result<&Self> {
        let mut state = self.state();
        self.activate(&mut state);
        let native = match (&state.installation, &state.native_fetch) {
            (Some(installation), _) => installation.native(),
            (None, Some(native)) => native.clone(),
            (None, None) => return Err(MockError::NoNativeFetch),
        };
        self.set_fallback(&mut state, Fallback::Native(native));
        Ok(self)
    }

    /// Drop every route and the fallback, and restore the original fetch binding.
    pub fn reset_behavior(&self) -> &Self {
        let mut state = self.state();
        if let Some(installation) = state.installation.as_mut() {
            installation.uninstall();
        }
        state.fallback = None;
        state.registry.clear();
        self
    }

    /// Forget recorded calls and reset every route's call counter. Routes stay registered.
    pub fn reset_history(&self) -> &Self {
        let mut state = self.state();
        state.history.clear();
        state.registry.reset_counters();
        self
    }

    /// `reset_behavior` followed by `reset_history`.
    pub fn restore(&self) -> &Self {
        self.reset_behavior();
        self.reset_history()
    }

    /// Alias of `restore`.
    pub fn reset(&self) -> &Self {
        self.restore()
    }

    /// Handle a fetch call.
    pub async fn fetch(
        &self,
        input: impl Into<FetchInput>,
        options: RequestOptions,
    ) -> Result<MockResponse> {
        let request = normalize_request(input.into(), options)?;
        self.handle(request).await
    }

    /// Answer an already normalized request.
    pub async fn handle(&self, request: NormalizedRequest) -> Result<MockResponse> {
        let (matched, fallback) = {
            let mut state = self.state();
            let matched = state
                .registry
                .first_match(&request)
                .map(|route| (route.identifier.clone(), route.response.clone()));
            state.history.record(CallRecord {
                url: request.url.clone(),
                options: request.options.clone(),
                route: matched.as_ref().map(|(identifier, _)| identifier.clone()),
            });
            let fallback = if matched.is_none() {
                state.fallback.clone()
            } else {
                None
            };
            (matched, fallback)
        };

        if let Some((identifier, response)) = matched {
            tracing::debug!(route = %identifier, url = %request.url, "Call matched");
            return Ok(response.respond(&request));
        }

        match fallback {
            Some(fallback) => {
                if self.inner.config.warn_on_fallback {
                    tracing::warn!(
                        method = %request.method(),
                        url = %request.url,
                        "Unmatched call answered by fallback"
                    );
                }
                match fallback {
                    Fallback::Response(response) => Ok(response.respond(&request)),
                    Fallback::Native(native) => native.fetch(request).await,
                }
            }
            None => Err(MockError::NoFallback {
                method: request.method(),
                url: request.url,
            }),
        }
    }

    /// Recorded calls selected by `filter`.
    pub fn calls(&self, filter: CallFilter<'_>) -> Vec<CallRecord> {
        self.state().history.calls(filter)
    }

    pub fn called(&self, filter: CallFilter<'_>) -> bool {
        !self.calls(filter).is_empty()
    }

    pub fn last_call(&self, filter: CallFilter<'_>) -> Option<CallRecord> {
        self.state().history.last(filter)
    }

    pub fn last_url(&self, filter: CallFilter<'_>) -> Option<String> {
        self.last_call(filter).map(|call| call.url)
    }

    pub fn last_options(&self, filter: CallFilter<'_>) -> Option<RequestOptions> {
        self.last_call(filter).map(|call| call.options)
    }

    /// True when every route has been called its expected number of times:
    /// its full `repeat` budget, or at least once when it has none.
    pub fn done(&self) -> bool {
        self.state().registry.routes().all(route_done)
    }

    /// Identifiers of the registered routes, in order.
    pub fn route_identifiers(&self) -> Vec<String> {
        self.state()
            .registry
            .routes()
            .map(|route| route.identifier.clone())
            .collect()
    }

    pub fn route_count(&self) -> usize {
        self.state().registry.len()
    }
}

fn route_done(route: &CompiledRoute) -> bool {
    match route.repeat {
        Some(repeat) if repeat > 0 => route.calls() >= repeat,
        _ => route.calls() > 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interception::slot::fetch_fn;

    fn sandbox() -> FetchMock {
        FetchMock::new(MockConfig::default())
    }

    fn opts() -> RouteConfig {
        RouteConfig::default()
    }

    #[tokio::test]
    async fn test_matched_route_answers() {
        let fm = sandbox();
        fm.mock("http://a.com/users", MockResponse::text("[]"), opts()).unwrap();
        let response = fm.fetch("http://a.com/users", RequestOptions::new()).await.unwrap();
        assert_eq!(response, MockResponse::text("[]"));
        assert!(fm.called(CallFilter::Route("http://a.com/users")));
    }

    #[tokio::test]
    async fn test_unmatched_without_fallback_fails() {
        let fm = sandbox();
        fm.mock("/a", 200u16, opts()).unwrap();
        let err = fm.fetch("/b", RequestOptions::new()).await.unwrap_err();
        assert!(matches!(err, MockError::NoFallback { ref url, .. } if url == "/b"));
        assert!(fm.called(CallFilter::Unmatched));
    }

    #[tokio::test]
    async fn test_catch_twice_keeps_last() {
        let fm = sandbox();
        fm.catch(404u16).catch(410u16);
        let response = fm.fetch("/nowhere", RequestOptions::new()).await.unwrap();
        assert_eq!(response.status, 410);
    }

    #[tokio::test]
    async fn test_catch_default_is_ok() {
        let fm = sandbox();
        fm.catch_default();
        let response = fm.fetch("/nowhere", RequestOptions::new()).await.unwrap();
        assert_eq!(response, MockResponse::text("ok"));
    }

    #[tokio::test]
    async fn test_once_then_fallback_then_reset_history() {
        let fm = sandbox();
        fm.once("/a", 201u16, opts()).unwrap().catch(404u16);

        assert_eq!(fm.fetch("/a", RequestOptions::new()).await.unwrap().status, 201);
        assert_eq!(fm.fetch("/a", RequestOptions::new()).await.unwrap().status, 404);
        assert!(fm.done());

        fm.reset_history();
        assert!(!fm.called(CallFilter::All));
        assert_eq!(fm.route_count(), 1);
        assert_eq!(fm.fetch("/a", RequestOptions::new()).await.unwrap().status, 201);
    }

    #[tokio::test]
    async fn test_verb_helpers_force_method() {
        let fm = sandbox();
        fm.get("/users", 200u16, opts()).unwrap();
        fm.post("/users", 201u16, opts()).unwrap();
        fm.delete_once("/users", 204u16, opts()).unwrap();
        assert_eq!(fm.route_count(), 3);

        let post = RequestOptions::new().with_method("post");
        assert_eq!(fm.fetch("/users", post).await.unwrap().status, 201);
        assert_eq!(fm.fetch("/users", RequestOptions::new()).await.unwrap().status, 200);
        let delete = RequestOptions::new().with_method("DELETE");
        assert_eq!(fm.fetch("/users", delete.clone()).await.unwrap().status, 204);
        assert!(fm.fetch("/users", delete).await.is_err());
    }

    #[tokio::test]
    async fn test_dynamic_response_sees_request() {
        let fm = sandbox();
        fm.mock(
            "begin:/echo",
            ResponseSpec::from_fn(|req| MockResponse::text(req.url.clone())),
            opts(),
        )
        .unwrap();
        let response = fm.fetch("/echo/1", RequestOptions::new()).await.unwrap();
        assert_eq!(response.body.as_deref(), Some("/echo/1"));
    }

    #[tokio::test]
    async fn test_spy_in_sandbox_needs_native_fetch() {
        let fm = sandbox();
        assert!(matches!(fm.spy(), Err(MockError::NoNativeFetch)));

        let fm = sandbox().with_native_fetch(fetch_fn(|_| Ok(MockResponse::new(299))));
        fm.spy().unwrap();
        assert_eq!(fm.fetch("/real", RequestOptions::new()).await.unwrap().status, 299);
    }

    #[tokio::test]
    async fn test_reset_behavior_clears_routes_and_fallback() {
        let fm = sandbox();
        fm.mock("/a", 200u16, opts()).unwrap().catch(404u16);
        fm.reset_behavior();
        assert_eq!(fm.route_count(), 0);
        assert!(fm.fetch("/a", RequestOptions::new()).await.is_err());
    }

    #[tokio::test]
    async fn test_invalid_route_does_not_register() {
        let fm = sandbox();
        assert!(matches!(fm.mock_route(RouteConfig::default()), Err(MockError::InvalidRoute(_))));
        assert_eq!(fm.route_count(), 0);
    }

    #[tokio::test]
    async fn test_zero_repeat_replacement_still_answers() {
        let fm = sandbox();
        fm.mock("/a", 200u16, opts()).unwrap();
        fm.mock("/a", 201u16, opts().with_repeat(0).with_overwrite_routes(true))
            .unwrap();
        assert_eq!(fm.route_count(), 1);
        assert_eq!(fm.fetch("/a", RequestOptions::new()).await.unwrap().status, 201);
        assert!(fm.done());
    }

    #[test]
    fn test_done_requires_every_route() {
        let fm = sandbox();
        fm.mock("/a", 200u16, opts()).unwrap();
        assert!(!fm.done());
    }
}
