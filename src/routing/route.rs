//! Route definitions and compilation.
//!
//! # Responsibilities
//! - Hold a route exactly as the caller supplied it (`RouteConfig`)
//! - Compile it into a matching-ready `CompiledRoute`
//! - Track how many calls a route has answered against its `repeat` budget
//!
//! # Design Decisions
//! - Compilation is deterministic and side-effect free
//! - The identifier is the route name, else the canonical matcher text
//! - Methods are stored uppercase so `get` and `GET` compare equal

use std::collections::BTreeMap;

use crate::error::{MockError, Result};
use crate::http::headers::{HeaderValue, Headers};
use crate::http::request::NormalizedRequest;
use crate::http::response::ResponseSpec;
use crate::routing::matcher::{
    compile_url_matcher, AndMatcher, HeaderMatcher, Matcher, MethodMatcher, QueryMatcher,
    UrlMatcher,
};

/// A route as supplied by the registering caller.
#[derive(Debug, Clone, Default)]
pub struct RouteConfig {
    pub name: Option<String>,
    pub matcher: Option<UrlMatcher>,
    pub response: Option<ResponseSpec>,
    pub method: Option<String>,
    pub query: Option<BTreeMap<String, String>>,
    pub headers: Option<Headers>,
    pub repeat: Option<u32>,
    pub overwrite_routes: Option<bool>,
}

impl RouteConfig {
    pub fn new(matcher: impl Into<UrlMatcher>, response: impl Into<ResponseSpec>) -> Self {
        Self {
            matcher: Some(matcher.into()),
            response: Some(response.into()),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<HeaderValue>) -> Self {
        self.headers.get_or_insert_with(Headers::new).insert(name, value);
        self
    }

    pub fn with_repeat(mut self, repeat: u32) -> Self {
        self.repeat = Some(repeat);
        self
    }

    pub fn with_overwrite_routes(mut self, overwrite: bool) -> Self {
        self.overwrite_routes = Some(overwrite);
        self
    }

    /// Copy every option that is set on `options` onto this route.
    pub fn merge(mut self, options: RouteConfig) -> Self {
        if options.name.is_some() {
            self.name = options.name;
        }
        if options.method.is_some() {
            self.method = options.method;
        }
        if options.query.is_some() {
            self.query = options.query;
        }
        if options.headers.is_some() {
            self.headers = options.headers;
        }
        if options.repeat.is_some() {
            self.repeat = options.repeat;
        }
        if options.overwrite_routes.is_some() {
            self.overwrite_routes = options.overwrite_routes;
        }
        self
    }
}

/// The registry's matching-ready form of a `RouteConfig`.
#[derive(Debug)]
pub struct CompiledRoute {
    pub identifier: String,
    pub method: Option<String>,
    pub query: Option<BTreeMap<String, String>>,
    pub repeat: Option<u32>,
    pub overwrite_routes: Option<bool>,
    pub response: ResponseSpec,
    matcher: AndMatcher,
    calls: u32,
}

impl CompiledRoute {
    /// True when the request satisfies every condition and the repeat budget is not spent.
    pub fn matches(&self, req: &NormalizedRequest) -> bool {
        !self.is_exhausted() && self.matcher.matches(req)
    }

    /// True once a positive `repeat` budget is spent. A zero `repeat` sets no limit.
    pub fn is_exhausted(&self) -> bool {
        self.repeat
            .filter(|repeat| *repeat > 0)
            .is_some_and(|repeat| self.calls >= repeat)
    }

    /// Count one answered call.
    pub fn record_call(&mut self) {
        self.calls = self.calls.saturating_add(1);
    }

    pub fn calls(&self) -> u32 {
        self.calls
    }

    /// Clear the call counter.
    pub fn reset(&mut self) {
        self.calls = 0;
    }
}

/// Compile a route. Fails when it has no matcher or response, or when its pattern is invalid.
pub fn compile(route: &RouteConfig) -> Result<CompiledRoute> {
    let (matcher, response) = match (&route.matcher, &route.response) {
        (Some(matcher), Some(response)) if !matcher.is_empty() => (matcher, response),
        _ => {
            return Err(MockError::InvalidRoute(
                "a route needs both a matcher and a response".to_string(),
            ))
        }
    };

    let identifier = route
        .name
        .clone()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| matcher.describe());
    let method = route.method.as_ref().map(|m| m.to_uppercase());

    let mut chain = AndMatcher::new(vec![compile_url_matcher(matcher)?]);
    if let Some(method) = &method {
        chain.push(Box::new(MethodMatcher::new(method)));
    }
    if let Some(headers) = &route.headers {
        chain.push(Box::new(HeaderMatcher::new(headers)));
    }
    if let Some(query) = &route.query {
        chain.push(Box::new(QueryMatcher::new(query)));
    }

    Ok(CompiledRoute {
        identifier,
        method,
        query: route.query.clone(),
        repeat: route.repeat,
        overwrite_routes: route.overwrite_routes,
        response: response.clone(),
        matcher: chain,
        calls: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::request::{normalize_request, RequestOptions};

    fn req(url: &str, method: &str) -> NormalizedRequest {
        normalize_request(url.into(), RequestOptions::new().with_method(method)).unwrap()
    }

    #[test]
    fn test_identifier_prefers_name() {
        let named = compile(&RouteConfig::new("/a", 200u16).with_name("list")).unwrap();
        assert_eq!(named.identifier, "list");

        let unnamed = compile(&RouteConfig::new("http://A.com", 200u16)).unwrap();
        assert_eq!(unnamed.identifier, "http://a.com/");
    }

    #[test]
    fn test_missing_matcher_or_response_is_invalid() {
        let no_response = RouteConfig {
            matcher: Some("/a".into()),
            ..RouteConfig::default()
        };
        assert!(matches!(compile(&no_response), Err(MockError::InvalidRoute(_))));
        assert!(matches!(compile(&RouteConfig::new("", 200u16)), Err(MockError::InvalidRoute(_))));
    }

    #[test]
    fn test_method_is_uppercased_and_matched() {
        let route = compile(&RouteConfig::new("/a", 200u16).with_method("post")).unwrap();
        assert_eq!(route.method.as_deref(), Some("POST"));
        assert!(route.matches(&req("/a", "POST")));
        assert!(!route.matches(&req("/a", "GET")));
    }

    #[test]
    fn test_repeat_budget_and_reset() {
        let mut route = compile(&RouteConfig::new("/a", 200u16).with_repeat(2)).unwrap();
        let request = req("/a", "GET");
        assert!(route.matches(&request));
        route.record_call();
        route.record_call();
        assert!(route.is_exhausted());
        assert!(!route.matches(&request));
        route.reset();
        assert_eq!(route.calls(), 0);
        assert!(route.matches(&request));
    }

    #[test]
    fn test_zero_repeat_is_unlimited() {
        let mut route = compile(&RouteConfig::new("/a", 200u16).with_repeat(0)).unwrap();
        let request = req("/a", "GET");
        for _ in 0..3 {
            assert!(route.matches(&request));
            route.record_call();
        }
        assert!(!route.is_exhausted());
    }

    #[test]
    fn test_merge_overrides_only_set_fields() {
        let route = RouteConfig::new("/a", 200u16)
            .with_method("GET")
            .merge(RouteConfig::default().with_repeat(1));
        assert_eq!(route.method.as_deref(), Some("GET"));
        assert_eq!(route.repeat, Some(1));
    }
}
