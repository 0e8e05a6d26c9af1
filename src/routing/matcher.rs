//! Route matching logic.
//!
//! # Responsibilities
//! - Compile a route's URL matcher into a matching strategy
//! - Match method (case-insensitive), headers and query parameters
//! - Combine conditions with AND semantics
//!
//! # Design Decisions
//! - Header names are compared case-insensitively, values positionally
//! - Patterns are compiled once, at registration
//! - A missing request method counts as `GET`

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use globset::GlobBuilder;
use regex::Regex;

use crate::error::{MockError, Result};
use crate::http::headers::{headers_equal, to_lowercase_keys, Headers};
use crate::http::request::NormalizedRequest;
use crate::http::url::{get_path, get_query_pairs, normalize_url};

type PredicateFn = dyn Fn(&NormalizedRequest) -> bool + Send + Sync;

/// The URL part of a route as supplied by the caller.
#[derive(Clone)]
pub enum UrlMatcher {
    /// Literal URL, `*`, or a prefixed pattern (`begin:`, `end:`, `glob:`, `express:`, `path:`).
    Url(String),
    Regex(Regex),
    Function(Arc<PredicateFn>),
}

impl UrlMatcher {
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&NormalizedRequest) -> bool + Send + Sync + 'static,
    {
        UrlMatcher::Function(Arc::new(f))
    }

    /// Canonical form. Regex, function and prefixed pattern matchers are returned as is.
    pub fn normalized(&self) -> UrlMatcher {
        match self {
            UrlMatcher::Url(url) => UrlMatcher::Url(normalize_url(url)),
            other => other.clone(),
        }
    }

    /// Text used to identify a route that has no name.
    pub fn describe(&self) -> String {
        match self {
            UrlMatcher::Url(url) => normalize_url(url),
            UrlMatcher::Regex(regex) => regex.as_str().to_string(),
            UrlMatcher::Function(f) => format!("function@{:p}", Arc::as_ptr(f)),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, UrlMatcher::Url(url) if url.is_empty())
    }
}

impl fmt::Debug for UrlMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlMatcher::Url(url) => f.debug_tuple("Url").field(url).finish(),
            UrlMatcher::Regex(regex) => f.debug_tuple("Regex").field(&regex.as_str()).finish(),
            UrlMatcher::Function(_) => f.write_str("Function(<fn>)"),
        }
    }
}

impl From<&str> for UrlMatcher {
    fn from(url: &str) -> Self {
        UrlMatcher::Url(url.to_string())
    }
}

impl From<String> for UrlMatcher {
    fn from(url: String) -> Self {
        UrlMatcher::Url(url)
    }
}

impl From<Regex> for UrlMatcher {
    fn from(regex: Regex) -> Self {
        UrlMatcher::Regex(regex)
    }
}

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches(&self, req: &NormalizedRequest) -> bool;
}

/// Matches every request (`*`).
#[derive(Debug, Clone)]
pub struct AnyMatcher;

impl Matcher for AnyMatcher {
    fn matches(&self, _req: &NormalizedRequest) -> bool {
        true
    }
}

/// Matches the canonical URL exactly.
#[derive(Debug, Clone)]
pub struct FullUrlMatcher {
    url: String,
}

impl FullUrlMatcher {
    pub fn new(url: &str) -> Self {
        Self {
            url: normalize_url(url),
        }
    }
}

impl Matcher for FullUrlMatcher {
    fn matches(&self, req: &NormalizedRequest) -> bool {
        req.url == self.url
    }
}

/// Matches the URL prefix (`begin:`).
#[derive(Debug, Clone)]
pub struct BeginMatcher {
    prefix: String,
}

impl Matcher for BeginMatcher {
    fn matches(&self, req: &NormalizedRequest) -> bool {
        req.url.starts_with(&self.prefix)
    }
}

/// Matches the URL suffix (`end:`).
#[derive(Debug, Clone)]
pub struct EndMatcher {
    suffix: String,
}

impl Matcher for EndMatcher {
    fn matches(&self, req: &NormalizedRequest) -> bool {
        req.url.ends_with(&self.suffix)
    }
}

/// Matches the whole URL against a glob (`glob:`); `*` spans separators.
#[derive(Debug, Clone)]
pub struct GlobMatcher {
    glob: globset::GlobMatcher,
}

impl GlobMatcher {
    pub fn new(pattern: &str) -> Result<Self> {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(false)
            .build()
            .map_err(|e| MockError::InvalidRoute(format!("invalid glob `{pattern}`: {e}")))?;
        Ok(Self {
            glob: glob.compile_matcher(),
        })
    }
}

impl Matcher for GlobMatcher {
    fn matches(&self, req: &NormalizedRequest) -> bool {
        self.glob.is_match(&req.url)
    }
}

/// Matches the URL path against an express-style route (`express:`).
#[derive(Debug, Clone)]
pub struct ExpressMatcher {
    regex: Regex,
}

impl ExpressMatcher {
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(&express_to_regex(pattern))
            .map_err(|e| MockError::InvalidRoute(format!("invalid express route `{pattern}`: {e}")))?;
        Ok(Self { regex })
    }
}

impl Matcher for ExpressMatcher {
    fn matches(&self, req: &NormalizedRequest) -> bool {
        self.regex.is_match(&get_path(&req.url))
    }
}

fn param_name_end(chars: &[char], start: usize) -> usize {
    let mut end = start;
    while end < chars.len() && (chars[end].is_ascii_alphanumeric() || chars[end] == '_') {
        end += 1;
    }
    end
}

/// Translate `/users/:id/:tab?` style routes into an anchored, case-insensitive regex.
/// A trailing slash on the path is optional.
fn express_to_regex(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::from("(?i)^");
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '/' && chars.get(i + 1) == Some(&':') {
            let end = param_name_end(&chars, i + 2);
            if end > i + 2 {
                if chars.get(end) == Some(&'?') {
                    out.push_str("(?:/([^/]+?))?");
                    i = end + 1;
                } else {
                    out.push_str("/([^/]+?)");
                    i = end;
                }
                continue;
            }
        }
        if c == ':' {
            let end = param_name_end(&chars, i + 1);
            if end > i + 1 {
                out.push_str("([^/]+?)");
                i = end;
                continue;
            }
        }
        if c == '*' {
            out.push_str("(.*)");
        } else {
            out.push_str(&regex::escape(c.encode_utf8(&mut [0; 4])));
        }
        i += 1;
    }
    if !pattern.ends_with('/') {
        out.push_str("/?");
    }
    out.push('$');
    out
}

/// Matches the URL path exactly (`path:`).
/// The pattern is encoded the same way as the request path.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    path: String,
}

impl PathMatcher {
    pub fn new(path: &str) -> Self {
        Self {
            path: get_path(path),
        }
    }
}

impl Matcher for PathMatcher {
    fn matches(&self, req: &NormalizedRequest) -> bool {
        get_path(&req.url) == self.path
    }
}

/// Matches the URL against a regular expression.
#[derive(Debug, Clone)]
pub struct RegexMatcher {
    regex: Regex,
}

impl Matcher for RegexMatcher {
    fn matches(&self, req: &NormalizedRequest) -> bool {
        self.regex.is_match(&req.url)
    }
}

/// Delegates to a caller-supplied predicate.
#[derive(Clone)]
pub struct FunctionMatcher {
    predicate: Arc<PredicateFn>,
}

impl fmt::Debug for FunctionMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FunctionMatcher")
    }
}

impl Matcher for FunctionMatcher {
    fn matches(&self, req: &NormalizedRequest) -> bool {
        (self.predicate)(req)
    }
}

/// Matches the request method.
/// The method is normalized to uppercase.
#[derive(Debug, Clone)]
pub struct MethodMatcher {
    method: String,
}

impl MethodMatcher {
    pub fn new(method: &str) -> Self {
        Self {
            method: method.to_uppercase(),
        }
    }
}

impl Matcher for MethodMatcher {
    fn matches(&self, req: &NormalizedRequest) -> bool {
        req.method() == self.method
    }
}

/// Requires every expected header to be present with a positionally equal value.
#[derive(Debug, Clone)]
pub struct HeaderMatcher {
    expected: Headers,
}

impl HeaderMatcher {
    pub fn new(expected: &Headers) -> Self {
        Self {
            expected: to_lowercase_keys(expected),
        }
    }
}

impl Matcher for HeaderMatcher {
    fn matches(&self, req: &NormalizedRequest) -> bool {
        let actual = req
            .options
            .headers
            .as_ref()
            .map(to_lowercase_keys)
            .unwrap_or_default();
        self.expected.iter().all(|(name, value)| {
            actual
                .get(name)
                .is_some_and(|actual| headers_equal(actual, value))
        })
    }
}

/// Requires every expected query parameter to be present once with an equal value.
#[derive(Debug, Clone)]
pub struct QueryMatcher {
    expected: BTreeMap<String, String>,
}

impl QueryMatcher {
    pub fn new(expected: &BTreeMap<String, String>) -> Self {
        Self {
            expected: expected.clone(),
        }
    }
}

impl Matcher for QueryMatcher {
    fn matches(&self, req: &NormalizedRequest) -> bool {
        let pairs = get_query_pairs(&req.url);
        self.expected.iter().all(|(key, expected)| {
            let mut values = pairs.iter().filter(|(k, _)| k == key).map(|(_, v)| v);
            matches!((values.next(), values.next()), (Some(v), None) if v == expected)
        })
    }
}

/// Combines multiple matchers with AND semantics.
#[derive(Debug, Default)]
pub struct AndMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AndMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }

    pub fn push(&mut self, matcher: Box<dyn Matcher>) {
        self.matchers.push(matcher);
    }
}

impl Matcher for AndMatcher {
    fn matches(&self, req: &NormalizedRequest) -> bool {
        self.matchers.iter().all(|m| m.matches(req))
    }
}

/// Pick the matching strategy for a URL matcher.
pub fn compile_url_matcher(matcher: &UrlMatcher) -> Result<Box<dyn Matcher>> {
    let compiled: Box<dyn Matcher> = match matcher {
        UrlMatcher::Regex(regex) => Box::new(RegexMatcher {
            regex: regex.clone(),
        }),
        UrlMatcher::Function(predicate) => Box::new(FunctionMatcher {
            predicate: predicate.clone(),
        }),
        UrlMatcher::Url(url) if url == "*" => Box::new(AnyMatcher),
        UrlMatcher::Url(url) => {
            if let Some(prefix) = url.strip_prefix("begin:") {
                Box::new(BeginMatcher {
                    prefix: prefix.to_string(),
                })
            } else if let Some(suffix) = url.strip_prefix("end:") {
                Box::new(EndMatcher {
                    suffix: suffix.to_string(),
                })
            } else if let Some(pattern) = url.strip_prefix("glob:") {
                Box::new(GlobMatcher::new(pattern)?)
            } else if let Some(pattern) = url.strip_prefix("express:") {
                Box::new(ExpressMatcher::new(pattern)?)
            } else if let Some(path) = url.strip_prefix("path:") {
                Box::new(PathMatcher::new(path))
            } else {
                Box::new(FullUrlMatcher::new(url))
            }
        }
    };
    Ok(compiled)
}
