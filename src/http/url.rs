//! URL canonicalization.
//!
//! # Responsibilities
//! - Produce a canonical string for absolute and relative URLs
//! - Pass matcher patterns (`begin:`, `end:`, `glob:`, `express:`, `path:`) through untouched
//! - Extract the path and query of a URL for path/query matchers
//!
//! # Design Decisions
//! - Scheme and host are canonicalized with the `url` crate (lowercase, default port dropped)
//! - The path is kept as written unless it needs rooting or contains traversal segments
//! - Traversal paths are rebuilt with path-join rules
//! - An absolute URL containing `..` loses its query string; relative URLs keep it

use url::Url;

/// Prefixes that mark a string as a matcher pattern rather than a literal URL.
pub const PATTERN_PREFIXES: [&str; 5] = ["begin:", "end:", "glob:", "express:", "path:"];

/// Authority used to resolve relative URLs when only the path/query is wanted.
const DUMMY_BASE: &str = "http://dummy";

/// Returns true if the string carries one of the reserved pattern prefixes.
pub fn is_pattern(input: &str) -> bool {
    PATTERN_PREFIXES.iter().any(|prefix| input.starts_with(prefix))
}

/// Returns true for `scheme://...` and protocol-relative `//...` inputs.
///
/// The scheme is ASCII letters only, compared case-insensitively.
pub fn is_absolute(input: &str) -> bool {
    let rest = match input.find(':') {
        Some(idx) if idx > 0 && input[..idx].bytes().all(|b| b.is_ascii_alphabetic()) => {
            &input[idx + 1..]
        }
        _ => input,
    };
    rest.starts_with("//")
}

/// Lexical components of a URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlParts {
    /// Scheme with its trailing colon (`"http:"`), empty when protocol-relative or relative.
    pub protocol: String,
    /// Host with a non-default port, empty for relative URLs.
    pub host: String,
    /// Path exactly as written.
    pub path: String,
    /// Query including its leading `?`, or empty.
    pub query: String,
}

impl UrlParts {
    /// Split a URL into its components. The fragment is discarded.
    pub fn parse(input: &str) -> Self {
        let without_fragment = match input.find('#') {
            Some(idx) => &input[..idx],
            None => input,
        };
        let (before_query, query) = match without_fragment.find('?') {
            Some(idx) => (&without_fragment[..idx], &without_fragment[idx..]),
            None => (without_fragment, ""),
        };
        // A lone `?` carries no query.
        let query = if query.len() > 1 { query.to_string() } else { String::new() };

        if !is_absolute(input) {
            return Self {
                path: before_query.to_string(),
                query,
                ..Self::default()
            };
        }

        let slashes = before_query.find("//").unwrap_or(0);
        let protocol = &before_query[..slashes];
        let rest = &before_query[slashes + 2..];
        let (authority, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, ""),
        };

        Self {
            protocol: protocol.to_ascii_lowercase(),
            host: canonical_host(protocol, authority),
            path: path.to_string(),
            query,
        }
    }

    /// `protocol//host`.
    pub fn origin(&self) -> String {
        format!("{}//{}", self.protocol, self.host)
    }
}

/// Lowercase the host, drop credentials and the scheme's default port.
/// Falls back to the raw authority when it does not parse.
fn canonical_host(protocol: &str, authority: &str) -> String {
    let scheme = if protocol.is_empty() { "http:" } else { protocol };
    match Url::parse(&format!("{scheme}//{authority}/")) {
        Ok(parsed) => {
            let host = parsed.host_str().unwrap_or_default();
            match parsed.port() {
                Some(port) => format!("{host}:{port}"),
                None => host.to_string(),
            }
        }
        Err(_) => authority.to_string(),
    }
}

/// Join `path` onto the root, collapsing `.`, `..` and repeated separators.
///
/// A trailing separator survives; `..` never climbs above the root.
pub fn join_rooted(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        return "/".to_string();
    }

    let mut joined = format!("/{}", segments.join("/"));
    if path.ends_with('/') {
        joined.push('/');
    }
    joined
}

/// Canonical form of a URL string.
///
/// Pattern strings are returned unchanged.
pub fn normalize_url(input: &str) -> String {
    if is_pattern(input) {
        return input.to_string();
    }

    let parts = UrlParts::parse(input);

    if is_absolute(input) {
        if input.contains("..") {
            // Query is dropped on this branch.
            format!("{}//{}{}", parts.protocol, parts.host, join_rooted(&parts.path))
        } else if parts.query.is_empty() && (parts.path.is_empty() || parts.path == "/") {
            format!("{}/", parts.origin())
        } else {
            format!(
                "{}//{}{}{}",
                parts.protocol,
                parts.host,
                join_rooted(&parts.path),
                parts.query
            )
        }
    } else if input.contains("..") || input.contains("./") {
        format!("{}{}{}", parts.host, join_rooted(&parts.path), parts.query)
    } else {
        format!("{}{}", parts.path, parts.query)
    }
}

/// Parse with the `url` crate, resolving non-absolute inputs against a dummy authority.
fn parse_with_base(input: &str) -> Option<Url> {
    if is_absolute(input) {
        if input.starts_with("//") {
            Url::parse(&format!("http:{input}")).ok()
        } else {
            Url::parse(input).ok()
        }
    } else {
        Url::parse(DUMMY_BASE).ok()?.join(input).ok()
    }
}

/// Path component of a URL.
pub fn get_path(input: &str) -> String {
    match parse_with_base(input) {
        Some(url) => url.path().to_string(),
        None => UrlParts::parse(input).path,
    }
}

/// Query string of a URL without its leading `?`; empty when there is none.
pub fn get_query(input: &str) -> String {
    match parse_with_base(input) {
        Some(url) => url.query().unwrap_or_default().to_string(),
        None => UrlParts::parse(input)
            .query
            .trim_start_matches('?')
            .to_string(),
    }
}

/// Decoded `key=value` pairs of the query string, in order.
pub fn get_query_pairs(input: &str) -> Vec<(String, String)> {
    match parse_with_base(input) {
        Some(url) => url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect(),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_root_gets_trailing_slash() {
        assert_eq!(normalize_url("http://example.com"), "http://example.com/");
        assert_eq!(normalize_url("http://example.com/"), "http://example.com/");
        assert_eq!(normalize_url("HTTP://Example.COM"), "http://example.com/");
    }

    #[test]
    fn test_absolute_drops_default_port_only() {
        assert_eq!(normalize_url("http://example.com:80/a"), "http://example.com/a");
        assert_eq!(normalize_url("http://example.com:8080/a"), "http://example.com:8080/a");
        assert_eq!(normalize_url("https://example.com:443"), "https://example.com/");
    }

    #[test]
    fn test_absolute_keeps_path_and_query() {
        assert_eq!(
            normalize_url("http://example.com/a/b?c=1&d=2"),
            "http://example.com/a/b?c=1&d=2"
        );
        assert_eq!(normalize_url("http://example.com?c=1"), "http://example.com/?c=1");
        assert_eq!(normalize_url("http://example.com/a#frag"), "http://example.com/a");
    }

    #[test]
    fn test_protocol_relative() {
        assert_eq!(normalize_url("//example.com/a"), "//example.com/a");
        assert_eq!(normalize_url("//example.com"), "//example.com/");
    }

    #[test]
    fn test_absolute_traversal_drops_query_quirk() {
        // Traversal on an absolute URL loses the query; relative URLs keep it.
        assert_eq!(
            normalize_url("http://example.com/a/../b?c=1"),
            "http://example.com/b"
        );
        assert_eq!(normalize_url("../b?c=1"), "/b?c=1");
    }

    #[test]
    fn test_relative_without_traversal_is_verbatim() {
        assert_eq!(normalize_url("/foo"), "/foo");
        assert_eq!(normalize_url("/foo?a=1"), "/foo?a=1");
        assert_eq!(normalize_url("foo/bar"), "foo/bar");
        assert_eq!(normalize_url(""), "");
    }

    #[test]
    fn test_relative_traversal_is_rooted() {
        assert_eq!(normalize_url("./foo"), "/foo");
        assert_eq!(normalize_url("a/./b/../c"), "/a/c");
        assert_eq!(normalize_url("/a/b/../"), "/a/");
    }

    #[test]
    fn test_patterns_pass_through() {
        for pattern in [
            "begin:http://x",
            "end:.json",
            "glob:*/a/../*",
            "express:/users/:id",
            "path:/a/./b",
        ] {
            assert_eq!(normalize_url(pattern), pattern);
        }
        // Prefixes are case-sensitive.
        assert_eq!(normalize_url("BEGIN:/a"), "BEGIN:/a");
        assert!(!is_pattern("BEGIN:/a"));
    }

    #[test]
    fn test_idempotent_on_canonical_absolute() {
        for url in [
            "http://example.com/",
            "http://example.com/a/b?x=1",
            "https://example.com:8443/p",
        ] {
            let once = normalize_url(url);
            assert_eq!(normalize_url(&once), once);
        }
    }

    #[test]
    fn test_is_absolute() {
        assert!(is_absolute("http://a"));
        assert!(is_absolute("HTTPS://a"));
        assert!(is_absolute("//a"));
        assert!(!is_absolute("/a"));
        assert!(!is_absolute("a:b//c"));
        assert!(!is_absolute("h2://a"));
    }

    #[test]
    fn test_join_rooted() {
        assert_eq!(join_rooted(""), "/");
        assert_eq!(join_rooted("a//b"), "/a/b");
        assert_eq!(join_rooted("/../../x"), "/x");
        assert_eq!(join_rooted("/a/.."), "/");
        assert_eq!(join_rooted("/a/b/"), "/a/b/");
        assert_eq!(join_rooted("/a/b/."), "/a/b");
    }

    #[test]
    fn test_get_path_and_query() {
        assert_eq!(get_path("http://x.com/a?b=1"), "/a");
        assert_eq!(get_query("http://x.com/a?b=1"), "b=1");
        assert_eq!(get_path("/a/b?c"), "/a/b");
        assert_eq!(get_path("a/b"), "/a/b");
        assert_eq!(get_query("/a"), "");
        assert_eq!(get_query("/a?"), "");
        assert_eq!(get_path("//x.com/z"), "/z");
    }

    #[test]
    fn test_get_query_pairs_decodes() {
        assert_eq!(
            get_query_pairs("/a?name=a%20b&x=1"),
            vec![
                ("name".to_string(), "a b".to_string()),
                ("x".to_string(), "1".to_string())
            ]
        );
    }
}
