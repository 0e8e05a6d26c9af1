//! Route-file loading from disk.

use std::fs;
use std::path::Path;

use regex::Regex;
use thiserror::Error;

use crate::config::schema::{RouteEntryConfig, RouteFile};
use crate::config::validation::{validate_config, ValidationError};
use crate::error::MockError;
use crate::http::response::ResponseSpec;
use crate::interception::fetch_mock::{FetchMock, MockConfig};
use crate::routing::matcher::UrlMatcher;
use crate::routing::route::RouteConfig;

/// Error type for route-file loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("Route rejected: {0}")]
    Route(#[from] MockError),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate a route file.
pub fn load_config(path: &Path) -> Result<RouteFile, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate route-file text.
pub fn parse_config(content: &str) -> Result<RouteFile, ConfigError> {
    let file: RouteFile = toml::from_str(content)?;
    validate_config(&file).map_err(ConfigError::Validation)?;
    Ok(file)
}

/// Translate one file entry into a registrable route.
pub fn route_config(entry: &RouteEntryConfig) -> Result<RouteConfig, MockError> {
    let matcher = match (&entry.regex, &entry.matcher) {
        (Some(pattern), _) if !pattern.is_empty() => {
            let regex = Regex::new(pattern)
                .map_err(|e| MockError::InvalidRoute(format!("invalid regex {:?}: {}", pattern, e)))?;
            UrlMatcher::Regex(regex)
        }
        (_, Some(matcher)) => UrlMatcher::Url(matcher.clone()),
        _ => return Err(MockError::InvalidRoute("route has no matcher".to_string())),
    };

    Ok(RouteConfig {
        name: entry.name.clone(),
        matcher: Some(matcher),
        response: Some(ResponseSpec::from(entry.response.clone())),
        method: entry.method.clone(),
        query: entry.query.clone(),
        headers: entry.headers.clone(),
        repeat: entry.repeat,
        overwrite_routes: entry.overwrite_routes,
    })
}

/// Build a sandboxed mock with every route of `file` registered in order.
pub fn build_mock(file: &RouteFile) -> Result<FetchMock, ConfigError> {
    let mock = FetchMock::new(MockConfig::from(&file.settings));
    register_routes(&mock, file)?;
    Ok(mock)
}

/// Register every route of `file`, then its fallback, on an existing mock.
pub fn register_routes(mock: &FetchMock, file: &RouteFile) -> Result<(), ConfigError> {
    for entry in &file.routes {
        mock.mock_route(route_config(entry)?)?;
    }
    if let Some(fallback) = &file.settings.fallback {
        mock.catch(fallback.clone());
    }
    tracing::info!(routes = file.routes.len(), "Route file registered");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_is_reported() {
        let err = parse_config("routes = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_bad_regex_is_route_error() {
        let file = parse_config(
            r#"
            [[routes]]
            regex = "("
            response = 200
            "#,
        )
        .unwrap();
        assert!(matches!(
            build_mock(&file),
            Err(ConfigError::Route(MockError::InvalidRoute(_)))
        ));
    }

    #[test]
    fn test_duplicate_routes_are_rejected_unless_overwriting() {
        let text = r#"
            [[routes]]
            matcher = "/a"
            response = 200

            [[routes]]
            matcher = "/a"
            response = 201
        "#;
        let file = parse_config(text).unwrap();
        assert!(matches!(
            build_mock(&file),
            Err(ConfigError::Route(MockError::DuplicateRoute { .. }))
        ));

        let file = parse_config(&format!("[settings]\noverwrite_routes = true\n{}", text)).unwrap();
        assert_eq!(build_mock(&file).unwrap().route_count(), 1);
    }
}
