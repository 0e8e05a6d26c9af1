//! Route-file validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check each route has exactly one usable matcher
//! - Validate value ranges (status codes, methods)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouteFile → Result<(), Vec<ValidationError>>
//! - Duplicate detection is left to the registry, which owns the duplicate key

use std::fmt;

use crate::config::schema::{RouteEntryConfig, RouteFile};
use crate::http::response::{MockResponse, ResponseConfig};

/// A semantic problem in one route, or in the settings when `route` is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub route: Option<usize>,
    pub message: String,
}

impl ValidationError {
    fn route(index: usize, message: impl Into<String>) -> Self {
        Self {
            route: Some(index),
            message: message.into(),
        }
    }

    fn settings(message: impl Into<String>) -> Self {
        Self {
            route: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.route {
            Some(index) => write!(f, "routes[{}]: {}", index, self.message),
            None => write!(f, "settings: {}", self.message),
        }
    }
}

fn status_of(response: &ResponseConfig) -> u16 {
    match response {
        ResponseConfig::Status(status) => *status,
        ResponseConfig::Body(_) => MockResponse::default().status,
        ResponseConfig::Full(response) => response.status,
    }
}

fn valid_status(status: u16) -> bool {
    (100..=599).contains(&status)
}

fn validate_route(index: usize, route: &RouteEntryConfig, errors: &mut Vec<ValidationError>) {
    let matcher = route.matcher.as_deref().filter(|m| !m.is_empty());
    let regex = route.regex.as_deref().filter(|r| !r.is_empty());
    match (matcher, regex) {
        (None, None) => errors.push(ValidationError::route(index, "route has no matcher")),
        (Some(_), Some(_)) => errors.push(ValidationError::route(
            index,
            "route sets both `matcher` and `regex`",
        )),
        _ => {}
    }

    let status = status_of(&route.response);
    if !valid_status(status) {
        errors.push(ValidationError::route(
            index,
            format!("invalid response status {}", status),
        ));
    }

    if let Some(method) = &route.method {
        if method.is_empty() || !method.chars().all(|c| c.is_ascii_alphabetic()) {
            errors.push(ValidationError::route(
                index,
                format!("invalid method {:?}", method),
            ));
        }
    }

    if route.repeat == Some(0) {
        errors.push(ValidationError::route(index, "repeat must be at least 1"));
    }
}

/// Check a parsed route file.
pub fn validate_config(file: &RouteFile) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Some(fallback) = &file.settings.fallback {
        let status = status_of(fallback);
        if !valid_status(status) {
            errors.push(ValidationError::settings(format!(
                "invalid fallback status {}",
                status
            )));
        }
    }

    for (index, route) in file.routes.iter().enumerate() {
        validate_route(index, route, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
