//! Route storage and lookup.
//!
//! # Responsibilities
//! - Store routes in registration order, uncompiled and compiled side by side
//! - Detect duplicate routes and append, replace or reject accordingly
//! - Look up the first route that matches a request
//!
//! # Design Decisions
//! - One `RouteEntry` per route keeps the two forms in lockstep
//! - Duplicates are decided on identifier, method, query and repeat only
//! - A replaced route keeps the index of the route it replaces
//! - First match wins

use std::collections::BTreeMap;

use crate::error::{MockError, Result};
use crate::http::request::NormalizedRequest;
use crate::routing::route::{compile, CompiledRoute, RouteConfig};

/// A registered route in both of its forms.
#[derive(Debug)]
pub struct RouteEntry {
    pub uncompiled: RouteConfig,
    pub compiled: CompiledRoute,
}

/// Outcome of a successful `add_route`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Added { index: usize },
    Replaced { index: usize },
}

/// Ordered route registry.
#[derive(Debug, Default)]
pub struct RouteRegistry {
    entries: Vec<RouteEntry>,
    overwrite_routes: bool,
}

/// Compare an optional property the way the duplicate key does: present on both
/// sides compares values, absent on both sides matches, anything else differs.
fn same_property<T, F>(a: Option<&T>, b: Option<&T>, eq: F) -> bool
where
    T: ?Sized,
    F: FnOnce(&T, &T) -> bool,
{
    match (a, b) {
        (Some(a), Some(b)) => eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

fn present_str(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|s| !s.is_empty())
}

fn present_repeat(value: Option<u32>) -> Option<u32> {
    value.filter(|repeat| *repeat > 0)
}

/// Exact key-set equality; key order is irrelevant.
fn same_query(a: &BTreeMap<String, String>, b: &BTreeMap<String, String>) -> bool {
    a.len() == b.len() && a.iter().all(|(key, value)| b.get(key) == Some(value))
}

/// True when two routes collide under the duplicate key.
pub fn is_duplicate(route: &CompiledRoute, candidate: &CompiledRoute) -> bool {
    let identifier = same_property(
        Some(route.identifier.as_str()).filter(|s| !s.is_empty()),
        Some(candidate.identifier.as_str()).filter(|s| !s.is_empty()),
        |a, b| a == b,
    );
    identifier
        && same_property(
            present_str(route.method.as_ref()),
            present_str(candidate.method.as_ref()),
            |a, b| a == b,
        )
        && same_property(route.query.as_ref(), candidate.query.as_ref(), same_query)
        && same_property(
            present_repeat(route.repeat).as_ref(),
            present_repeat(candidate.repeat).as_ref(),
            |a, b| a == b,
        )
}

impl RouteRegistry {
    /// Create an empty registry. `overwrite_routes` applies to routes that do not set it.
    pub fn new(overwrite_routes: bool) -> Self {
        Self {
            entries: Vec::new(),
            overwrite_routes,
        }
    }

    /// Compile and register a route.
    ///
    /// A duplicate replaces the existing route in place when overwriting is
    /// allowed, and is rejected with the registry untouched otherwise.
    pub fn add_route(&mut self, uncompiled: RouteConfig) -> Result<Registration> {
        let compiled = compile(&uncompiled)?;
        let overwrite = compiled.overwrite_routes.unwrap_or(self.overwrite_routes);

        match self.find_duplicate(&compiled) {
            None => {
                tracing::debug!(route = %compiled.identifier, "Route registered");
                self.entries.push(RouteEntry {
                    uncompiled,
                    compiled,
                });
                Ok(Registration::Added {
                    index: self.entries.len() - 1,
                })
            }
            Some(index) if overwrite => {
                tracing::debug!(route = %compiled.identifier, index, "Route replaced");
                self.entries[index] = RouteEntry {
                    uncompiled,
                    compiled,
                };
                Ok(Registration::Replaced { index })
            }
            Some(index) => {
                let identifier = self.entries[index].compiled.identifier.clone();
                tracing::warn!(route = %identifier, index, "Duplicate route rejected");
                Err(MockError::DuplicateRoute { identifier })
            }
        }
    }

    /// Index of the first registered route that collides with `route`.
    pub fn find_duplicate(&self, route: &CompiledRoute) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| is_duplicate(route, &entry.compiled))
    }

    /// Answer a request from the first matching route, counting the call against it.
    pub fn first_match(&mut self, req: &NormalizedRequest) -> Option<&CompiledRoute> {
        let entry = self
            .entries
            .iter_mut()
            .find(|entry| entry.compiled.matches(req))?;
        entry.compiled.record_call();
        Some(&entry.compiled)
    }

    pub fn routes(&self) -> impl Iterator<Item = &CompiledRoute> {
        self.entries.iter().map(|entry| &entry.compiled)
    }

    pub fn uncompiled(&self) -> impl Iterator<Item = &RouteConfig> {
        self.entries.iter().map(|entry| &entry.uncompiled)
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every route.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Reset every route's call counter without removing routes.
    pub fn reset_counters(&mut self) {
        for entry in &mut self.entries {
            entry.compiled.reset();
        }
    }
}
