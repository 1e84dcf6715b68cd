//! Route table construction.
//!
//! # Responsibilities
//! - Normalise a [`RouteSpec`] into named routes
//! - Order routes most-specific first (longest path)
//!
//! # Design Decisions
//! - Built once per instance and never mutated, so it is shared without locks
//! - Sorting is stable: equal-length paths keep configuration order
//! - The `/` fallback has the shortest path and always sorts last

use std::cmp::Reverse;

use crate::config::RouteSpec;
use crate::routing::matcher::{CatchAllMatcher, Matcher, PathPrefixMatcher};

/// Name given to the route produced by a single `target` port.
pub const DEFAULT_ROUTE_NAME: &str = "default";

/// A named path-prefix-to-backend-port mapping.
#[derive(Debug)]
pub struct Route {
    name: String,
    path: String,
    port: u16,
    aliases: Vec<PathPrefixMatcher>,
    matcher: Box<dyn Matcher>,
}

impl Route {
    pub fn new(name: impl Into<String>, path: impl Into<String>, port: u16, aliases: Vec<String>) -> Self {
        let path = path.into();
        let matcher: Box<dyn Matcher> = if path == "/" {
            Box::new(CatchAllMatcher)
        } else {
            Box::new(PathPrefixMatcher::new(path.clone()))
        };

        Self {
            name: name.into(),
            path,
            port,
            aliases: aliases.into_iter().map(PathPrefixMatcher::new).collect(),
            matcher,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.aliases.iter().map(PathPrefixMatcher::prefix)
    }

    /// True for the `/` fallback route.
    pub fn is_fallback(&self) -> bool {
        self.path == "/"
    }

    /// Redirect destination for aliases: the path without a trailing `/`.
    pub fn main_path(&self) -> &str {
        match self.path.strip_suffix('/') {
            Some(stripped) if !stripped.is_empty() => stripped,
            _ => &self.path,
        }
    }

    /// Whether this route serves `target`.
    pub fn matches(&self, target: &str) -> bool {
        self.matcher.matches(target)
    }

    /// The first alias of this route matching `target`, if any.
    pub fn matching_alias(&self, target: &str) -> Option<&str> {
        self.aliases
            .iter()
            .find(|alias| alias.matches(target))
            .map(PathPrefixMatcher::prefix)
    }
}

/// Routes of one proxy instance, longest path first.
#[derive(Debug)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Sort `routes` by descending path length.
    pub fn new(mut routes: Vec<Route>) -> Self {
        routes.sort_by_key(|route| Reverse(route.path.len()));
        Self { routes }
    }

    /// Normalise a validated route spec.
    pub fn from_spec(spec: &RouteSpec) -> Self {
        let routes = match spec {
            RouteSpec::Single(port) => vec![Route::new(DEFAULT_ROUTE_NAME, "/", *port, Vec::new())],
            RouteSpec::Named(targets) => targets
                .iter()
                .map(|(name, target)| {
                    Route::new(name.clone(), target.path.clone(), target.port, target.aliases.clone())
                })
                .collect(),
        };
        Self::new(routes)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Route> {
        self.routes.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Route> {
        self.routes.get(index)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl<'a> IntoIterator for &'a RouteTable {
    type Item = &'a Route;
    type IntoIter = std::slice::Iter<'a, Route>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
