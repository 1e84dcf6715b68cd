//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Check aliases first and produce redirect locations
//! - Find the most specific route serving a target
//! - Return an explicit no-match rather than a silent default
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan in table order; the table is already sorted by specificity
//! - Aliases are checked in table order, not by alias length: overlapping
//!   aliases resolve to whichever route sorts first

use crate::routing::table::{Route, RouteTable};

/// Outcome of resolving a request target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Target hit an alias; redirect permanently to `location`.
    Redirect { route: usize, location: String },
    /// Target is served by the route at this table index.
    Forward { route: usize },
    /// No route serves the target.
    NotFound,
}

/// Classifies request targets against one route table.
#[derive(Debug)]
pub struct Router {
    table: RouteTable,
}

impl Router {
    pub fn new(table: RouteTable) -> Self {
        Self { table }
    }

    /// Look up the route at a table index returned by [`Router::resolve`].
    pub fn route(&self, index: usize) -> Option<&Route> {
        self.table.get(index)
    }

    /// Resolve `target` (path plus query) to a redirect, a route, or nothing.
    pub fn resolve(&self, target: &str) -> Resolution {
        for (index, route) in self.table.iter().enumerate() {
            if let Some(alias) = route.matching_alias(target) {
                return Resolution::Redirect {
                    route: index,
                    location: target.replacen(alias, route.main_path(), 1),
                };
            }
        }

        self.table
            .iter()
            .position(|route| route.matches(target))
            .map_or(Resolution::NotFound, |route| Resolution::Forward { route })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router(routes: Vec<Route>) -> Router {
        Router::new(RouteTable::new(routes))
    }

    fn forwarded_name<'a>(router: &'a Router, target: &str) -> Option<&'a str> {
        match router.resolve(target) {
            Resolution::Forward { route } => router.route(route).map(Route::name),
            _ => None,
        }
    }

    #[test]
    fn test_longest_prefix_wins() {
        let router = router(vec![
            Route::new("root", "/", 4000, vec![]),
            Route::new("api", "/api", 3000, vec![]),
            Route::new("admin", "/api/admin", 3001, vec![]),
        ]);

        assert_eq!(forwarded_name(&router, "/api/admin/users"), Some("admin"));
        assert_eq!(forwarded_name(&router, "/api/users"), Some("api"));
        assert_eq!(forwarded_name(&router, "/api?x=1"), Some("api"));
        assert_eq!(forwarded_name(&router, "/"), Some("root"));
    }

    #[test]
    fn test_partial_segment_falls_through_to_fallback() {
        let router = router(vec![
            Route::new("api", "/api", 3000, vec![]),
            Route::new("root", "/", 4000, vec![]),
        ]);

        assert_eq!(forwarded_name(&router, "/apiextra"), Some("root"));
    }

    #[test]
    fn test_no_fallback_reports_not_found() {
        let router = router(vec![Route::new("api", "/api", 3000, vec![])]);

        assert_eq!(router.resolve("/other"), Resolution::NotFound);
        assert_eq!(router.resolve("/apiextra"), Resolution::NotFound);
    }

    #[test]
    fn test_alias_redirect_keeps_rest_of_target() {
        let router = router(vec![
            Route::new("admin", "/admin", 3001, vec!["/adm".into()]),
            Route::new("root", "/", 3000, vec![]),
        ]);

        assert_eq!(
            router.resolve("/adm/users?x=1"),
            Resolution::Redirect {
                route: 0,
                location: "/admin/users?x=1".to_string()
            }
        );
        assert_eq!(
            router.resolve("/adm"),
            Resolution::Redirect {
                route: 0,
                location: "/admin".to_string()
            }
        );
        assert_eq!(
            router.resolve("/adm?tab=2"),
            Resolution::Redirect {
                route: 0,
                location: "/admin?tab=2".to_string()
            }
        );
        // Not an alias hit: served by the fallback.
        assert_eq!(forwarded_name(&router, "/admin2"), Some("root"));
        assert_eq!(forwarded_name(&router, "/adminx"), Some("root"));
    }

    #[test]
    fn test_alias_redirect_strips_trailing_slash_of_main_path() {
        let router = router(vec![Route::new("docs", "/docs/", 3001, vec!["/d".into()])]);

        assert_eq!(
            router.resolve("/d/intro"),
            Resolution::Redirect {
                route: 0,
                location: "/docs/intro".to_string()
            }
        );
    }

    #[test]
    fn test_aliases_checked_before_routes() {
        let router = router(vec![
            Route::new("long", "/very/long/path", 3001, vec![]),
            Route::new("root", "/", 3000, vec!["/very".into()]),
        ]);

        assert!(matches!(
            router.resolve("/very/long/path"),
            Resolution::Redirect { route: 1, .. }
        ));
    }

    #[test]
    fn test_overlapping_aliases_resolve_in_table_order() {
        let router = router(vec![
            Route::new("first", "/first-route", 3001, vec!["/x".into()]),
            Route::new("second", "/second", 3002, vec!["/x/y".into()]),
        ]);

        match router.resolve("/x/y/z") {
            Resolution::Redirect { route, location } => {
                assert_eq!(router.route(route).map(Route::name), Some("first"));
                assert_eq!(location, "/first-route/y/z");
            }
            other => panic!("expected redirect, got {other:?}"),
        }
    }
}
