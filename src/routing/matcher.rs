//! Path matching logic.
//!
//! # Responsibilities
//! - Match a request target (path plus query) against a path prefix
//! - Provide the catch-all matcher used by the `/` fallback route
//!
//! # Design Decisions
//! - Prefixes match on segment boundaries only: the character after the
//!   prefix must be `/`, `?` or the end of the target
//! - Matching is case-sensitive
//! - No regex, no normalisation of `..` or duplicate slashes

/// Trait for matching request targets against a condition.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the target matches this condition.
    fn matches(&self, target: &str) -> bool;
}

/// Matches a path prefix on a segment boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Matcher for PathPrefixMatcher {
    fn matches(&self, target: &str) -> bool {
        matches_segment_prefix(target, &self.prefix)
    }
}

/// Matches every target.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatchAllMatcher;

impl Matcher for CatchAllMatcher {
    fn matches(&self, _target: &str) -> bool {
        true
    }
}

/// `target == prefix`, or `target` continues `prefix` with `/` or `?`.
pub fn matches_segment_prefix(target: &str, prefix: &str) -> bool {
    match target.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'),
        None => false,
    }
}
