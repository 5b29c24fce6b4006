//! Route matching logic.
//!
//! # Responsibilities
//! - Match path prefixes on segment boundaries
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - A prefix matches the exact path or the path followed by `/`
//! - No regex to guarantee O(n) matching

/// Trait for matching request paths against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the path matches this condition.
    fn matches(&self, path: &str) -> bool;
}

/// Matches a path prefix on whole segments.
///
/// `/query` matches `/query` and `/query/123` but not `/query-collection`.
#[derive(Debug, Clone)]
pub struct SegmentPrefixMatcher {
    prefix: String,
}

impl SegmentPrefixMatcher {
    /// Create a new segment prefix matcher.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Matcher for SegmentPrefixMatcher {
    fn matches(&self, path: &str) -> bool {
        if self.prefix == "/" {
            return path.starts_with('/');
        }
        match path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_matcher() {
        let matcher = SegmentPrefixMatcher::new("/collection");

        assert!(matcher.matches("/collection"));
        assert!(matcher.matches("/collection/"));
        assert!(matcher.matches("/collection/abc"));
        assert!(!matcher.matches("/collections"));
        assert!(!matcher.matches("/Collection"));
        assert!(!matcher.matches("/"));
    }

    #[test]
    fn test_nested_prefix() {
        let matcher = SegmentPrefixMatcher::new("/mqtt/start");

        assert!(matcher.matches("/mqtt/start"));
        assert!(!matcher.matches("/mqtt/status"));
        assert!(!matcher.matches("/mqtt"));
    }

    #[test]
    fn test_root_matches_everything() {
        let matcher = SegmentPrefixMatcher::new("/");
        assert!(matcher.matches("/"));
        assert!(matcher.matches("/anything/at/all"));
    }
}
