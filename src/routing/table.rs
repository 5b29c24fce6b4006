//! Route table: path prefix → backend target.
//!
//! # Responsibilities
//! - Store compiled routes
//! - Look up the matching route for a request path
//! - Return matched route or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) prefix scan (acceptable for typical route counts)
//! - Longest matching prefix wins, independent of declaration order
//! - Explicit no-match rather than silent default

use url::Url;

use crate::config::GatewayConfig;
use crate::routing::matcher::{Matcher, SegmentPrefixMatcher};

/// Error building a route table.
#[derive(Debug, thiserror::Error)]
pub enum RouteTableError {
    #[error("invalid backend url `{url}`: {source}")]
    InvalidTarget {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("route prefix `{0}` is declared more than once")]
    DuplicatePrefix(String),
}

/// A single compiled route.
#[derive(Debug, Clone)]
pub struct Route {
    matcher: SegmentPrefixMatcher,
    target: Url,
}

impl Route {
    /// The prefix this route was declared with.
    pub fn prefix(&self) -> &str {
        self.matcher.prefix()
    }

    /// Base URL of the backend this route forwards to.
    pub fn target(&self) -> &Url {
        &self.target
    }

    /// Authority (`host:port`) of the target, as used in the upstream URI.
    pub fn authority(&self) -> String {
        match (self.target.host_str(), self.target.port_or_known_default()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            _ => String::new(),
        }
    }
}

/// Immutable mapping from path prefixes to backend targets.
#[derive(Debug, Clone)]
pub struct RouteTable {
    /// Sorted by descending prefix length so the first match is the longest.
    routes: Vec<Route>,
}

impl RouteTable {
    /// Build a table from `(prefix, backend base url)` pairs.
    pub fn new<I, P, U>(entries: I) -> Result<Self, RouteTableError>
    where
        I: IntoIterator<Item = (P, U)>,
        P: Into<String>,
        U: AsRef<str>,
    {
        let mut routes: Vec<Route> = Vec::new();
        for (prefix, url) in entries {
            let prefix = prefix.into();
            if routes.iter().any(|r| r.prefix() == prefix) {
                return Err(RouteTableError::DuplicatePrefix(prefix));
            }
            let target = Url::parse(url.as_ref()).map_err(|source| {
                RouteTableError::InvalidTarget {
                    url: url.as_ref().to_string(),
                    source,
                }
            })?;
            routes.push(Route {
                matcher: SegmentPrefixMatcher::new(prefix),
                target,
            });
        }

        routes.sort_by(|a, b| b.prefix().len().cmp(&a.prefix().len()));
        Ok(Self { routes })
    }

    /// Build the table from configuration: every prefix targets the one backend.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, RouteTableError> {
        let base = config.backend.base_url();
        Self::new(config.routes.iter().map(|p| (p.clone(), base.as_str())))
    }

    /// Find the route for a request path. Query strings must already be stripped.
    pub fn resolve(&self, path: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.matcher.matches(path))
    }

    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
