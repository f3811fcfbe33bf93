//! Shadow prefix matching.
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - Matching works on the raw path; decoding happens at file resolution

use axum::body::Body;
use axum::http::Request;

/// Matches the request path against a configured prefix.
#[derive(Debug, Clone)]
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

    /// The configured prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns true if the request path starts with the prefix.
    pub fn matches(&self, req: &Request<Body>) -> bool {
        self.sub_path(req.uri().path()).is_some()
    }

    /// The remainder of `path` after the prefix, if it matches.
    pub fn sub_path<'a>(&self, path: &'a str) -> Option<&'a str> {
        path.strip_prefix(self.prefix.as_str())
    }
}
