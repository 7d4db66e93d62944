//! Request matching primitives.
//!
//! # Responsibilities
//! - Match the request method (exact)
//! - Match the path by whole segments
//! - Combine conditions with AND semantics
//!
//! # Design Decisions
//! - Path matching ignores ASCII case, like the scan service's own routing
//! - `/api/scan` matches `/api/scan` and `/api/scan/...`, never `/api/scanner`
//! - No regex to guarantee O(n) matching

use axum::http::{Method, Request};

/// Trait for matching requests against conditions.
pub trait Matcher: std::fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches<B>(&self, req: &Request<B>) -> bool;
}

/// Matches the request method.
#[derive(Debug, Clone)]
pub struct MethodMatcher {
    method: Method,
}

impl MethodMatcher {
    pub fn new(method: Method) -> Self {
        Self { method }
    }

    pub fn matches_method(&self, method: &Method) -> bool {
        *method == self.method
    }
}

impl Matcher for MethodMatcher {
    fn matches<B>(&self, req: &Request<B>) -> bool {
        self.matches_method(req.method())
    }
}

/// Matches a path prefix on segment boundaries.
#[derive(Debug, Clone)]
pub struct PathSegmentMatcher {
    prefix: String,
}

impl PathSegmentMatcher {
    /// A trailing slash on `prefix` is ignored.
    pub fn new(prefix: impl Into<String>) -> Self {
        let mut prefix = prefix.into();
        while prefix.len() > 1 && prefix.ends_with('/') {
            prefix.pop();
        }
        Self { prefix }
    }

    pub fn matches_path(&self, path: &str) -> bool {
        if self.prefix == "/" {
            return true;
        }
        let Some(head) = path.get(..self.prefix.len()) else {
            return false;
        };
        if !head.eq_ignore_ascii_case(&self.prefix) {
            return false;
        }
        let rest = &path[self.prefix.len()..];
        rest.is_empty() || rest.starts_with('/')
    }
}

impl Matcher for PathSegmentMatcher {
    fn matches<B>(&self, req: &Request<B>) -> bool {
        self.matches_path(req.uri().path())
    }
}
