//! The gated endpoint: which requests are subject to admission control.

use axum::http::{Method, Request};

use crate::config::RateLimitConfig;
use crate::routing::matcher::{Matcher, MethodMatcher, PathSegmentMatcher};

/// Method + path combination guarded by the limiter.
#[derive(Debug, Clone)]
pub struct GatedRoute {
    method: MethodMatcher,
    path: PathSegmentMatcher,
}

impl GatedRoute {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method: MethodMatcher::new(method),
            path: PathSegmentMatcher::new(path),
        }
    }

    /// Build from validated config. An unparseable method falls back to POST.
    pub fn from_config(config: &RateLimitConfig) -> Self {
        let method = Method::from_bytes(config.gated_method.as_bytes()).unwrap_or(Method::POST);
        Self::new(method, config.gated_path.clone())
    }
}

impl Matcher for GatedRoute {
    fn matches<B>(&self, req: &Request<B>) -> bool {
        self.method.matches(req) && self.path.matches(req)
    }
}
