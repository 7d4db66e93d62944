//! Per-client sliding-window admission control for a scan service.

pub mod admin;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod limiter;
pub mod observability;
pub mod routing;
pub mod security;

pub use config::schema::GateConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use limiter::{RateLimitSnapshot, SlidingWindowLimiter};
