//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (fmt subscriber)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured fields (`client`, `used`, `limit`) instead of formatted strings
//! - Request ID flows through HTTP spans
//! - Metrics are cheap and no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
