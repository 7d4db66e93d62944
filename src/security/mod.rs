//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → client_ip.rs (derive the client key from headers / peer address)
//!     → rate_limit.rs (gated route? consult limiter, attach quota headers)
//!     → Pass to upstream, or short-circuit with 429
//! ```
//!
//! # Design Decisions
//! - Client identity is best effort and spoofable; it is a quota key, not auth
//! - Identity resolution never fails a request

pub mod client_ip;
pub mod rate_limit;

pub use client_ip::{resolve_client_key, ClientKey, FALLBACK_CLIENT_KEY};
pub use rate_limit::{admission_middleware, AdmissionState, QuotaExceeded};
