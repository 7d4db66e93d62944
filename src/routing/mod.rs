//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (GatedRoute: is this the admission-controlled endpoint?)
//!     → matcher.rs (evaluate method and path conditions)
//!     → true: admission middleware consults the limiter
//!       false: request passes through untouched
//! ```
//!
//! # Design Decisions
//! - The gated route is compiled once at startup and immutable
//! - No regex in the hot path (segment prefix matching only)

pub mod matcher;
pub mod router;

pub use matcher::Matcher;
pub use router::GatedRoute;
