//! Admission control state and algorithms.
//!
//! # Data Flow
//! ```text
//! client key
//!     → window.rs (trim, count, maybe append)
//!     → store.rs (key → per-client log, each behind its own lock)
//!
//! Background:
//!     sweeper.rs (every interval) → trim + evict idle keys from store.rs
//! ```
//!
//! # Design Decisions
//! - Exact sliding-window log rather than bucketed approximation
//! - One lock per client; the map lock only guards structure
//! - Time comes from an injectable `Clock`

pub mod clock;
pub mod store;
pub mod sweeper;
pub mod window;

pub use clock::{Clock, ManualClock, SystemClock};
pub use store::{RequestLog, WindowStore};
pub use sweeper::{EvictionSweeper, SweepReport};
pub use window::{RateLimitSnapshot, SlidingWindowLimiter};
