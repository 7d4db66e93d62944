//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (assign request ID)
//!     → security::rate_limit (admission on the gated route)
//!     → status.rs (local quota endpoints)  or  upstream.rs (forward to scan service)
//!     → response.rs (shared JSON/timestamp helpers)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;
pub mod status;
pub mod upstream;

pub use request::{MakeRequestUuidV4, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
pub use upstream::UpstreamClient;
