//! Operator endpoints for inspecting the limiter.

pub mod auth;
pub mod handlers;

use axum::{middleware, routing::get, Router};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::server::AppState;

pub fn setup_admin_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/admin/ratelimit/stats", get(get_rate_limit_stats))
        .route("/api/admin/health", get(get_admin_health))
        .route_layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}
