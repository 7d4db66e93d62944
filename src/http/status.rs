//! Read-only quota endpoints for UI polling and health checks.
//!
//! Nothing here calls `is_allowed`; querying never consumes quota.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::http::response::format_timestamp;
use crate::http::server::AppState;
use crate::security::ClientKey;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitStatus {
    pub limit: u32,
    pub used: u32,
    pub remaining: u32,
    pub window_minutes: u32,
    pub reset_time: String,
    pub reset_in_seconds: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: &'static str,
    pub timestamp: String,
    pub upstream: String,
    pub allowed_origins: Vec<String>,
    pub rate_limit: HealthRateLimit,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthRateLimit {
    pub max_requests: u32,
    pub window_minutes: u32,
    pub current_usage: u32,
    pub remaining: u32,
    pub reset_time: String,
}

/// `GET /api/ratelimit`
pub async fn rate_limit_status(
    State(state): State<AppState>,
    ClientKey(client_key): ClientKey,
) -> Json<RateLimitStatus> {
    let snapshot = state.limiter.rate_limit_info(&client_key);
    let now = state.limiter.now();

    Json(RateLimitStatus {
        limit: snapshot.allowed,
        used: snapshot.used,
        remaining: snapshot.remaining(),
        window_minutes: snapshot.window_minutes,
        reset_time: format_timestamp(snapshot.reset_time),
        reset_in_seconds: snapshot.seconds_until_reset(now),
    })
}

/// `GET /api/health`
pub async fn health(
    State(state): State<AppState>,
    ClientKey(client_key): ClientKey,
) -> Json<HealthStatus> {
    let snapshot = state.limiter.rate_limit_info(&client_key);

    Json(HealthStatus {
        status: "ok",
        timestamp: format_timestamp(state.limiter.now()),
        upstream: state.config.upstream.address.clone(),
        allowed_origins: state.config.cors.allowed_origins.clone(),
        rate_limit: HealthRateLimit {
            max_requests: snapshot.allowed,
            window_minutes: snapshot.window_minutes,
            current_usage: snapshot.used,
            remaining: snapshot.remaining(),
            reset_time: format_timestamp(snapshot.reset_time),
        },
    })
}
