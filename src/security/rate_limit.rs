//! Admission middleware for the gated endpoint.
//!
//! Requests that do not match the gated route pass through without touching
//! the limiter. Matching requests are admitted or rejected; either way the
//! response carries the caller's quota headers.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::http::response::format_timestamp;
use crate::limiter::{RateLimitSnapshot, SlidingWindowLimiter};
use crate::routing::{GatedRoute, Matcher};
use crate::security::client_ip::client_key_from_parts;

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");
pub const X_RATELIMIT_WINDOW: HeaderName = HeaderName::from_static("x-ratelimit-window");

/// State for the admission middleware.
#[derive(Clone)]
pub struct AdmissionState {
    pub limiter: Arc<SlidingWindowLimiter>,
    pub route: GatedRoute,
}

/// Middleware function for sliding-window admission control.
pub async fn admission_middleware(
    State(state): State<AdmissionState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.route.matches(&request) {
        return next.run(request).await;
    }

    let client_key = client_key_from_parts(request.headers(), request.extensions());

    if !state.limiter.is_allowed(&client_key) {
        let snapshot = state.limiter.rate_limit_info(&client_key);
        tracing::warn!(
            client = %client_key,
            reset_time = %format_timestamp(snapshot.reset_time),
            "Scan request rejected"
        );
        return QuotaExceeded {
            snapshot,
            client_key,
            now: state.limiter.now(),
        }
        .into_response();
    }

    let snapshot = state.limiter.rate_limit_info(&client_key);
    let mut response = next.run(request).await;
    insert_quota_headers(response.headers_mut(), &snapshot, snapshot.remaining());
    response
}

/// Attach the four `X-RateLimit-*` headers.
pub fn insert_quota_headers(headers: &mut HeaderMap, snapshot: &RateLimitSnapshot, remaining: u32) {
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(snapshot.allowed));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(remaining));
    headers.insert(X_RATELIMIT_RESET, HeaderValue::from(snapshot.reset_epoch_secs()));
    if let Ok(window) = HeaderValue::from_str(&format!("{}m", snapshot.window_minutes)) {
        headers.insert(X_RATELIMIT_WINDOW, window);
    }
}

/// A denied admission check, rendered as `429 Too Many Requests`.
#[derive(Debug, Clone)]
pub struct QuotaExceeded {
    pub snapshot: RateLimitSnapshot,
    pub client_key: String,
    /// Reference point for `Retry-After`.
    pub now: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RejectionBody {
    error: &'static str,
    message: String,
    details: RejectionDetails,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RejectionDetails {
    limit: u32,
    window_minutes: u32,
    reset_time: String,
    client_key: String,
}

impl IntoResponse for QuotaExceeded {
    fn into_response(self) -> Response {
        let snapshot = self.snapshot;
        let body = RejectionBody {
            error: "Rate limit exceeded",
            message: format!(
                "Too many scan requests. Limit: {} requests per {} minutes.",
                snapshot.allowed, snapshot.window_minutes
            ),
            details: RejectionDetails {
                limit: snapshot.allowed,
                window_minutes: snapshot.window_minutes,
                reset_time: format_timestamp(snapshot.reset_time),
                client_key: self.client_key,
            },
        };

        let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
        let headers = response.headers_mut();
        insert_quota_headers(headers, &snapshot, 0);
        headers.insert(
            header::RETRY_AFTER,
            HeaderValue::from(snapshot.seconds_until_reset(self.now)),
        );
        response
    }
}
