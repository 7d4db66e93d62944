use axum::{extract::State, Json};
use serde::Serialize;

use crate::http::response::format_timestamp;
use crate::http::server::AppState;
use crate::security::ClientKey;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientUsage {
    pub used: u32,
    pub limit: u32,
    pub remaining: u32,
    pub reset_time: String,
    pub window_minutes: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LimiterSettings {
    pub max_requests_per_window: u32,
    pub window_size_minutes: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitStats {
    pub current_ip: String,
    pub current_ip_usage: ClientUsage,
    pub rate_limit_config: LimiterSettings,
    pub tracked_clients: usize,
    pub server_time: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminHealth {
    pub status: &'static str,
    pub rate_limit_service: &'static str,
    pub client_ip: String,
    pub current_usage: ClientUsage,
    pub tracked_clients: usize,
    pub timestamp: String,
}

fn usage(state: &AppState, client_key: &str) -> ClientUsage {
    let snapshot = state.limiter.rate_limit_info(client_key);
    ClientUsage {
        used: snapshot.used,
        limit: snapshot.allowed,
        remaining: snapshot.remaining(),
        reset_time: format_timestamp(snapshot.reset_time),
        window_minutes: snapshot.window_minutes,
    }
}

pub async fn get_rate_limit_stats(
    State(state): State<AppState>,
    ClientKey(client_key): ClientKey,
) -> Json<RateLimitStats> {
    Json(RateLimitStats {
        current_ip_usage: usage(&state, &client_key),
        current_ip: client_key,
        rate_limit_config: LimiterSettings {
            max_requests_per_window: state.limiter.max_requests(),
            window_size_minutes: state.limiter.window_minutes(),
        },
        tracked_clients: state.limiter.tracked_clients(),
        server_time: format_timestamp(state.limiter.now()),
    })
}

/// Liveness of the limiter. Read-only: probing it never spends anyone's quota.
pub async fn get_admin_health(
    State(state): State<AppState>,
    ClientKey(client_key): ClientKey,
) -> Json<AdminHealth> {
    Json(AdminHealth {
        status: "ok",
        rate_limit_service: "operational",
        current_usage: usage(&state, &client_key),
        client_ip: client_key,
        tracked_clients: state.limiter.tracked_clients(),
        timestamp: format_timestamp(state.limiter.now()),
    })
}
