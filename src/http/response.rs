//! Response helpers shared by local handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::json;

/// ISO-8601 UTC with millisecond precision, e.g. `2024-05-01T12:00:00.000Z`.
pub fn format_timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `{ "error": ..., "message": ... }` with the given status.
pub fn error_response(status: StatusCode, error: &str, message: impl Into<String>) -> Response {
    let body = json!({
        "error": error,
        "message": message.into(),
    });
    (status, Json(body)).into_response()
}
