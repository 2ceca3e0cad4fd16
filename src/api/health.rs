use super::AppState;
use crate::telegram::format_uptime;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let report = state.health.check_all().await;

    let status = if report.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let body = json!({
        "status": if report.healthy { "ok" } else { "degraded" },
        "uptime": format_uptime(state.stats.started_at()),
        "services": report.services,
    });

    (status, Json(body))
}
