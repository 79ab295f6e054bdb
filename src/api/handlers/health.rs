use crate::AppState;
use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    /// "present" when the detections directory exists, "missing" otherwise.
    /// Writability is not probed.
    pub destination: String,
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "System health status", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let destination = if state.storage.is_available().await {
        "present"
    } else {
        "missing"
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        destination: destination.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
