/*
 * Responsibility
 * - GET /health (liveness; mounted outside the gate)
 */
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "serviceIds": state.service_ids.len(),
        })),
    )
}
