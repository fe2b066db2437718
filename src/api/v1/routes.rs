/*
 * Responsibility
 * - v1 URL layout (everything here sits behind the request gate)
 * - The gate itself is layered on in app.rs via middleware::request_gate::apply
 */
use axum::{Router, routing::get};

use crate::api::v1::handlers::echo::{echo_get, echo_post};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/echo", get(echo_get).post(echo_post))
}
