use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};

use super::app_state::AppState;

/// Platega redelivers on any non-2xx, so every handled outcome (settled,
/// duplicate, ignored) collapses to a plain `200 OK`.
pub async fn handle_platega_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Response {
    match state.engine.process_callback(&headers, &body).await {
        Ok(_) => (StatusCode::OK, "OK").into_response(),
        Err(e) => e.into_response(),
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/platega/webhook", post(handle_platega_webhook))
}
