use axum::{http, Router};
use tower_http::trace::TraceLayer;

use crate::{
    adapters::http::{app_state::AppState, webhook},
    infra::setup::init_tracing,
};

pub fn create_webhook_app(app_state: AppState) -> Router {
    init_tracing();

    Router::new()
        .merge(webhook::router())
        .with_state(app_state)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &http::Request<_>| {
                tracing::info_span!(
                    "platega-webhook",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
}
