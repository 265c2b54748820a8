use std::sync::Arc;

use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use guild_recruit::platform::{GuildDirectory, Messenger};
use guild_recruit::storage::RecruitmentStore;
use guild_recruit::workflows::recruitment::{interaction_router, Dispatcher};
use serde_json::json;

use crate::infra::AppState;

pub(crate) fn with_interaction_routes<S, D, M>(
    dispatcher: Arc<Dispatcher<S, D, M>>,
) -> axum::Router
where
    S: RecruitmentStore + 'static,
    D: GuildDirectory + 'static,
    M: Messenger + 'static,
{
    interaction_router(dispatcher)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
