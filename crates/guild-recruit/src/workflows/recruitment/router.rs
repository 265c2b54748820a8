use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use chrono::Utc;

use super::events::{Dispatcher, InboundEvent};
use crate::platform::{GuildDirectory, Messenger};
use crate::storage::RecruitmentStore;

/// Router builder exposing the interaction ingress used by the platform
/// adapter: one POST per inbound interaction, one reply per response body.
pub fn interaction_router<S, D, M>(dispatcher: Arc<Dispatcher<S, D, M>>) -> Router
where
    S: RecruitmentStore + 'static,
    D: GuildDirectory + 'static,
    M: Messenger + 'static,
{
    Router::new()
        .route(
            "/api/v1/interactions",
            post(interaction_handler::<S, D, M>),
        )
        .with_state(dispatcher)
}

pub(crate) async fn interaction_handler<S, D, M>(
    State(dispatcher): State<Arc<Dispatcher<S, D, M>>>,
    axum::Json(event): axum::Json<InboundEvent>,
) -> Response
where
    S: RecruitmentStore + 'static,
    D: GuildDirectory + 'static,
    M: Messenger + 'static,
{
    let reply = dispatcher.dispatch(event, Utc::now()).await;
    (StatusCode::OK, axum::Json(reply)).into_response()
}
