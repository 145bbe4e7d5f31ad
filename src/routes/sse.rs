use std::convert::Infallible;

use axum::{Router, extract::State, response::sse::Sse, routing::get};
use futures::Stream;
use tracing::info;

use crate::{services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/sse/outbox",
    tag = "sse",
    responses((status = 200, description = "Outbound transport actions", content_type = "text/event-stream", body = String))
)]
/// Stream outbound transport actions to delivery connectors.
pub async fn outbox_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let receiver = sse_service::subscribe_outbox(&state);
    info!(
        subscribers = state.outbox().subscriber_count(),
        "new outbox SSE connection"
    );
    sse_service::broadcast_handshake(&state).await;
    sse_service::to_sse_stream(receiver)
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sse/outbox", get(outbox_stream))
}
