// Subscription Handlers
// Named-topic SSE streams over the in-process gateway

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::Stream;
use std::convert::Infallible;
use std::sync::Arc;

use crate::handlers::sse_stream;
use crate::services::Topic;
use crate::utils::{ApiError, ApiResult};
use crate::AppState;

// Subscribe to any topic by name
#[utoipa::path(
    get,
    path = "/api/subscriptions/{topic}",
    params(
        ("topic" = String, Path, description = "metricsByTab, connectedUsers or alerts")
    ),
    responses(
        (status = 200, description = "SSE stream of topic messages", content_type = "text/event-stream"),
        (status = 400, description = "Unknown topic")
    ),
    tag = "Subscriptions"
)]
pub async fn subscribe_topic(
    State(state): State<Arc<AppState>>,
    Path(topic): Path<String>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let topic: Topic = topic.parse().map_err(ApiError::invalid_input)?;
    tracing::debug!(
        "GET /api/subscriptions/{} ({} existing subscribers)",
        topic,
        state.gateway.subscriber_count(topic)
    );

    Ok(Sse::new(sse_stream(topic, state.gateway.subscribe(topic))).keep_alive(KeepAlive::default()))
}
