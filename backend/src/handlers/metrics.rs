// Node Metrics Handlers
// Poll a node tab's metrics (snapshot or live) and stream replay ticks

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Extension, Json,
};
use futures::Stream;
use std::convert::Infallible;
use std::sync::Arc;

use crate::handlers::sse_stream;
use crate::middleware::RequestContext;
use crate::models::{PollRequest, PollResult};
use crate::services::Topic;
use crate::utils::ApiResult;
use crate::AppState;

/// Poll metrics for a node tab
///
/// With `live = false` returns every catalog metric of the tab in catalog order.
/// With `live = true` returns an empty acknowledgement; the fetched history is then
/// replayed one sample per second on the `metricsByTab` stream.
#[utoipa::path(
    post,
    path = "/api/metrics/by-tab",
    request_body = PollRequest,
    responses(
        (status = 200, description = "Metrics for the tab, or an empty live acknowledgement", body = PollResult),
        (status = 400, description = "Invalid request window or step"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Metrics"
)]
pub async fn poll_metrics_by_tab(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Json(request): Json<PollRequest>,
) -> ApiResult<Json<PollResult>> {
    tracing::debug!(
        "POST /api/metrics/by-tab node={} class={:?} tab={:?} live={}",
        request.node_id,
        request.node_class,
        request.tab,
        request.live
    );

    let result = state.metrics_service.poll(&ctx, &request).await?;
    Ok(Json(result))
}

/// Stream live replay ticks (Server-Sent Events, event name `metricsByTab`)
#[utoipa::path(
    get,
    path = "/api/metrics/stream",
    responses(
        (status = 200, description = "SSE stream of replay ticks", content_type = "text/event-stream")
    ),
    tag = "Metrics"
)]
pub async fn metrics_stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::debug!("GET /api/metrics/stream");
    Sse::new(sse_stream(Topic::MetricsByTab, state.gateway.subscribe_ticks())).keep_alive(KeepAlive::default())
}
