pub mod dashboard;
pub mod metrics;
pub mod subscriptions;

use axum::response::sse::Event;
use futures::{Stream, StreamExt};
use serde::Serialize;
use std::convert::Infallible;

use crate::services::Topic;

/// Encode gateway messages as SSE events named after their topic
pub(crate) fn sse_stream<S, T>(topic: Topic, messages: S) -> impl Stream<Item = Result<Event, Infallible>>
where
    S: Stream<Item = T> + Send + 'static,
    T: Serialize + Send + 'static,
{
    messages.filter_map(move |message| async move {
        match Event::default().event(topic.as_str()).json_data(&message) {
            Ok(event) => Some(Ok(event)),
            Err(e) => {
                tracing::error!(topic = %topic, "Failed to encode SSE event: {}", e);
                None
            },
        }
    })
}
