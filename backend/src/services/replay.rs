// Live Replay Engine
// Re-emits already-fetched history one time-step per tick on its own task, so the
// paced loop never holds up request handling. A replay runs to completion unless
// the process-wide shutdown token fires; subscriber disconnects do not stop it.

use crate::models::{MetricSeries, PollRequest, StreamTick};
use crate::services::gateway::{SubscriptionGateway, Topic, TopicMessage};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayOutcome {
    Completed { ticks: usize },
    Cancelled { published: usize },
}

pub struct ReplayHandle {
    cancel: CancellationToken,
    join: JoinHandle<ReplayOutcome>,
}

#[allow(dead_code)]
impl ReplayHandle {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub async fn wait(self) -> Result<ReplayOutcome, tokio::task::JoinError> {
        self.join.await
    }
}

pub struct ReplayEngine {
    gateway: Arc<SubscriptionGateway>,
    tick_interval: Duration,
    shutdown: CancellationToken,
}

impl ReplayEngine {
    pub fn new(
        gateway: Arc<SubscriptionGateway>,
        tick_interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self { gateway, tick_interval, shutdown }
    }

    /// Spawn a replay of `series` over the request window. Tick `i` carries the `i`-th
    /// sample of every series (or an empty entry) and is published one interval after tick `i-1`.
    pub fn start_replay(&self, request: &PollRequest, series: Vec<MetricSeries>) -> ReplayHandle {
        let ticks = request.tick_count();
        let cancel = self.shutdown.child_token();
        let gateway = Arc::clone(&self.gateway);
        let tick_interval = self.tick_interval;
        let node_id = request.node_id.clone();

        tracing::info!(
            node_id = %node_id,
            tab = ?request.tab,
            ticks,
            metrics = series.len(),
            "Starting live replay"
        );

        let token = cancel.clone();
        let join = tokio::spawn(async move {
            for index in 0..ticks {
                tokio::select! {
                    _ = token.cancelled() => {
                        tracing::info!(node_id = %node_id, published = index, "Live replay cancelled");
                        return ReplayOutcome::Cancelled { published: index };
                    }
                    _ = tokio::time::sleep(tick_interval) => {}
                }

                let tick = StreamTick::at(&series, index);
                let receivers = gateway.publish(Topic::MetricsByTab, TopicMessage::MetricsTick(tick));
                tracing::debug!(node_id = %node_id, tick = index, receivers, "Published replay tick");
            }

            tracing::info!(node_id = %node_id, ticks, "Live replay completed");
            ReplayOutcome::Completed { ticks }
        });

        ReplayHandle { cancel, join }
    }
}
