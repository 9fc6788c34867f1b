// Metrics Service
// Fan-out aggregation of per-metric series for one node tab, with optional live replay

use crate::middleware::RequestContext;
use crate::models::{PollRequest, PollResult};
use crate::services::metric_catalog;
use crate::services::replay::{ReplayEngine, ReplayHandle};
use crate::services::series_fetcher::{FetchOutcome, SeriesFetcher, SeriesQuery};
use crate::utils::{ApiError, ApiResult};
use futures::future::join_all;
use std::sync::Arc;
use validator::Validate;

pub struct MetricsService {
    fetcher: Arc<dyn SeriesFetcher>,
    replay: Arc<ReplayEngine>,
    strict_catalog: bool,
    max_replay_ticks: usize,
}

impl MetricsService {
    pub fn new(fetcher: Arc<dyn SeriesFetcher>, replay: Arc<ReplayEngine>) -> Self {
        Self { fetcher, replay, strict_catalog: false, max_replay_ticks: usize::MAX }
    }

    /// Treat (node class, tab) pairs with no metrics as a request error
    pub fn with_strict_catalog(mut self, strict: bool) -> Self {
        self.strict_catalog = strict;
        self
    }

    /// Reject live polls whose window would replay more than `max_ticks` ticks
    pub fn with_max_replay_ticks(mut self, max_ticks: usize) -> Self {
        self.max_replay_ticks = max_ticks;
        self
    }

    /// Fetch every catalog metric of the tab concurrently and return them in catalog order.
    ///
    /// Completes once the slowest fetch resolves. Failing metrics come back empty
    /// with `has_more = false`; only request validation can fail the call.
    pub async fn aggregate(&self, ctx: &RequestContext, request: &PollRequest) -> ApiResult<PollResult> {
        request.validate()?;

        let keys = metric_catalog::resolve(request.node_class, request.tab);
        if keys.is_empty() {
            if self.strict_catalog {
                return Err(ApiError::UnknownCatalogEntry {
                    node_class: request.node_class,
                    tab: request.tab,
                });
            }
            tracing::debug!(
                node_class = ?request.node_class,
                tab = ?request.tab,
                "No metrics defined for tab"
            );
            return Ok(PollResult::from_series(request.to, Vec::new()));
        }

        let queries: Vec<SeriesQuery> = keys
            .iter()
            .map(|key| SeriesQuery {
                node_id: request.node_id.clone(),
                metric_key: key.to_string(),
                from: request.from,
                to: request.to,
                step: request.step,
            })
            .collect();

        let outcomes = join_all(queries.iter().map(|query| self.fetcher.fetch(ctx, query))).await;

        let series = outcomes
            .into_iter()
            .inspect(|outcome| {
                if let Some(reason) = outcome.failure() {
                    tracing::warn!(
                        node_id = %request.node_id,
                        metric = %outcome.series().key,
                        "Metric fetch failed, returning empty series: {}",
                        reason
                    );
                }
            })
            .map(FetchOutcome::into_series)
            .collect();

        Ok(PollResult::from_series(request.to, series))
    }

    /// Snapshot polls return the aggregated series. Live polls hand them to the
    /// replay engine and return an empty acknowledgement straight away.
    pub async fn poll(&self, ctx: &RequestContext, request: &PollRequest) -> ApiResult<PollResult> {
        let (result, _) = self.poll_with_handle(ctx, request).await?;
        Ok(result)
    }

    pub async fn poll_with_handle(
        &self,
        ctx: &RequestContext,
        request: &PollRequest,
    ) -> ApiResult<(PollResult, Option<ReplayHandle>)> {
        if request.live && request.tick_count() > self.max_replay_ticks {
            return Err(ApiError::validation_error(format!(
                "live window spans {} ticks, at most {} allowed",
                request.tick_count(),
                self.max_replay_ticks
            )));
        }

        let result = self.aggregate(ctx, request).await?;

        if !request.live {
            return Ok((result, None));
        }

        let handle = self.replay.start_replay(request, result.series);
        Ok((PollResult::live_ack(request.to), Some(handle)))
    }
}
