// Series Fetcher
// Retrieves one metric's time series from the upstream store. Never fails its caller:
// any upstream problem comes back as an empty series tagged with the reason.

use crate::config::UpstreamConfig;
use crate::middleware::RequestContext;
use crate::models::{MetricSample, MetricSeries};
use crate::services::metric_catalog;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// One upstream query: a single metric of a single node over `[from, to)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesQuery {
    pub node_id: String,
    pub metric_key: String,
    pub from: i64,
    pub to: i64,
    pub step: i64,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchFailure {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("HTTP status: {0}")]
    Status(u16),

    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("invalid upstream URL: {0}")]
    InvalidUrl(String),
}

/// Result of a single fetch. Both arms carry a well-formed series.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Fetched(MetricSeries),
    Empty { series: MetricSeries, reason: FetchFailure },
}

impl FetchOutcome {
    pub fn failed(query: &SeriesQuery, reason: FetchFailure) -> Self {
        Self::Empty {
            series: MetricSeries::empty(&query.metric_key, metric_catalog::title(&query.metric_key)),
            reason,
        }
    }

    pub fn series(&self) -> &MetricSeries {
        match self {
            Self::Fetched(series) | Self::Empty { series, .. } => series,
        }
    }

    pub fn into_series(self) -> MetricSeries {
        match self {
            Self::Fetched(series) | Self::Empty { series, .. } => series,
        }
    }

    pub fn failure(&self) -> Option<&FetchFailure> {
        match self {
            Self::Fetched(_) => None,
            Self::Empty { reason, .. } => Some(reason),
        }
    }
}

pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = FetchOutcome> + Send + 'a>>;

/// Source of per-metric time series
pub trait SeriesFetcher: Send + Sync + 'static {
    fn fetch<'a>(&'a self, ctx: &'a RequestContext, query: &'a SeriesQuery) -> FetchFuture<'a>;
}

pub struct HttpSeriesFetcher {
    http_client: Client,
    base_url: String,
}

impl HttpSeriesFetcher {
    pub fn new(config: &UpstreamConfig) -> Self {
        let http_client = Client::builder()
            .timeout(config.timeout())
            .build()
            .unwrap_or_default();

        Self {
            http_client,
            base_url: config.metrics_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// `{base}/v1/nodes/{node}/metrics/{key}` with node and key each encoded as one path segment
    pub fn series_url(&self, node_id: &str, metric_key: &str) -> Result<Url, FetchFailure> {
        // Dot segments would be dropped from the path rather than encoded
        if let Some(bad) = [node_id, metric_key].into_iter().find(|s| s.is_empty() || *s == "." || *s == "..") {
            return Err(FetchFailure::InvalidUrl(format!("'{}' is not a valid path segment", bad)));
        }

        let mut url = Url::parse(&self.base_url).map_err(|e| FetchFailure::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| FetchFailure::InvalidUrl(format!("'{}' cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(["v1", "nodes", node_id, "metrics", metric_key]);
        Ok(url)
    }

    async fn fetch_series(&self, ctx: &RequestContext, query: &SeriesQuery) -> FetchOutcome {
        let url = match self.series_url(&query.node_id, &query.metric_key) {
            Ok(url) => url,
            Err(reason) => return FetchOutcome::failed(query, reason),
        };
        tracing::debug!("Fetching series from: {}", url);

        let request = self
            .http_client
            .get(url)
            .query(&[("from", query.from), ("to", query.to), ("step", query.step)]);

        let response = match ctx.apply(request).send().await {
            Ok(response) => response,
            Err(e) => return FetchOutcome::failed(query, FetchFailure::Transport(e.to_string())),
        };

        if !response.status().is_success() {
            return FetchOutcome::failed(query, FetchFailure::Status(response.status().as_u16()));
        }

        let payload: UpstreamPayload = match response.json().await {
            Ok(payload) => payload,
            Err(e) => return FetchOutcome::failed(query, FetchFailure::Malformed(e.to_string())),
        };

        match payload.into_series(&query.metric_key) {
            Ok(series) => FetchOutcome::Fetched(series),
            Err(reason) => FetchOutcome::failed(query, reason),
        }
    }
}

impl SeriesFetcher for HttpSeriesFetcher {
    fn fetch<'a>(&'a self, ctx: &'a RequestContext, query: &'a SeriesQuery) -> FetchFuture<'a> {
        Box::pin(self.fetch_series(ctx, query))
    }
}

// =============================================================================
// Upstream wire format
// =============================================================================

/// Either a bare result-set array or a Prometheus-style `{data: {result: [...]}}` envelope.
/// The array arm must come first: untagged struct variants also accept sequences.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum UpstreamPayload {
    ResultSets(Vec<ResultSet>),
    Envelope { data: ResultData },
}

#[derive(Debug, Deserialize)]
struct ResultData {
    #[serde(default)]
    result: Vec<ResultSet>,
}

#[derive(Debug, Deserialize)]
struct ResultSet {
    #[serde(default)]
    values: Vec<RawSample>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawSample {
    Pair(f64, RawValue),
    Point { x: f64, y: RawValue },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawValue {
    Number(f64),
    Text(String),
}

impl RawValue {
    fn as_f64(&self) -> Result<f64, FetchFailure> {
        match self {
            RawValue::Number(n) => Ok(*n),
            RawValue::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| FetchFailure::Malformed(format!("non-numeric sample value '{}'", s))),
        }
    }
}

impl RawSample {
    fn to_sample(&self) -> Result<MetricSample, FetchFailure> {
        let (x, y) = match self {
            RawSample::Pair(x, y) | RawSample::Point { x, y } => (x, y),
        };
        Ok(MetricSample { x: *x as i64, y: y.as_f64()? })
    }
}

impl UpstreamPayload {
    fn into_series(self, metric_key: &str) -> Result<MetricSeries, FetchFailure> {
        let result_sets = match self {
            UpstreamPayload::Envelope { data } => data.result,
            UpstreamPayload::ResultSets(sets) => sets,
        };

        let has_more = result_sets.iter().any(|set| !set.values.is_empty());
        let samples = match result_sets.first() {
            Some(set) => set.values.iter().map(RawSample::to_sample).collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };

        Ok(MetricSeries {
            key: metric_key.to_string(),
            display_name: metric_catalog::title(metric_key).to_string(),
            samples,
            has_more,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::serve;
    use axum::{
        extract::{Path, Query},
        http::{HeaderMap, StatusCode},
        response::IntoResponse,
        routing::get,
        Json, Router,
    };
    use axum::http::Uri;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    async fn upstream_handler(
        Path((_node_id, key)): Path<(String, String)>,
        Query(params): Query<HashMap<String, i64>>,
        headers: HeaderMap,
    ) -> axum::response::Response {
        let from = params.get("from").copied().unwrap_or_default();
        match key.as_str() {
            "uptimetrx" => {
                if headers.get("authorization").is_none() {
                    return StatusCode::UNAUTHORIZED.into_response();
                }
                Json(json!({
                    "status": "success",
                    "data": {"result": [{"metric": {}, "values": [[from, "10"], [from + 1, "11.5"]]}]}
                }))
                .into_response()
            },
            "rrc" => Json(json!([{"values": [{"x": 1, "y": 0.9}]}])).into_response(),
            "rlc" => Json(json!([])).into_response(),
            "erab" => Json(json!([{"values": [[1, "n/a"]]}])).into_response(),
            "papower" => "definitely not json".into_response(),
            _ => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }

    async fn fetcher() -> HttpSeriesFetcher {
        let router = Router::new().route("/v1/nodes/:node_id/metrics/:key", get(upstream_handler));
        let base = serve(router).await;
        HttpSeriesFetcher::new(&UpstreamConfig {
            metrics_base_url: base,
            timeout_secs: 5,
            ..Default::default()
        })
    }

    fn query(key: &str) -> SeriesQuery {
        SeriesQuery {
            node_id: "node-1".to_string(),
            metric_key: key.to_string(),
            from: 100,
            to: 103,
            step: 1,
        }
    }

    fn ctx() -> RequestContext {
        RequestContext { authorization: Some("Bearer t".to_string()), cookie: None }
    }

    #[tokio::test]
    async fn test_envelope_payload_forwards_window_and_identity() {
        let fetcher = fetcher().await;
        let outcome = fetcher.fetch(&ctx(), &query("uptimetrx")).await;

        assert!(outcome.failure().is_none());
        let series = outcome.into_series();
        assert_eq!(series.display_name, "Uptime TRX");
        assert!(series.has_more);
        assert_eq!(
            series.samples,
            vec![MetricSample { x: 100, y: 10.0 }, MetricSample { x: 101, y: 11.5 }]
        );
    }

    #[tokio::test]
    async fn test_missing_identity_surfaces_as_status_failure() {
        let fetcher = fetcher().await;
        let outcome = fetcher.fetch(&RequestContext::default(), &query("uptimetrx")).await;

        assert_eq!(outcome.failure(), Some(&FetchFailure::Status(401)));
        assert!(outcome.series().samples.is_empty());
        assert!(!outcome.series().has_more);
    }

    #[tokio::test]
    async fn test_bare_result_sets() {
        let fetcher = fetcher().await;

        let rrc = fetcher.fetch(&ctx(), &query("rrc")).await;
        assert_eq!(rrc.series().samples, vec![MetricSample { x: 1, y: 0.9 }]);
        assert!(rrc.series().has_more);

        let rlc = fetcher.fetch(&ctx(), &query("rlc")).await;
        assert!(rlc.failure().is_none());
        assert!(!rlc.series().has_more);
        assert!(rlc.series().samples.is_empty());
    }

    #[tokio::test]
    async fn test_bad_payloads_are_absorbed() {
        let fetcher = fetcher().await;

        for key in ["erab", "papower"] {
            let outcome = fetcher.fetch(&ctx(), &query(key)).await;
            assert!(matches!(outcome.failure(), Some(FetchFailure::Malformed(_))), "{}", key);
            assert_eq!(outcome.series().key, key);
            assert!(!outcome.series().has_more);
        }

        let outcome = fetcher.fetch(&ctx(), &query("txpower")).await;
        assert_eq!(outcome.failure(), Some(&FetchFailure::Status(500)));
        assert_eq!(outcome.series().display_name, "TX Power");
    }

    #[tokio::test]
    async fn test_unreachable_upstream() {
        let fetcher = HttpSeriesFetcher::new(&UpstreamConfig {
            metrics_base_url: "http://127.0.0.1:1/".to_string(),
            timeout_secs: 2,
            ..Default::default()
        });

        assert_eq!(
            fetcher.series_url("n", "rrc").unwrap().as_str(),
            "http://127.0.0.1:1/v1/nodes/n/metrics/rrc"
        );
        let outcome = fetcher.fetch(&ctx(), &query("rrc")).await;
        assert!(matches!(outcome.failure(), Some(FetchFailure::Transport(_))));
    }

    #[tokio::test]
    async fn test_node_id_stays_inside_its_path_segment() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&seen);
        let router = Router::new().fallback(move |uri: Uri| {
            let recorder = Arc::clone(&recorder);
            async move {
                recorder.lock().unwrap().push(uri.path().to_string());
                Json(json!([{"values": [[0, "1"]]}]))
            }
        });
        let fetcher = HttpSeriesFetcher::new(&UpstreamConfig {
            metrics_base_url: serve(router).await,
            timeout_secs: 5,
            ..Default::default()
        });

        for node_id in ["n#x", "../../admin/metrics/rrc?", "a/b"] {
            let mut q = query("uptimetrx");
            q.node_id = node_id.to_string();
            assert!(fetcher.fetch(&ctx(), &q).await.failure().is_none(), "{}", node_id);
        }

        assert_eq!(
            seen.lock().unwrap().as_slice(),
            [
                "/v1/nodes/n%23x/metrics/uptimetrx",
                "/v1/nodes/..%2F..%2Fadmin%2Fmetrics%2Frrc%3F/metrics/uptimetrx",
                "/v1/nodes/a%2Fb/metrics/uptimetrx",
            ]
        );
    }

    #[tokio::test]
    async fn test_unusable_url_is_absorbed() {
        let fetcher = HttpSeriesFetcher::new(&UpstreamConfig {
            metrics_base_url: "http://127.0.0.1:1".to_string(),
            timeout_secs: 2,
            ..Default::default()
        });
        let mut q = query("rrc");
        q.node_id = "..".to_string();

        let outcome = fetcher.fetch(&ctx(), &q).await;
        assert!(matches!(outcome.failure(), Some(FetchFailure::InvalidUrl(_))));
        assert_eq!(outcome.series().key, "rrc");

        let not_a_base = HttpSeriesFetcher::new(&UpstreamConfig {
            metrics_base_url: "not a url".to_string(),
            timeout_secs: 2,
            ..Default::default()
        });
        assert!(matches!(not_a_base.series_url("n", "rrc"), Err(FetchFailure::InvalidUrl(_))));
    }
}
