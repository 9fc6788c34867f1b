// Shared fixtures for unit tests

use crate::middleware::RequestContext;
use crate::models::{MetricSample, MetricSeries};
use crate::services::metric_catalog;
use crate::services::series_fetcher::{
    FetchFailure, FetchFuture, FetchOutcome, SeriesFetcher, SeriesQuery,
};
use axum::Router;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Serve `router` on an ephemeral local port and return its base URL
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// In-memory fetcher returning `samples` points per metric (x = from + i, y = i)
#[derive(Default)]
pub struct StubFetcher {
    pub samples: usize,
    pub delays: HashMap<String, Duration>,
    pub failing: HashSet<String>,
    pub has_more: HashSet<String>,
    pub calls: Mutex<Vec<SeriesQuery>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl StubFetcher {
    pub fn with_samples(samples: usize) -> Self {
        Self { samples, ..Default::default() }
    }

    pub fn delay(mut self, key: &str, delay: Duration) -> Self {
        self.delays.insert(key.to_string(), delay);
        self
    }

    pub fn fail(mut self, key: &str) -> Self {
        self.failing.insert(key.to_string());
        self
    }

    pub fn more(mut self, key: &str) -> Self {
        self.has_more.insert(key.to_string());
        self
    }

    async fn respond(&self, query: &SeriesQuery) -> FetchOutcome {
        self.calls.lock().unwrap().push(query.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delays.get(&query.metric_key) {
            tokio::time::sleep(*delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(&query.metric_key) {
            return FetchOutcome::failed(query, FetchFailure::Status(503));
        }

        FetchOutcome::Fetched(MetricSeries {
            key: query.metric_key.clone(),
            display_name: metric_catalog::title(&query.metric_key).to_string(),
            samples: (0..self.samples)
                .map(|i| MetricSample { x: query.from + i as i64, y: i as f64 })
                .collect(),
            has_more: self.has_more.contains(&query.metric_key),
        })
    }
}

impl SeriesFetcher for StubFetcher {
    fn fetch<'a>(&'a self, _ctx: &'a RequestContext, query: &'a SeriesQuery) -> FetchFuture<'a> {
        Box::pin(self.respond(query))
    }
}
