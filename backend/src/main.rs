use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::env;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod handlers;
mod middleware;
mod models;
mod services;
#[cfg(test)]
mod test_support;
mod utils;

use config::Config;
use services::{
    CanonicalQuery, DashboardService, HttpSeriesFetcher, KeepAliveTask, MetricsService,
    ReplayEngine, SeriesFetcher, SubscriptionGateway,
};
use utils::ScheduledExecutor;

/// Application shared state
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<SubscriptionGateway>,
    pub metrics_service: Arc<MetricsService>,
    pub dashboard_service: Arc<DashboardService>,
}

impl AppState {
    pub fn new(config: &Config, fetcher: Arc<dyn SeriesFetcher>, shutdown: &CancellationToken) -> Self {
        let gateway = Arc::new(SubscriptionGateway::new(config.replay.channel_capacity));

        let replay = Arc::new(ReplayEngine::new(
            Arc::clone(&gateway),
            config.replay.tick_interval(),
            shutdown.child_token(),
        ));

        let metrics_service = Arc::new(
            MetricsService::new(fetcher, replay)
                .with_strict_catalog(config.catalog.strict)
                .with_max_replay_ticks(config.replay.max_ticks),
        );

        let dashboard_service = Arc::new(DashboardService::new(&config.upstream, Arc::clone(&gateway)));

        Self { gateway, metrics_service, dashboard_service }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::metrics::poll_metrics_by_tab,
        handlers::metrics::metrics_stream,
        handlers::dashboard::get_connected_users,
        handlers::dashboard::get_alerts,
        handlers::subscriptions::subscribe_topic,
    ),
    components(
        schemas(
            models::NodeClass,
            models::GraphsTab,
            models::MetricSample,
            models::MetricSeries,
            models::PollRequest,
            models::PollResult,
            models::TimeFilter,
            models::ConnectedUsers,
            models::AlertType,
            models::Alert,
            models::Meta,
            models::AlertsPage,
        )
    ),
    tags(
        (name = "Metrics", description = "Node metrics polling and live replay"),
        (name = "Dashboard", description = "Aggregate dashboard reads"),
        (name = "Subscriptions", description = "Server-Sent Event topic streams"),
    )
)]
struct ApiDoc;

fn setup_logging() {
    // "json" or "pretty"
    let log_format = env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".into());
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("node_metrics_bff=info"));

    let fmt_layer = match log_format.as_str() {
        "json" => fmt::layer().json().with_target(true).with_current_span(false).boxed(),
        _ => fmt::layer().pretty().with_target(true).with_ansi(true).boxed(),
    };
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn app(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Metrics
        .route("/api/metrics/by-tab", post(handlers::metrics::poll_metrics_by_tab))
        .route("/api/metrics/stream", get(handlers::metrics::metrics_stream))
        // Dashboard
        .route("/api/users/connected", get(handlers::dashboard::get_connected_users))
        .route("/api/alerts", get(handlers::dashboard::get_alerts))
        // Subscriptions
        .route("/api/subscriptions/:topic", get(handlers::subscriptions::subscribe_topic))
        .with_state(state)
        .layer(axum_middleware::from_fn(middleware::request_context_middleware));

    let health_routes = Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(ready_check));

    Router::new()
        .merge(SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_routes)
        .merge(health_routes)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(tower_http::cors::CorsLayer::permissive())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    setup_logging();
    let config = Config::load()?;

    tracing::info!("Node metrics BFF starting up");
    tracing::info!(
        "Metrics store: {}, registry services: {}",
        config.upstream.metrics_base_url,
        config.upstream.services_base_url
    );

    let shutdown = CancellationToken::new();
    let fetcher: Arc<dyn SeriesFetcher> = Arc::new(HttpSeriesFetcher::new(&config.upstream));
    let state = Arc::new(AppState::new(&config, fetcher, &shutdown));

    let keep_alive = if config.keep_alive.enabled {
        let task = KeepAliveTask::new(
            Arc::clone(&state.dashboard_service),
            CanonicalQuery::defaults(config.keep_alive.alerts_page_size),
        );
        let executor = ScheduledExecutor::new("keep-alive", config.keep_alive.interval()).with_shutdown(&shutdown);
        Some(executor.spawn(task))
    } else {
        tracing::info!("Keep-alive scheduler disabled");
        None
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("API documentation available at http://{}/api-docs", addr);

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        signal_token.cancel();
    });

    let server_token = shutdown.clone();
    axum::serve(listener, app(state))
        .with_graceful_shutdown(async move { server_token.cancelled().await })
        .await?;

    if let Some(handle) = keep_alive {
        handle.stop().await;
    }
    tracing::info!("Node metrics BFF stopped");

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}

async fn ready_check() -> &'static str {
    "READY"
}
