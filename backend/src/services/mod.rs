pub mod dashboard_service;
pub mod gateway;
pub mod keep_alive;
pub mod metric_catalog;
pub mod metrics_service;
pub mod replay;
pub mod series_fetcher;

pub use dashboard_service::DashboardService;
pub use gateway::{SubscriptionGateway, Topic};
pub use keep_alive::{CanonicalQuery, KeepAliveTask};
pub use metrics_service::MetricsService;
pub use replay::ReplayEngine;
pub use series_fetcher::{HttpSeriesFetcher, SeriesFetcher};
