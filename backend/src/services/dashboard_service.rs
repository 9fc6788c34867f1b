// Dashboard Service
// Aggregate dashboard reads (connected users, alerts) proxied from the registry services.
// Each read also publishes its result so open dashboards refresh without polling.

use crate::config::UpstreamConfig;
use crate::middleware::RequestContext;
use crate::models::{AlertsPage, ConnectedUsers, Pagination, TimeFilter, UpstreamAlerts};
use crate::services::gateway::{SubscriptionGateway, Topic, TopicMessage};
use crate::utils::{ApiError, ApiResult};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpstreamConnectedUsers {
    total_user: Value,
}

impl From<UpstreamConnectedUsers> for ConnectedUsers {
    fn from(raw: UpstreamConnectedUsers) -> Self {
        let total_user = match raw.total_user {
            Value::String(s) => s,
            Value::Null => "0".to_string(),
            other => other.to_string(),
        };
        ConnectedUsers { total_user }
    }
}

pub struct DashboardService {
    http_client: Client,
    base_url: String,
    gateway: Arc<SubscriptionGateway>,
}

impl DashboardService {
    pub fn new(config: &UpstreamConfig, gateway: Arc<SubscriptionGateway>) -> Self {
        let http_client = Client::builder()
            .timeout(config.timeout())
            .build()
            .unwrap_or_default();

        Self {
            http_client,
            base_url: config.services_base_url.trim_end_matches('/').to_string(),
            gateway,
        }
    }

    pub async fn connected_users(
        &self,
        ctx: &RequestContext,
        filter: TimeFilter,
    ) -> ApiResult<ConnectedUsers> {
        let raw: UpstreamConnectedUsers = self
            .get_json(ctx, "/v1/users/connected", &[("filter", filter.as_str().to_string())])
            .await?;
        let users = ConnectedUsers::from(raw);

        let receivers = self
            .gateway
            .publish(Topic::ConnectedUsers, TopicMessage::ConnectedUsers(users.clone()));
        tracing::debug!(filter = filter.as_str(), receivers, "Connected users refreshed");

        Ok(users)
    }

    pub async fn alerts(&self, ctx: &RequestContext, pagination: Pagination) -> ApiResult<AlertsPage> {
        if pagination.page_no == 0 || pagination.page_size == 0 {
            return Err(ApiError::validation_error("pageNo and pageSize must be at least 1"));
        }

        let raw: UpstreamAlerts = self
            .get_json(
                ctx,
                "/v1/alerts",
                &[
                    ("page", pagination.page_no.to_string()),
                    ("size", pagination.page_size.to_string()),
                ],
            )
            .await?;
        let page = AlertsPage::paginate(raw, pagination);

        let receivers = self.gateway.publish(Topic::Alerts, TopicMessage::Alerts(page.clone()));
        tracing::debug!(page = pagination.page_no, receivers, "Alerts refreshed");

        Ok(page)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        path: &str,
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("Fetching {}", url);

        let response = ctx
            .apply(self.http_client.get(&url).query(query))
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Request to {} failed: {}", url, e);
                ApiError::upstream_unavailable(format!("Request failed: {}", e))
            })?;

        if !response.status().is_success() {
            tracing::error!("{} returned error status: {}", url, response.status());
            return Err(ApiError::upstream_response(format!("HTTP status: {}", response.status())));
        }

        response.json::<T>().await.map_err(|e| {
            tracing::error!("Failed to parse response from {}: {}", url, e);
            ApiError::upstream_response(format!("Failed to parse response: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AlertType;
    use crate::test_support::serve;
    use axum::{extract::Query, http::StatusCode, routing::get, Json, Router};
    use serde_json::json;
    use std::collections::HashMap;
    use tokio_stream::StreamExt;

    async fn registry() -> String {
        let router = Router::new()
            .route(
                "/v1/users/connected",
                get(|Query(q): Query<HashMap<String, String>>| async move {
                    match q.get("filter").map(String::as_str) {
                        Some("WEEK") => Json(json!({"totalUser": 42})),
                        _ => Json(json!({"totalUser": "7"})),
                    }
                }),
            )
            .route(
                "/v1/alerts",
                get(|| async {
                    Json(json!({
                        "status": "success",
                        "length": 3,
                        "data": [
                            {"id": "1", "type": "ERROR", "title": "Link down"},
                            {"id": "2", "type": "INFO", "title": "Updated"},
                            {"id": "3", "type": "WARNING", "title": "Temperature"}
                        ]
                    }))
                }),
            );
        serve(router).await
    }

    fn service(base: String) -> (Arc<SubscriptionGateway>, DashboardService) {
        let gateway = Arc::new(SubscriptionGateway::new(16));
        let config = UpstreamConfig { services_base_url: base, timeout_secs: 5, ..Default::default() };
        (Arc::clone(&gateway), DashboardService::new(&config, gateway))
    }

    #[tokio::test]
    async fn test_connected_users_publishes() {
        let (gateway, service) = service(registry().await);
        let mut updates = Box::pin(gateway.subscribe(Topic::ConnectedUsers));

        let users = service.connected_users(&RequestContext::default(), TimeFilter::Week).await.unwrap();
        assert_eq!(users.total_user, "42");
        assert_eq!(updates.next().await, Some(TopicMessage::ConnectedUsers(users)));

        let today = service.connected_users(&RequestContext::default(), TimeFilter::Today).await.unwrap();
        assert_eq!(today.total_user, "7");
    }

    #[tokio::test]
    async fn test_alerts_first_page() {
        let (gateway, service) = service(registry().await);
        let mut updates = Box::pin(gateway.subscribe(Topic::Alerts));

        let page = service
            .alerts(&RequestContext::default(), Pagination { page_no: 1, page_size: 2 })
            .await
            .unwrap();

        assert_eq!(page.alerts.len(), 2);
        assert_eq!(page.alerts[0].alert_type, AlertType::Error);
        assert_eq!(page.meta.pages, 2);
        assert_eq!(updates.next().await, Some(TopicMessage::Alerts(page)));
    }

    #[tokio::test]
    async fn test_zero_page_size_is_rejected() {
        let (_, service) = service(registry().await);
        let err = service
            .alerts(&RequestContext::default(), Pagination { page_no: 1, page_size: 0 })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_upstream_errors_propagate() {
        let router = Router::new().route(
            "/v1/users/connected",
            get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
        );
        let (_, failing) = service(serve(router).await);
        let err = failing.connected_users(&RequestContext::default(), TimeFilter::Week).await.unwrap_err();
        assert!(matches!(err, ApiError::UpstreamResponse { .. }));

        let (_, unreachable) = service("http://127.0.0.1:1".to_string());
        let err = unreachable
            .alerts(&RequestContext::default(), Pagination::first_page(10))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::UpstreamUnavailable { .. }));
    }
}
