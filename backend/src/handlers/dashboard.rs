// Dashboard Handlers
// Connected-user counts and paged alerts proxied from the registry services

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::middleware::RequestContext;
use crate::models::{AlertsPage, ConnectedUsers, Pagination, TimeFilter};
use crate::utils::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ConnectedUsersParams {
    #[serde(default = "default_time_filter")]
    pub filter: TimeFilter,
}

fn default_time_filter() -> TimeFilter {
    TimeFilter::Week
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertsParams {
    #[serde(default = "default_page_no")]
    pub page_no: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page_no() -> u32 {
    1
}

fn default_page_size() -> u32 {
    50
}

// Get connected user count
#[utoipa::path(
    get,
    path = "/api/users/connected",
    params(
        ("filter" = Option<String>, Query, description = "TODAY, WEEK, MONTH or TOTAL (default: WEEK)")
    ),
    responses(
        (status = 200, description = "Connected users", body = ConnectedUsers),
        (status = 502, description = "Registry service unavailable")
    ),
    tag = "Dashboard"
)]
pub async fn get_connected_users(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Query(params): Query<ConnectedUsersParams>,
) -> ApiResult<Json<ConnectedUsers>> {
    tracing::debug!("GET /api/users/connected?filter={:?}", params.filter);

    let users = state.dashboard_service.connected_users(&ctx, params.filter).await?;
    Ok(Json(users))
}

// Get a page of alerts
#[utoipa::path(
    get,
    path = "/api/alerts",
    params(
        ("pageNo" = Option<u32>, Query, description = "Page number, starting at 1"),
        ("pageSize" = Option<u32>, Query, description = "Page size (default: 50)")
    ),
    responses(
        (status = 200, description = "Alerts page", body = AlertsPage),
        (status = 400, description = "Invalid pagination"),
        (status = 502, description = "Registry service unavailable")
    ),
    tag = "Dashboard"
)]
pub async fn get_alerts(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Query(params): Query<AlertsParams>,
) -> ApiResult<Json<AlertsPage>> {
    let pagination = Pagination { page_no: params.page_no, page_size: params.page_size };
    tracing::debug!("GET /api/alerts?pageNo={}&pageSize={}", pagination.page_no, pagination.page_size);

    let page = state.dashboard_service.alerts(&ctx, pagination).await?;
    Ok(Json(page))
}
