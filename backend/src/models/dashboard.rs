use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimeFilter {
    Today,
    Week,
    Month,
    Total,
}

impl TimeFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeFilter::Today => "TODAY",
            TimeFilter::Week => "WEEK",
            TimeFilter::Month => "MONTH",
            TimeFilter::Total => "TOTAL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedUsers {
    pub total_user: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertType {
    Error,
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub title: Option<String>,
    pub description: Option<String>,
    pub alert_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Meta {
    pub count: u64,
    pub page: u32,
    pub size: u32,
    pub pages: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AlertsPage {
    pub alerts: Vec<Alert>,
    pub meta: Meta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page_no: u32,
    pub page_size: u32,
}

impl Pagination {
    pub fn first_page(page_size: u32) -> Self {
        Self { page_no: 1, page_size }
    }
}

/// Raw alert list as returned by the registry service
#[derive(Debug, Deserialize)]
pub struct UpstreamAlerts {
    #[serde(default)]
    pub data: Vec<Alert>,
    #[serde(default)]
    pub length: u64,
}

impl AlertsPage {
    /// Slice one page out of the registry's full alert list
    pub fn paginate(upstream: UpstreamAlerts, pagination: Pagination) -> Self {
        let size = pagination.page_size.max(1);
        let page = pagination.page_no.max(1);
        let count = upstream.length.max(upstream.data.len() as u64);
        let pages = count.div_ceil(size as u64) as u32;

        let alerts = upstream
            .data
            .into_iter()
            .skip(((page as u64 - 1) * size as u64) as usize)
            .take(size as usize)
            .collect();

        Self {
            alerts,
            meta: Meta { count, page, size, pages },
        }
    }
}
