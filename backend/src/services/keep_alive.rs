// Keep-Alive Task
// Re-runs the canonical dashboard reads on a schedule so open dashboards keep
// receiving connected-user and alert updates without a user-triggered poll.

use crate::impl_scheduled_task;
use crate::middleware::RequestContext;
use crate::models::{Pagination, TimeFilter};
use crate::services::DashboardService;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanonicalQuery {
    ConnectedUsers { filter: TimeFilter },
    Alerts { pagination: Pagination },
}

impl CanonicalQuery {
    /// Connected users over the last week, then the first page of alerts
    pub fn defaults(alerts_page_size: u32) -> Vec<Self> {
        vec![
            CanonicalQuery::ConnectedUsers { filter: TimeFilter::Week },
            CanonicalQuery::Alerts { pagination: Pagination::first_page(alerts_page_size) },
        ]
    }

    fn label(&self) -> &'static str {
        match self {
            CanonicalQuery::ConnectedUsers { .. } => "connected-users",
            CanonicalQuery::Alerts { .. } => "alerts",
        }
    }
}

pub struct KeepAliveTask {
    dashboard: Arc<DashboardService>,
    queries: Vec<CanonicalQuery>,
    ctx: RequestContext,
}

impl KeepAliveTask {
    pub fn new(dashboard: Arc<DashboardService>, queries: Vec<CanonicalQuery>) -> Self {
        Self {
            dashboard,
            queries,
            ctx: RequestContext::synthetic(),
        }
    }

    /// Run every canonical query; one failing query does not skip the rest
    async fn execute(&self) -> Result<(), anyhow::Error> {
        let mut failed = Vec::new();

        for query in &self.queries {
            let res = match query {
                CanonicalQuery::ConnectedUsers { filter } => {
                    self.dashboard.connected_users(&self.ctx, *filter).await.map(|_| ())
                },
                CanonicalQuery::Alerts { pagination } => {
                    self.dashboard.alerts(&self.ctx, *pagination).await.map(|_| ())
                },
            };

            if let Err(e) = res {
                tracing::warn!(query = query.label(), "Keep-alive query failed: {}", e);
                failed.push(query.label());
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(anyhow::anyhow!("keep-alive queries failed: {}", failed.join(", ")))
        }
    }
}

impl_scheduled_task!(KeepAliveTask, "keep-alive", execute);
