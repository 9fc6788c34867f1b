use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Hardware category of a managed unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeClass {
    Tower,
    Amplifier,
    Home,
}

/// Dashboard section, secondary key into the metric catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GraphsTab {
    Overview,
    Network,
    Radio,
    Resources,
    NodeStatus,
    Home,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MetricSample {
    pub x: i64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetricSeries {
    pub key: String,
    pub display_name: String,
    pub samples: Vec<MetricSample>,
    /// Upstream returned at least one usable result set
    pub has_more: bool,
}

impl MetricSeries {
    pub fn empty(key: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            display_name: display_name.into(),
            samples: Vec::new(),
            has_more: false,
        }
    }

    /// Entry for one replay tick: the sample at `index`, or nothing
    pub fn tick_slice(&self, index: usize) -> Self {
        Self {
            key: self.key.clone(),
            display_name: self.display_name.clone(),
            samples: self.samples.get(index).copied().into_iter().collect(),
            has_more: self.has_more,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_window"))]
pub struct PollRequest {
    #[validate(
        length(min = 1, message = "nodeId must not be empty"),
        custom(function = "validate_node_id")
    )]
    pub node_id: String,
    pub node_class: NodeClass,
    pub tab: GraphsTab,
    pub from: i64,
    pub to: i64,
    #[validate(range(min = 1, message = "step must be at least 1"))]
    pub step: i64,
    #[serde(default)]
    pub live: bool,
}

fn validate_node_id(node_id: &str) -> Result<(), ValidationError> {
    if node_id == "." || node_id == ".." {
        let mut err = ValidationError::new("node_id");
        err.message = Some("nodeId must not be a dot segment".into());
        return Err(err);
    }
    Ok(())
}

fn validate_window(request: &PollRequest) -> Result<(), ValidationError> {
    if request.from > request.to {
        let mut err = ValidationError::new("window");
        err.message = Some("from must not be after to".into());
        return Err(err);
    }
    Ok(())
}

impl PollRequest {
    /// Number of simulated ticks a live replay of this window produces
    pub fn tick_count(&self) -> usize {
        usize::try_from(self.to.saturating_sub(self.from)).unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PollResult {
    pub to: i64,
    pub has_more: bool,
    pub series: Vec<MetricSeries>,
}

impl PollResult {
    pub fn from_series(to: i64, series: Vec<MetricSeries>) -> Self {
        let has_more = series.iter().any(|s| s.has_more);
        Self { to, has_more, series }
    }

    /// Acknowledgement for live polls; data follows on the stream
    pub fn live_ack(to: i64) -> Self {
        Self { to, has_more: false, series: Vec::new() }
    }
}

/// One simulated time-step across every metric of a tab, in catalog order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamTick {
    pub entries: Vec<MetricSeries>,
}

impl StreamTick {
    pub fn at(series: &[MetricSeries], index: usize) -> Self {
        Self {
            entries: series.iter().map(|s| s.tick_slice(index)).collect(),
        }
    }
}
