use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::models::{GraphsTab, NodeClass};

/// API Error with stable numeric codes
///
/// Per-metric upstream failures are never represented here: the series fetcher
/// absorbs them. Only request-level failures reach the caller.
#[derive(Error, Debug)]
pub enum ApiError {
    // Upstream errors 2xxx
    #[error("Upstream unavailable: {message}")]
    UpstreamUnavailable { message: String },

    #[error("Unexpected upstream response: {message}")]
    UpstreamResponse { message: String },

    // Validation errors 4xxx
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No metrics defined for node class {node_class:?} on tab {tab:?}")]
    UnknownCatalogEntry { node_class: NodeClass, tab: GraphsTab },

    // System errors 5xxx
    #[error("Internal error: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    pub fn upstream_unavailable(message: impl Into<String>) -> Self {
        Self::UpstreamUnavailable { message: message.into() }
    }

    pub fn upstream_response(message: impl Into<String>) -> Self {
        Self::UpstreamResponse { message: message.into() }
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }

    pub fn error_code(&self) -> i32 {
        match self {
            Self::UpstreamUnavailable { .. } => 2001,
            Self::UpstreamResponse { .. } => 2002,

            Self::ValidationError(_) => 4001,
            Self::InvalidInput(_) => 4002,
            Self::UnknownCatalogEntry { .. } => 4003,

            Self::InternalError(_) => 5001,
            Self::Other(_) => 5001,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.error_code() {
            2001..=2999 => StatusCode::BAD_GATEWAY,
            4001..=4999 => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let response = ApiErrorResponse {
            code: self.error_code(),
            message: self.to_string(),
            details: None,
        };

        (status, Json(response)).into_response()
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::internal_error(format!("JSON serialization error: {}", err))
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::validation_error(err.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::upstream_unavailable("connection refused").status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(ApiError::validation_error("step").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::UnknownCatalogEntry { node_class: NodeClass::Amplifier, tab: GraphsTab::Radio }
                .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
