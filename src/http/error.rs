//! Mapping of internal errors to HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::monitor::ProxyError;
use crate::storage::StoreError;

/// Errors surfaced to API callers as plain-text responses.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error(transparent)]
    Proxy(#[from] ProxyError),

    #[error("proxy task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Proxy(ProxyError::Upstream(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Proxy(ProxyError::InvalidTarget(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Storage(_) | ApiError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() && status != StatusCode::BAD_GATEWAY {
            tracing::error!(error = %self, "Request failed");
        }
        (status, self.to_string()).into_response()
    }
}
