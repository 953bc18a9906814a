//! Route handlers.

use axum::{
    body::Body,
    extract::{OriginalUri, Query, RawQuery, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::monitor::{ProblemRecord, ProxyCall, RequestRecord};
use crate::storage::{ProblemQuery, RequestQuery};

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub database: &'static str,
    pub upstream: String,
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let (status, code, database) = match state.store.ping().await {
        Ok(()) => ("operational", StatusCode::OK, "up"),
        Err(e) => {
            tracing::warn!(error = %e, "Database health probe failed");
            ("degraded", StatusCode::SERVICE_UNAVAILABLE, "down")
        }
    };

    (
        code,
        Json(HealthStatus {
            version: env!("CARGO_PKG_VERSION"),
            status,
            database,
            upstream: state.pipeline.upstream().base_url().to_string(),
        }),
    )
}

/// `GET /api/requests`
pub async fn list_requests(
    State(state): State<AppState>,
    Query(query): Query<RequestQuery>,
) -> Result<Json<Vec<RequestRecord>>, ApiError> {
    Ok(Json(state.store.list_requests(&query).await?))
}

/// `GET /api/problems`
pub async fn list_problems(
    State(state): State<AppState>,
    Query(query): Query<ProblemQuery>,
) -> Result<Json<Vec<ProblemRecord>>, ApiError> {
    Ok(Json(state.store.list_problems(&query).await?))
}

pub const PROXY_PREFIX: &str = "/api/proxy/";

/// Endpoint after [`PROXY_PREFIX`], still percent-encoded, so the upstream
/// receives and the record shows the path exactly as the caller sent it.
pub fn raw_endpoint(uri: &Uri) -> String {
    uri.path()
        .strip_prefix(PROXY_PREFIX)
        .unwrap_or_default()
        .to_string()
}

/// `GET|POST|PUT|DELETE /api/proxy/` and `/api/proxy/{*endpoint}`
///
/// The pipeline runs in its own task so that a caller hanging up does not
/// cancel the upstream call or its recording.
pub async fn proxy(
    State(state): State<AppState>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Body,
) -> Result<Response, ApiError> {
    let endpoint = raw_endpoint(&uri);
    tracing::debug!(method = %method, endpoint = %endpoint, "Proxying request");

    let call = ProxyCall {
        method,
        endpoint,
        query,
        headers,
        body,
    };
    let pipeline = state.pipeline.clone();
    let response = tokio::spawn(async move { pipeline.handle(call).await }).await??;

    Ok((
        response.status,
        [(header::CONTENT_TYPE, "application/json")],
        response.body,
    )
        .into_response())
}
