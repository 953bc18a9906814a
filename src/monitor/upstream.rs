//! Outbound calls to the fixed upstream service.
//!
//! # Responsibilities
//! - Join the configured base URL with the proxied endpoint
//! - Copy inbound headers and stream the inbound body
//! - Enforce a single deadline over the whole call (send + body read)
//! - Report status, body and elapsed time, or the failure and elapsed time
//! - Keep the received status when only the body read fails
//!
//! # Design Decisions
//! - One attempt only, no retries
//! - `Host` is the only inbound header not copied; it names this service,
//!   not the upstream
//! - Building the request is separate from sending it, so construction
//!   errors are never recorded as upstream failures

use std::time::{Duration, Instant};

use axum::body::{Body, Bytes, HttpBody};
use axum::http::{header, HeaderMap, Method, StatusCode};
use thiserror::Error;
use url::Url;

use crate::config::UpstreamConfig;
use crate::monitor::model::STATUS_UNAVAILABLE;

/// Upstream transport failure. `Display` is what gets logged as the body.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream request timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    #[error("upstream connection failed: {0}")]
    Connect(#[source] reqwest::Error),

    #[error("upstream transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The status line arrived but reading the body failed.
    #[error("upstream body read failed after status {status}: {source}")]
    Body {
        status: StatusCode,
        #[source]
        source: reqwest::Error,
    },
}

impl UpstreamError {
    /// Status received before the failure, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            UpstreamError::Body { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            UpstreamError::Timeout(e)
        } else if e.is_connect() {
            UpstreamError::Connect(e)
        } else {
            UpstreamError::Transport(e)
        }
    }
}

/// The outbound request could not be built from the routed input.
#[derive(Debug, Error)]
pub enum TargetError {
    #[error("invalid upstream URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("invalid outbound request: {0}")]
    Request(#[from] reqwest::Error),
}

/// One inbound call to be forwarded.
#[derive(Debug)]
pub struct ProxyCall {
    pub method: Method,
    /// Path after `/api/proxy/`, without a leading slash, percent-encoded as received.
    pub endpoint: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Body,
}

impl ProxyCall {
    /// Upstream-relative path as recorded: leading slash plus endpoint.
    pub fn recorded_path(&self) -> String {
        format!("/{}", self.endpoint)
    }
}

/// A fully read upstream response.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

/// Result of one outbound attempt with its elapsed time.
#[derive(Debug)]
pub struct UpstreamOutcome {
    pub result: Result<UpstreamResponse, UpstreamError>,
    pub elapsed: Duration,
}

impl UpstreamOutcome {
    /// Status code, or [`STATUS_UNAVAILABLE`] when none was obtained.
    pub fn status_code(&self) -> u16 {
        match &self.result {
            Ok(response) => response.status.as_u16(),
            Err(e) => e.status().map_or(STATUS_UNAVAILABLE, |s| s.as_u16()),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX)
    }

    /// Text persisted as the response body: the upstream body, or the error text.
    pub fn body_text(&self) -> String {
        match &self.result {
            Ok(response) => String::from_utf8_lossy(&response.body).into_owned(),
            Err(e) => e.to_string(),
        }
    }
}

/// HTTP client bound to the configured upstream.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    base_url: String,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `<base>/<endpoint>[?query]`
    pub fn target_url(&self, endpoint: &str, query: Option<&str>) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&format!("{}/{}", self.base_url, endpoint))?;
        url.set_query(query.filter(|q| !q.is_empty()));
        Ok(url)
    }

    /// Build the outbound request for `call`, consuming its headers and body.
    pub fn prepare(&self, call: ProxyCall) -> Result<reqwest::Request, TargetError> {
        let url = self.target_url(&call.endpoint, call.query.as_deref())?;

        let mut headers = HeaderMap::with_capacity(call.headers.len());
        for (name, value) in call.headers.iter() {
            if *name != header::HOST {
                headers.append(name.clone(), value.clone());
            }
        }

        let mut builder = self.client.request(call.method, url).headers(headers);
        if !call.body.is_end_stream() {
            builder = builder.body(reqwest::Body::wrap_stream(call.body.into_data_stream()));
        }
        Ok(builder.build()?)
    }

    /// Send a prepared request and read the whole response body.
    pub async fn send(&self, request: reqwest::Request) -> UpstreamOutcome {
        let started = Instant::now();
        let result = match self.client.execute(request).await {
            Ok(response) => {
                let status = response.status();
                response
                    .bytes()
                    .await
                    .map(|body| UpstreamResponse { status, body })
                    .map_err(|source| UpstreamError::Body { status, source })
            }
            Err(e) => Err(UpstreamError::from(e)),
        };

        UpstreamOutcome {
            result,
            elapsed: started.elapsed(),
        }
    }
}
