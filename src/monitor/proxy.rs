//! Proxy pipeline: forward, record, classify, link.
//!
//! ```text
//! ProxyCall
//!     → UpstreamClient::prepare   (construction error → 500, nothing recorded)
//!     → UpstreamClient::send      (one attempt, bounded)
//!     → RequestRecorder::record   (always, returns id)
//!     → Classifier::classify      (always)
//!     → ProblemRecorder::record   (when a problem was classified)
//!     → upstream response, or the upstream failure for a 502
//! ```

use std::sync::Arc;

use thiserror::Error;

use crate::config::MonitorConfig;
use crate::monitor::classifier::Classifier;
use crate::monitor::model::NewRequest;
use crate::monitor::recorder::{ProblemRecorder, RequestRecorder};
use crate::monitor::upstream::{ProxyCall, TargetError, UpstreamClient, UpstreamError, UpstreamResponse};
use crate::observability::metrics;
use crate::storage::MonitorStore;

#[derive(Debug, Error)]
pub enum ProxyError {
    /// The outbound request could not be built. Not recorded.
    #[error(transparent)]
    InvalidTarget(#[from] TargetError),

    /// The upstream call failed. Recorded and classified before surfacing.
    #[error("Request failed: {0}")]
    Upstream(#[from] UpstreamError),
}

/// Ties the upstream client, recorders and classifier together.
#[derive(Clone)]
pub struct ProxyPipeline {
    upstream: UpstreamClient,
    classifier: Classifier,
    requests: RequestRecorder,
    problems: ProblemRecorder,
}

impl ProxyPipeline {
    pub fn new(
        upstream: UpstreamClient,
        classifier: Classifier,
        requests: RequestRecorder,
        problems: ProblemRecorder,
    ) -> Self {
        Self {
            upstream,
            classifier,
            requests,
            problems,
        }
    }

    /// Build every component from configuration around a shared store.
    pub fn from_config(
        config: &MonitorConfig,
        store: Arc<dyn MonitorStore>,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self::new(
            UpstreamClient::new(&config.upstream)?,
            Classifier::new(&config.classification),
            RequestRecorder::new(store.clone()),
            ProblemRecorder::new(store, config.classification.problem_linking),
        ))
    }

    pub fn upstream(&self) -> &UpstreamClient {
        &self.upstream
    }

    /// Run one proxied call through the pipeline.
    pub async fn handle(&self, call: ProxyCall) -> Result<UpstreamResponse, ProxyError> {
        let method = call.method.to_string();
        let path = call.recorded_path();

        let request = self.upstream.prepare(call)?;
        let outcome = self.upstream.send(request).await;

        let status = outcome.status_code();
        let elapsed_ms = outcome.elapsed_ms();
        metrics::record_proxied_request(&method, status, outcome.elapsed);

        if let Err(e) = &outcome.result {
            tracing::warn!(method = %method, path = %path, elapsed_ms, error = %e, "Upstream call failed");
        }

        let request_id = self
            .requests
            .record(&NewRequest {
                method: method.clone(),
                path: path.clone(),
                response_code: status,
                response_time_ms: elapsed_ms,
                response_body: outcome.body_text(),
            })
            .await;

        if let Some(problem) = self.classifier.classify(&method, &path, status, elapsed_ms) {
            self.problems.record(request_id, problem).await;
        }

        outcome.result.map_err(ProxyError::from)
    }
}
