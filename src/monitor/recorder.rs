//! Best-effort persistence of requests and problems.
//!
//! Failures here are logged and counted, never surfaced to the caller of the
//! proxy.

use std::sync::Arc;

use crate::config::ProblemLinking;
use crate::monitor::classifier::Classification;
use crate::monitor::model::{NewProblem, NewRequest};
use crate::observability::metrics;
use crate::storage::MonitorStore;

/// Persists one request record per proxied call.
#[derive(Clone)]
pub struct RequestRecorder {
    store: Arc<dyn MonitorStore>,
}

impl RequestRecorder {
    pub fn new(store: Arc<dyn MonitorStore>) -> Self {
        Self { store }
    }

    /// Insert the record and return its identity, or `None` if the insert failed.
    pub async fn record(&self, request: &NewRequest) -> Option<i64> {
        match self.store.insert_request(request).await {
            Ok(id) => {
                tracing::debug!(
                    request_id = id,
                    method = %request.method,
                    path = %request.path,
                    status = request.response_code,
                    elapsed_ms = request.response_time_ms,
                    "Request recorded"
                );
                Some(id)
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    method = %request.method,
                    path = %request.path,
                    "Error logging request"
                );
                metrics::record_storage_error("insert_request");
                None
            }
        }
    }
}

/// Persists classified problems linked to their request.
#[derive(Clone)]
pub struct ProblemRecorder {
    store: Arc<dyn MonitorStore>,
    linking: ProblemLinking,
}

impl ProblemRecorder {
    pub fn new(store: Arc<dyn MonitorStore>, linking: ProblemLinking) -> Self {
        Self { store, linking }
    }

    /// Resolve the request to link and insert the problem.
    ///
    /// `inserted` is the identity returned by [`RequestRecorder::record`] for
    /// the same call. Returns the problem identity when one was persisted.
    pub async fn record(&self, inserted: Option<i64>, problem: Classification) -> Option<i64> {
        let request_id = self.resolve_request_id(inserted).await?;

        let new_problem = NewProblem {
            request_id,
            problem_type: problem.kind,
            severity: problem.severity,
            description: problem.description,
        };

        match self.store.insert_problem(&new_problem).await {
            Ok(id) => {
                tracing::info!(
                    problem_id = id,
                    request_id,
                    kind = %new_problem.problem_type,
                    severity = %new_problem.severity,
                    description = %new_problem.description,
                    "Problem detected"
                );
                metrics::record_problem(new_problem.problem_type, new_problem.severity);
                Some(id)
            }
            Err(e) => {
                tracing::error!(error = %e, request_id, "Error creating problem");
                metrics::record_storage_error("insert_problem");
                None
            }
        }
    }

    async fn resolve_request_id(&self, inserted: Option<i64>) -> Option<i64> {
        match self.linking {
            ProblemLinking::InsertedId => {
                if inserted.is_none() {
                    tracing::warn!("Request was not recorded, skipping problem");
                }
                inserted
            }
            ProblemLinking::LatestRequest => match self.store.latest_request_id().await {
                Ok(Some(id)) => Some(id),
                Ok(None) => {
                    tracing::warn!("No request rows found, skipping problem");
                    None
                }
                Err(e) => {
                    tracing::error!(error = %e, "Error getting last request ID");
                    metrics::record_storage_error("latest_request_id");
                    None
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::monitor::model::{ProblemKind, ProblemRecord, RequestRecord, Severity};
    use crate::storage::{ProblemQuery, RequestQuery, SqliteStore, StoreError, StoreResult};

    /// Rejects every operation.
    struct BrokenStore;

    #[async_trait]
    impl MonitorStore for BrokenStore {
        async fn insert_request(&self, _: &NewRequest) -> StoreResult<i64> {
            Err(StoreError::Unavailable("disk full".into()))
        }
        async fn latest_request_id(&self) -> StoreResult<Option<i64>> {
            Err(StoreError::Unavailable("disk full".into()))
        }
        async fn insert_problem(&self, _: &NewProblem) -> StoreResult<i64> {
            Err(StoreError::Unavailable("disk full".into()))
        }
        async fn list_requests(&self, _: &RequestQuery) -> StoreResult<Vec<RequestRecord>> {
            Err(StoreError::Unavailable("disk full".into()))
        }
        async fn list_problems(&self, _: &ProblemQuery) -> StoreResult<Vec<ProblemRecord>> {
            Err(StoreError::Unavailable("disk full".into()))
        }
        async fn ping(&self) -> StoreResult<()> {
            Err(StoreError::Unavailable("disk full".into()))
        }
    }

    fn new_request(path: &str, code: u16) -> NewRequest {
        NewRequest {
            method: "GET".into(),
            path: path.into(),
            response_code: code,
            response_time_ms: 20,
            response_body: String::new(),
        }
    }

    fn server_error(path: &str) -> Classification {
        Classification {
            kind: ProblemKind::ServerError,
            severity: Severity::Critical,
            description: format!("Server error 500 on GET {path}"),
        }
    }

    #[tokio::test]
    async fn test_problem_linked_to_inserted_request() {
        let store = Arc::new(SqliteStore::in_memory().await.unwrap());
        let requests = RequestRecorder::new(store.clone());
        let problems = ProblemRecorder::new(store.clone(), ProblemLinking::InsertedId);

        let first = requests.record(&new_request("/comments", 500)).await;
        // A later insert must not steal the link.
        requests.record(&new_request("/posts", 200)).await.unwrap();

        problems.record(first, server_error("/comments")).await.unwrap();

        let stored = store.list_problems(&ProblemQuery::default()).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(Some(stored[0].request_id), first);
    }

    #[tokio::test]
    async fn test_latest_request_linking() {
        let store = Arc::new(SqliteStore::in_memory().await.unwrap());
        let requests = RequestRecorder::new(store.clone());
        let problems = ProblemRecorder::new(store.clone(), ProblemLinking::LatestRequest);

        let first = requests.record(&new_request("/comments", 500)).await;
        let second = requests.record(&new_request("/posts", 200)).await;

        problems.record(first, server_error("/comments")).await.unwrap();

        let stored = store.list_problems(&ProblemQuery::default()).await.unwrap();
        assert_eq!(Some(stored[0].request_id), second);
    }

    #[tokio::test]
    async fn test_latest_request_linking_with_empty_table() {
        let store = Arc::new(SqliteStore::in_memory().await.unwrap());
        let problems = ProblemRecorder::new(store.clone(), ProblemLinking::LatestRequest);

        assert_eq!(problems.record(None, server_error("/x")).await, None);
        assert!(store.list_problems(&ProblemQuery::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_request_id_skips_problem() {
        let store = Arc::new(SqliteStore::in_memory().await.unwrap());
        let problems = ProblemRecorder::new(store.clone(), ProblemLinking::InsertedId);

        assert_eq!(problems.record(None, server_error("/x")).await, None);
        assert!(store.list_problems(&ProblemQuery::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_storage_failures_are_swallowed() {
        let store: Arc<dyn MonitorStore> = Arc::new(BrokenStore);
        let requests = RequestRecorder::new(store.clone());

        assert_eq!(requests.record(&new_request("/x", 500)).await, None);
        for linking in [ProblemLinking::InsertedId, ProblemLinking::LatestRequest] {
            let problems = ProblemRecorder::new(store.clone(), linking);
            assert_eq!(problems.record(Some(1), server_error("/x")).await, None);
        }
    }
}
