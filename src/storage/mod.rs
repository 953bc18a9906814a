//! Storage subsystem.
//!
//! # Data Flow
//! ```text
//! Proxy pipeline:
//!     → insert_request (always, returns the new id)
//!     → insert_problem (when classified), linked by id
//!
//! List endpoints:
//!     query string → query.rs (typed filters + allow-listed sort)
//!     → list_requests / list_problems
//! ```
//!
//! # Design Decisions
//! - The store is constructed once and injected; there is no global handle
//! - Single-statement writes only; no multi-statement transactions
//! - `MonitorStore` is object safe so the pipeline can be tested against
//!   failing backends

pub mod query;
pub mod schema;
pub mod seed;
pub mod sqlite;

use async_trait::async_trait;
use thiserror::Error;

use crate::monitor::model::{NewProblem, NewRequest, ProblemRecord, RequestRecord};

pub use query::{ProblemQuery, ProblemSortField, RequestQuery, RequestSortField, SortOrder};
pub use sqlite::SqliteStore;

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Append-only storage for request and problem records.
#[async_trait]
pub trait MonitorStore: Send + Sync {
    /// Insert a request record and return its identity.
    async fn insert_request(&self, request: &NewRequest) -> StoreResult<i64>;

    /// Identity of the most recently inserted request, if any.
    async fn latest_request_id(&self) -> StoreResult<Option<i64>>;

    /// Insert a problem record and return its identity.
    async fn insert_problem(&self, problem: &NewProblem) -> StoreResult<i64>;

    async fn list_requests(&self, query: &RequestQuery) -> StoreResult<Vec<RequestRecord>>;

    async fn list_problems(&self, query: &ProblemQuery) -> StoreResult<Vec<ProblemRecord>>;

    /// Cheap reachability probe for health reporting.
    async fn ping(&self) -> StoreResult<()>;
}
