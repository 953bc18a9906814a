//! SQLite storage backend.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::config::DatabaseConfig;
use crate::monitor::model::{NewProblem, NewRequest, ProblemRecord, RequestRecord};
use crate::storage::{schema, MonitorStore, ProblemQuery, RequestQuery, StoreResult};

/// `MonitorStore` over a pooled SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the configured database and bootstrap the schema.
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // Every connection to ":memory:" is a separate database, so the pool
        // must hold exactly one connection and never recycle it.
        let pool = if config.url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(Option::<Duration>::None)
                .max_lifetime(Option::<Duration>::None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(config.max_connections)
                .connect_with(options)
                .await?
        };

        schema::bootstrap(&pool).await?;
        tracing::info!(url = %config.url, "Connected to database");
        Ok(Self { pool })
    }

    /// A private in-memory store, used by tests and `sqlite::memory:` configs.
    pub async fn in_memory() -> StoreResult<Self> {
        Self::connect(&DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            ..DatabaseConfig::default()
        })
        .await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl MonitorStore for SqliteStore {
    async fn insert_request(&self, request: &NewRequest) -> StoreResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO api_requests (method, path, response_code, response_time, response_body)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&request.method)
        .bind(&request.path)
        .bind(i64::from(request.response_code))
        .bind(i64::try_from(request.response_time_ms).unwrap_or(i64::MAX))
        .bind(&request.response_body)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn latest_request_id(&self) -> StoreResult<Option<i64>> {
        let id = sqlx::query_scalar::<_, i64>("SELECT id FROM api_requests ORDER BY id DESC LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }

    async fn insert_problem(&self, problem: &NewProblem) -> StoreResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO problems (request_id, problem_type, severity, description)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(problem.request_id)
        .bind(problem.problem_type.as_str())
        .bind(problem.severity.as_str())
        .bind(&problem.description)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn list_requests(&self, query: &RequestQuery) -> StoreResult<Vec<RequestRecord>> {
        let mut builder = query.build();
        let records = builder
            .build_query_as::<RequestRecord>()
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }

    async fn list_problems(&self, query: &ProblemQuery) -> StoreResult<Vec<ProblemRecord>> {
        let mut builder = query.build();
        let records = builder
            .build_query_as::<ProblemRecord>()
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::model::{ProblemKind, Severity};
    use crate::storage::{seed, ProblemSortField, RequestSortField, SortOrder};

    fn request(method: &str, path: &str, code: u16, time_ms: u64) -> NewRequest {
        NewRequest {
            method: method.into(),
            path: path.into(),
            response_code: code,
            response_time_ms: time_ms,
            response_body: String::new(),
        }
    }

    #[tokio::test]
    async fn test_insert_returns_increasing_ids() {
        let store = SqliteStore::in_memory().await.unwrap();
        assert_eq!(store.latest_request_id().await.unwrap(), None);

        let first = store.insert_request(&request("GET", "/posts", 200, 150)).await.unwrap();
        let second = store.insert_request(&request("GET", "/users", 200, 90)).await.unwrap();

        assert!(second > first);
        assert_eq!(store.latest_request_id().await.unwrap(), Some(second));
    }

    #[tokio::test]
    async fn test_request_round_trip() {
        let store = SqliteStore::in_memory().await.unwrap();
        let mut new = request("POST", "/posts", 201, 234);
        new.response_body = r#"{"id":101}"#.into();
        let id = store.insert_request(&new).await.unwrap();

        let rows = store.list_requests(&RequestQuery::default()).await.unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.id, id);
        assert_eq!(row.method, "POST");
        assert_eq!(row.path, "/posts");
        assert_eq!(row.response_code, 201);
        assert_eq!(row.response_time, 234);
        assert_eq!(row.response_body, r#"{"id":101}"#);
    }

    #[tokio::test]
    async fn test_problem_references_request() {
        let store = SqliteStore::in_memory().await.unwrap();
        let request_id = store.insert_request(&request("GET", "/comments", 500, 40)).await.unwrap();
        store
            .insert_problem(&NewProblem {
                request_id,
                problem_type: ProblemKind::ServerError,
                severity: Severity::Critical,
                description: "Server error 500 on GET /comments".into(),
            })
            .await
            .unwrap();

        let problems = store.list_problems(&ProblemQuery::default()).await.unwrap();
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].request_id, request_id);
        assert_eq!(problems[0].problem_type, ProblemKind::ServerError);
        assert_eq!(problems[0].severity, Severity::Critical);
    }

    #[tokio::test]
    async fn test_problem_for_missing_request_rejected() {
        let store = SqliteStore::in_memory().await.unwrap();
        let result = store
            .insert_problem(&NewProblem {
                request_id: 42,
                problem_type: ProblemKind::Timeout,
                severity: Severity::Critical,
                description: "Request timeout on GET /x".into(),
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_filter_by_method_sorted_by_response_time() {
        let store = SqliteStore::in_memory().await.unwrap();
        seed::seed_demo_data(&store).await.unwrap();

        let rows = store
            .list_requests(&RequestQuery {
                method: Some("GET".into()),
                sort_by: Some(RequestSortField::ResponseTime),
                order: Some(SortOrder::Desc),
                ..RequestQuery::default()
            })
            .await
            .unwrap();

        assert_eq!(rows.len(), 5);
        assert!(rows.iter().all(|r| r.method == "GET"));
        let times: Vec<i64> = rows.iter().map(|r| r.response_time).collect();
        assert_eq!(times, vec![3421, 2567, 145, 89, 67]);
    }

    #[tokio::test]
    async fn test_code_range_and_search() {
        let store = SqliteStore::in_memory().await.unwrap();
        seed::seed_demo_data(&store).await.unwrap();

        let errors = store
            .list_requests(&RequestQuery {
                min_response_code: Some(400),
                max_response_code: Some(599),
                ..RequestQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(errors.len(), 2);

        let posts = store
            .list_requests(&RequestQuery {
                search: Some("posts".into()),
                ..RequestQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(posts.len(), 4);
        assert!(posts.iter().all(|r| r.path.contains("posts")));
    }

    #[tokio::test]
    async fn test_date_range() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.insert_request(&request("GET", "/posts", 200, 10)).await.unwrap();

        let past = chrono::Utc::now() - chrono::Duration::hours(1);
        let future = chrono::Utc::now() + chrono::Duration::hours(1);

        let within = store
            .list_requests(&RequestQuery {
                start_date: Some(past),
                end_date: Some(future),
                ..RequestQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(within.len(), 1);

        let after = store
            .list_requests(&RequestQuery {
                start_date: Some(future),
                ..RequestQuery::default()
            })
            .await
            .unwrap();
        assert!(after.is_empty());
    }

    #[tokio::test]
    async fn test_problems_filtered_and_sorted_by_severity() {
        let store = SqliteStore::in_memory().await.unwrap();
        let request_id = store.insert_request(&request("GET", "/x", 500, 10)).await.unwrap();
        for (kind, severity) in [
            (ProblemKind::ClientError, Severity::Medium),
            (ProblemKind::ServerError, Severity::Critical),
            (ProblemKind::RateLimit, Severity::High),
        ] {
            store
                .insert_problem(&NewProblem {
                    request_id,
                    problem_type: kind,
                    severity,
                    description: kind.to_string(),
                })
                .await
                .unwrap();
        }

        let sorted = store
            .list_problems(&ProblemQuery {
                sort_by: Some(ProblemSortField::Severity),
                order: Some(SortOrder::Desc),
                ..ProblemQuery::default()
            })
            .await
            .unwrap();
        let severities: Vec<Severity> = sorted.iter().map(|p| p.severity).collect();
        assert_eq!(severities, vec![Severity::Critical, Severity::High, Severity::Medium]);

        let high = store
            .list_problems(&ProblemQuery {
                severity: Some(Severity::High),
                ..ProblemQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(high.len(), 1);
        assert_eq!(high[0].problem_type, ProblemKind::RateLimit);
    }

    #[tokio::test]
    async fn test_seed_only_into_empty_table() {
        let store = SqliteStore::in_memory().await.unwrap();
        assert_eq!(seed::seed_demo_data(&store).await.unwrap(), 7);
        assert_eq!(seed::seed_demo_data(&store).await.unwrap(), 0);
        assert_eq!(store.list_requests(&RequestQuery::default()).await.unwrap().len(), 7);
    }
}
