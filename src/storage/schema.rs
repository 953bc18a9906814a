//! Schema bootstrap.
//!
//! Statements are idempotent and run one at a time at startup.
//! `created_at` is filled by the database as an RFC 3339 UTC timestamp with
//! millisecond precision, matching `query::storage_timestamp`.

use sqlx::SqlitePool;

const STATEMENTS: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS api_requests (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        method        TEXT    NOT NULL,
        path          TEXT    NOT NULL,
        response_code INTEGER NOT NULL,
        response_time INTEGER NOT NULL,
        response_body TEXT    NOT NULL DEFAULT '',
        created_at    TEXT    NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS problems (
        id           INTEGER PRIMARY KEY AUTOINCREMENT,
        request_id   INTEGER NOT NULL REFERENCES api_requests(id),
        problem_type TEXT    NOT NULL,
        severity     TEXT    NOT NULL,
        description  TEXT    NOT NULL,
        created_at   TEXT    NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_api_requests_created_at ON api_requests(created_at)",
    "CREATE INDEX IF NOT EXISTS idx_problems_created_at ON problems(created_at)",
];

/// Create tables and indexes if they do not exist yet.
pub async fn bootstrap(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
    }
    tracing::info!("Database schema ready");
    Ok(())
}
