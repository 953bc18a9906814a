//! Demo rows for a fresh database.

use crate::monitor::model::NewRequest;
use crate::storage::{MonitorStore, RequestQuery, StoreResult};

const DEMO_REQUESTS: [(&str, &str, u16, u64, &str); 7] = [
    ("GET", "/posts", 200, 145, r#"[{"id":1,"title":"Sample"}]"#),
    ("GET", "/users/1", 200, 89, r#"{"id":1,"name":"John"}"#),
    ("POST", "/posts", 201, 234, r#"{"id":101,"title":"New Post"}"#),
    ("GET", "/posts/999", 404, 67, "{}"),
    ("GET", "/comments", 500, 3421, "Internal Server Error"),
    ("DELETE", "/posts/1", 200, 112, "{}"),
    ("GET", "/users", 200, 2567, r#"[{"id":1},{"id":2}]"#),
];

/// Insert the demo request rows if the request table is empty.
///
/// Returns the number of rows inserted. Individual insert failures are
/// logged and skipped.
pub async fn seed_demo_data(store: &dyn MonitorStore) -> StoreResult<usize> {
    if !store.list_requests(&RequestQuery::default()).await?.is_empty() {
        tracing::debug!("Request table not empty, skipping demo data");
        return Ok(0);
    }

    let mut inserted = 0;
    for (method, path, code, time_ms, body) in DEMO_REQUESTS {
        let request = NewRequest {
            method: method.to_string(),
            path: path.to_string(),
            response_code: code,
            response_time_ms: time_ms,
            response_body: body.to_string(),
        };
        match store.insert_request(&request).await {
            Ok(_) => inserted += 1,
            Err(e) => tracing::error!(error = %e, path, "Error seeding demo request"),
        }
    }

    tracing::info!(rows = inserted, "Demo data inserted");
    Ok(inserted)
}
