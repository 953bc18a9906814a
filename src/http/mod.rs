//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware: request ID, trace, CORS, timeout)
//!     → handlers.rs
//!         /api/requests, /api/problems → storage list queries
//!         /api/proxy/{*endpoint}       → monitor pipeline (spawned task,
//!                                        raw percent-encoded endpoint)
//!     → error.rs (ApiError → status + plain text)
//!     → Send to client
//! ```

pub mod error;
pub mod handlers;
pub mod server;

pub use error::ApiError;
pub use server::{AppState, HttpServer, X_REQUEST_ID};
