//! API monitoring proxy library.
//!
//! Forwards calls to a fixed upstream service, records every call, and
//! classifies failed or slow ones as problems.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod monitor;
pub mod observability;
pub mod storage;

pub use config::MonitorConfig;
pub use http::HttpServer;
pub use lifecycle::{Application, Shutdown};
pub use monitor::ProxyPipeline;
pub use storage::{MonitorStore, SqliteStore};
