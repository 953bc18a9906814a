//! Request logging and problem classification.
//!
//! # Data Flow
//! ```text
//! inbound proxy call
//!     → upstream.rs   (one bounded outbound call, status/body/elapsed)
//!     → recorder.rs   (request record, always)
//!     → classifier.rs (pure: status × elapsed → optional problem)
//!     → recorder.rs   (problem record, linked to the request id)
//!     → proxy.rs returns the upstream response or failure
//! ```
//!
//! # Design Decisions
//! - Classification has no side effects and no storage access
//! - The identity returned by the request insert is passed to the problem
//!   recorder, so concurrent calls cannot cross-link
//! - Recording is best effort; only the upstream failure reaches the caller

pub mod classifier;
pub mod model;
pub mod proxy;
pub mod recorder;
pub mod upstream;

pub use classifier::{Classification, Classifier};
pub use model::{
    NewProblem, NewRequest, ProblemKind, ProblemRecord, RequestRecord, Severity, STATUS_UNAVAILABLE,
};
pub use proxy::{ProxyError, ProxyPipeline};
pub use recorder::{ProblemRecorder, RequestRecorder};
pub use upstream::{ProxyCall, UpstreamClient, UpstreamError, UpstreamOutcome, UpstreamResponse};
