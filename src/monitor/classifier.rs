//! Problem classification.
//!
//! Maps the outcome of one proxied call to at most one problem. Rules are
//! evaluated in a fixed order and the first match wins:
//!
//! ```text
//! 1. 500..=599          → error_5xx     critical
//! 2. 400..=499          → error_4xx     medium
//! 3. 429                → rate_limit    high
//! 4. elapsed > slow     → slow_response medium
//! 5. status == 0        → timeout       critical
//! ```
//!
//! Rule 3 is shadowed by rule 2 unless `rate_limit_precedence` is set, in
//! which case it is checked before rule 2.

use crate::config::ClassificationConfig;
use crate::monitor::model::{ProblemKind, Severity, STATUS_UNAVAILABLE};

const TOO_MANY_REQUESTS: u16 = 429;

/// Outcome of a classification that flagged a problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub kind: ProblemKind,
    pub severity: Severity,
    pub description: String,
}

/// Pure decision function over (status, elapsed).
#[derive(Debug, Clone)]
pub struct Classifier {
    slow_threshold_ms: u64,
    rate_limit_precedence: bool,
}

impl Classifier {
    pub fn new(config: &ClassificationConfig) -> Self {
        Self {
            slow_threshold_ms: config.slow_threshold_ms,
            rate_limit_precedence: config.rate_limit_precedence,
        }
    }

    /// Classify a call. `status` is [`STATUS_UNAVAILABLE`] for transport failures.
    pub fn classify(
        &self,
        method: &str,
        path: &str,
        status: u16,
        elapsed_ms: u64,
    ) -> Option<Classification> {
        if (500..600).contains(&status) {
            return Some(Classification {
                kind: ProblemKind::ServerError,
                severity: Severity::Critical,
                description: format!("Server error {status} on {method} {path}"),
            });
        }

        if self.rate_limit_precedence && status == TOO_MANY_REQUESTS {
            return Some(rate_limited(method, path));
        }

        if (400..500).contains(&status) {
            return Some(Classification {
                kind: ProblemKind::ClientError,
                severity: Severity::Medium,
                description: format!("Client error {status} on {method} {path}"),
            });
        }

        // Unreachable with the default order: 429 is inside the 4xx range above.
        if status == TOO_MANY_REQUESTS {
            return Some(rate_limited(method, path));
        }

        if elapsed_ms > self.slow_threshold_ms {
            return Some(Classification {
                kind: ProblemKind::SlowResponse,
                severity: Severity::Medium,
                description: format!("Slow response ({elapsed_ms}ms) on {method} {path}"),
            });
        }

        if status == STATUS_UNAVAILABLE {
            return Some(Classification {
                kind: ProblemKind::Timeout,
                severity: Severity::Critical,
                description: format!("Request timeout on {method} {path}"),
            });
        }

        None
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(&ClassificationConfig::default())
    }
}

fn rate_limited(method: &str, path: &str) -> Classification {
    Classification {
        kind: ProblemKind::RateLimit,
        severity: Severity::High,
        description: format!("Rate limit exceeded on {method} {path}"),
    }
}
