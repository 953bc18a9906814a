//! Request and problem records.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;

/// Status recorded when the upstream call failed before any status was
/// obtained (timeout, connection error). Never a real HTTP status.
pub const STATUS_UNAVAILABLE: u16 = 0;

/// A persisted proxied call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct RequestRecord {
    pub id: i64,
    pub method: String,
    pub path: String,
    pub response_code: i64,
    pub response_time: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub response_body: String,
    pub created_at: DateTime<Utc>,
}

/// Input for a request insert. `id` and `created_at` are assigned by storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRequest {
    pub method: String,
    pub path: String,
    pub response_code: u16,
    pub response_time_ms: u64,
    pub response_body: String,
}

/// A persisted problem, linked to the request that triggered it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ProblemRecord {
    pub id: i64,
    pub request_id: i64,
    #[sqlx(try_from = "String")]
    pub problem_type: ProblemKind,
    #[sqlx(try_from = "String")]
    pub severity: Severity,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Input for a problem insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProblem {
    pub request_id: i64,
    pub problem_type: ProblemKind,
    pub severity: Severity,
    pub description: String,
}

/// Stored enum text that does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

/// Problem categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemKind {
    #[serde(rename = "error_5xx")]
    ServerError,
    #[serde(rename = "error_4xx")]
    ClientError,
    RateLimit,
    SlowResponse,
    Timeout,
}

impl ProblemKind {
    pub const ALL: [ProblemKind; 5] = [
        ProblemKind::ServerError,
        ProblemKind::ClientError,
        ProblemKind::RateLimit,
        ProblemKind::SlowResponse,
        ProblemKind::Timeout,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProblemKind::ServerError => "error_5xx",
            ProblemKind::ClientError => "error_4xx",
            ProblemKind::RateLimit => "rate_limit",
            ProblemKind::SlowResponse => "slow_response",
            ProblemKind::Timeout => "timeout",
        }
    }
}

impl fmt::Display for ProblemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProblemKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "problem type",
                value: s.to_string(),
            })
    }
}

impl TryFrom<String> for ProblemKind {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Problem severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Medium, Severity::High, Severity::Critical];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    /// Numeric rank used when sorting by severity.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Medium => 1,
            Severity::High => 2,
            Severity::Critical => 3,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|severity| severity.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "severity",
                value: s.to_string(),
            })
    }
}

impl TryFrom<String> for Severity {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
