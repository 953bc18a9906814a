//! Typed list queries.
//!
//! Each recognized filter is an optional field; every value is a bound
//! parameter and sort columns come only from the enumerated fields.
//! Blank query parameters are treated as absent.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{de, Deserialize, Deserializer};
use sqlx::{QueryBuilder, Sqlite};

use crate::monitor::model::{ProblemKind, Severity};

const REQUEST_COLUMNS: &str =
    "SELECT id, method, path, response_code, response_time, response_body, created_at \
     FROM api_requests WHERE 1=1";

const PROBLEM_COLUMNS: &str =
    "SELECT id, request_id, problem_type, severity, description, created_at \
     FROM problems WHERE 1=1";

const SEVERITY_RANK: &str =
    "CASE severity WHEN 'critical' THEN 3 WHEN 'high' THEN 2 WHEN 'medium' THEN 1 ELSE 0 END";

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(format!("unknown sort order '{s}', expected asc or desc")),
        }
    }
}

impl SortOrder {
    fn sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestSortField {
    #[default]
    CreatedAt,
    ResponseTime,
}

impl FromStr for RequestSortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created_at" => Ok(RequestSortField::CreatedAt),
            "response_time" => Ok(RequestSortField::ResponseTime),
            _ => Err(format!(
                "unknown sort field '{s}', expected created_at or response_time"
            )),
        }
    }
}

impl RequestSortField {
    fn column(&self) -> &'static str {
        match self {
            RequestSortField::CreatedAt => "created_at",
            RequestSortField::ResponseTime => "response_time",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemSortField {
    #[default]
    CreatedAt,
    Severity,
}

impl FromStr for ProblemSortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created_at" => Ok(ProblemSortField::CreatedAt),
            "severity" => Ok(ProblemSortField::Severity),
            _ => Err(format!("unknown sort field '{s}', expected created_at or severity")),
        }
    }
}

impl ProblemSortField {
    fn column(&self) -> &'static str {
        match self {
            ProblemSortField::CreatedAt => "created_at",
            ProblemSortField::Severity => SEVERITY_RANK,
        }
    }
}

/// Filters for the request list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RequestQuery {
    pub method: Option<String>,
    #[serde(deserialize_with = "blank_as_none")]
    pub response_code: Option<i64>,
    #[serde(deserialize_with = "blank_as_none")]
    pub min_response_code: Option<i64>,
    #[serde(deserialize_with = "blank_as_none")]
    pub max_response_code: Option<i64>,
    #[serde(deserialize_with = "blank_as_none")]
    pub min_response_time: Option<i64>,
    #[serde(deserialize_with = "blank_as_none")]
    pub max_response_time: Option<i64>,
    #[serde(deserialize_with = "blank_as_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "blank_as_none")]
    pub end_date: Option<DateTime<Utc>>,
    /// Substring of the path.
    pub search: Option<String>,
    #[serde(deserialize_with = "blank_as_none")]
    pub sort_by: Option<RequestSortField>,
    #[serde(deserialize_with = "blank_as_none")]
    pub order: Option<SortOrder>,
}

impl RequestQuery {
    pub(crate) fn build(&self) -> QueryBuilder<'static, Sqlite> {
        let mut builder = QueryBuilder::new(REQUEST_COLUMNS);

        if let Some(method) = non_empty(&self.method) {
            builder.push(" AND method = ").push_bind(method.to_string());
        }
        if let Some(code) = self.response_code {
            builder.push(" AND response_code = ").push_bind(code);
        }
        if let Some(code) = self.min_response_code {
            builder.push(" AND response_code >= ").push_bind(code);
        }
        if let Some(code) = self.max_response_code {
            builder.push(" AND response_code <= ").push_bind(code);
        }
        if let Some(ms) = self.min_response_time {
            builder.push(" AND response_time >= ").push_bind(ms);
        }
        if let Some(ms) = self.max_response_time {
            builder.push(" AND response_time <= ").push_bind(ms);
        }
        push_date_range(&mut builder, self.start_date, self.end_date);
        if let Some(search) = non_empty(&self.search) {
            builder.push(" AND path LIKE ").push_bind(format!("%{search}%"));
        }

        push_order(
            &mut builder,
            self.sort_by.unwrap_or_default().column(),
            self.order.unwrap_or_default(),
        );
        builder
    }
}

/// Filters for the problem list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProblemQuery {
    #[serde(deserialize_with = "blank_as_none")]
    pub problem_type: Option<ProblemKind>,
    #[serde(deserialize_with = "blank_as_none")]
    pub severity: Option<Severity>,
    #[serde(deserialize_with = "blank_as_none")]
    pub sort_by: Option<ProblemSortField>,
    #[serde(deserialize_with = "blank_as_none")]
    pub order: Option<SortOrder>,
}

impl ProblemQuery {
    pub(crate) fn build(&self) -> QueryBuilder<'static, Sqlite> {
        let mut builder = QueryBuilder::new(PROBLEM_COLUMNS);

        if let Some(kind) = self.problem_type {
            builder.push(" AND problem_type = ").push_bind(kind.as_str());
        }
        if let Some(severity) = self.severity {
            builder.push(" AND severity = ").push_bind(severity.as_str());
        }

        push_order(
            &mut builder,
            self.sort_by.unwrap_or_default().column(),
            self.order.unwrap_or_default(),
        );
        builder
    }
}

/// Formats a timestamp the way the schema stores `created_at`, so that text
/// comparison orders chronologically.
pub(crate) fn storage_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses a query-string value with `FromStr`, mapping a blank value to `None`.
fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match Option::<String>::deserialize(deserializer)?.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(de::Error::custom),
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn push_date_range(
    builder: &mut QueryBuilder<'static, Sqlite>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) {
    if let Some(start) = start {
        builder.push(" AND created_at >= ").push_bind(storage_timestamp(start));
    }
    if let Some(end) = end {
        builder.push(" AND created_at <= ").push_bind(storage_timestamp(end));
    }
}

fn push_order(builder: &mut QueryBuilder<'static, Sqlite>, column: &str, order: SortOrder) {
    let direction = order.sql();
    builder.push(format!(" ORDER BY {column} {direction}, id {direction}"));
}
