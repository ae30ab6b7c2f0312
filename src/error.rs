//! Error types for report computation
//!
//! Errors are classified by who can fix them:
//! - Validation: the caller sent a bad period request
//! - Source: the record store or target store failed
//! - Configuration: engine config on disk is unreadable or inconsistent

use chrono::NaiveDate;
use thiserror::Error;

/// Period request rejected before any aggregation work starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeriodError {
    #[error("Period end {end} is before start {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },

    #[error("Unknown period type: {0}")]
    UnknownPeriodType(String),

    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Period is outside the supported calendar range: {0}")]
    OutOfRange(String),
}

/// Failure inside a record or target source.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Failed to decode stored JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to create database directory: {0}")]
    CreateDir(std::io::Error),
}

/// Engine configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Top-level error returned by `ReportEngine` operations.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Invalid period request: {0}")]
    InvalidPeriod(#[from] PeriodError),

    #[error("Record source failed: {0}")]
    Source(#[from] StoreError),
}

impl ReportError {
    /// Returns true if the caller sent a request that can never succeed.
    pub fn is_validation(&self) -> bool {
        matches!(self, ReportError::InvalidPeriod(_))
    }
}

/// Serializable error representation for the presentation layer.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFailure {
    pub message: String,
    pub error_type: ErrorType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorType {
    Validation,
    Source,
}

impl From<&ReportError> for ReportFailure {
    fn from(err: &ReportError) -> Self {
        let error_type = if err.is_validation() {
            ErrorType::Validation
        } else {
            ErrorType::Source
        };
        ReportFailure {
            message: err.to_string(),
            error_type,
        }
    }
}
