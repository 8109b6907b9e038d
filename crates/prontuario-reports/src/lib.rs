//! Report logging and rendering for prontuario.
//!
//! This crate defines the append-only `ReportLog` trait written to after every
//! successful report render, the reporting periods, and the `ReportRenderer`
//! seam the spreadsheet generator plugs into.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use prontuario_storage::PrincipalId;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

mod period;
mod render;

pub use period::{parse_date, PeriodError, ReportPeriod, DATE_FORMAT};
pub use render::{JsonReportRenderer, RenderError, RenderedReport, Report, ReportRenderer, ReportRow};

/// Unique identifier for a report log entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportLogId(pub Uuid);

impl ReportLogId {
    /// Generate a new report log ID using UUID v7 (time-ordered)
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ReportLogId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ReportLogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ReportLogId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Kinds of report the system renders
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    /// Every visible entry created in one calendar month.
    GeneralMonthly,
    /// One student's entries over a date range.
    StudentHistory,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::GeneralMonthly => "general_monthly",
            ReportType::StudentHistory => "student_history",
        }
    }
}

impl std::fmt::Display for ReportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReportType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "general_monthly" => Ok(ReportType::GeneralMonthly),
            "student_history" => Ok(ReportType::StudentHistory),
            _ => Err(format!("Unknown report type: {}", s)),
        }
    }
}

/// "A report of type T was generated by user U at time D".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportLogEntry {
    pub id: ReportLogId,
    /// Principal that generated the report (UUID)
    pub user_id: Uuid,
    pub date: DateTime<Utc>,
    pub report_type: ReportType,
}

impl ReportLogEntry {
    pub fn new(user_id: &PrincipalId, report_type: ReportType, date: DateTime<Utc>) -> Self {
        Self {
            id: ReportLogId::new(),
            user_id: user_id.0,
            date,
            report_type,
        }
    }

    /// Get the generating principal as a typed ID
    pub fn get_user_id(&self) -> PrincipalId {
        PrincipalId(self.user_id)
    }
}

/// Error type for report log operations
#[derive(Debug, Error)]
pub enum ReportLogError {
    #[error("database error: {0}")]
    Database(String),

    #[error("report log entry already recorded: {0}")]
    Duplicate(ReportLogId),
}

/// Append-only sink for report generation records.
///
/// No query method: the core only ever writes here.
#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait]
pub trait ReportLog: Send + Sync {
    /// Record that a report was generated.
    async fn record(&self, entry: ReportLogEntry) -> Result<(), ReportLogError>;
}
