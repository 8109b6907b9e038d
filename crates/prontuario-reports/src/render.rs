//! Report rendering seam.
//!
//! The spreadsheet generator lives outside the core; it only has to implement
//! `ReportRenderer`. A JSON renderer ships here for operators and tests.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::{ReportPeriod, ReportType};

/// One line of a report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub entry_id: i64,
    pub student_name: String,
    pub professional_name: String,
    pub created_at: DateTime<Utc>,
    pub description: String,
}

/// A scoped, time-ordered report ready to render.
#[derive(Clone, Debug)]
pub struct Report {
    pub report_type: ReportType,
    pub title: String,
    /// Suggested file name without extension.
    pub file_stem: String,
    pub period: ReportPeriod,
    /// Oldest first.
    pub rows: Vec<ReportRow>,
}

/// Rendered artifact plus the name it should be saved under.
#[derive(Clone, Debug)]
pub struct RenderedReport {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to encode report: {0}")]
    Encode(String),
}

pub trait ReportRenderer: Send + Sync {
    fn render(&self, report: &Report) -> Result<RenderedReport, RenderError>;
}

/// Renders a report as a pretty-printed JSON document.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonReportRenderer;

#[derive(Serialize)]
struct JsonReport<'a> {
    report_type: ReportType,
    title: &'a str,
    period_start: DateTime<Utc>,
    period_end: DateTime<Utc>,
    headers: [&'static str; 5],
    rows: &'a [ReportRow],
}

const HEADERS: [&str; 5] = ["ID", "Estudante", "Profissional", "Data da Entrada", "Descrição"];

impl ReportRenderer for JsonReportRenderer {
    fn render(&self, report: &Report) -> Result<RenderedReport, RenderError> {
        let doc = JsonReport {
            report_type: report.report_type,
            title: &report.title,
            period_start: report.period.start,
            period_end: report.period.end,
            headers: HEADERS,
            rows: &report.rows,
        };
        let bytes =
            serde_json::to_vec_pretty(&doc).map_err(|e| RenderError::Encode(e.to_string()))?;
        Ok(RenderedReport {
            filename: format!("{}.json", report.file_stem),
            content_type: "application/json",
            bytes,
        })
    }
}
