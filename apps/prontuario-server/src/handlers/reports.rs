//! Report handlers: monthly report and per-student history
//!
//! Rows are the caller's visible, active entries in the period, oldest first.
//! A report log entry is appended only once the renderer has succeeded.

use std::collections::HashMap;

use chrono::Datelike;
use prontuario_reports::{
    RenderedReport, Report, ReportLogEntry, ReportPeriod, ReportRow, ReportType, DATE_FORMAT,
};
use prontuario_storage::{EntryFilter, EntryOrder, Principal, PrincipalId, Student, StudentId};
use tracing::info;

use crate::error::ServiceError;
use crate::policy::{self, Action, ResourceScope};
use crate::server::ProntuarioServer;

pub struct MonthlyReportRequest {
    pub year: Option<String>,
    pub month: Option<String>,
}

pub struct StudentReportRequest {
    pub student_id: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_number<T: std::str::FromStr>(raw: &str, what: &str) -> Result<T, ServiceError> {
    raw.trim()
        .parse()
        .map_err(|_| ServiceError::bad_request(format!("{what} must be an integer, got '{raw}'")))
}

/// Keeps letters, digits, `-` and `_`; everything else becomes `_`.
fn file_component(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

fn authorize(principal: &Principal, student_id: Option<&StudentId>) -> Result<(), ServiceError> {
    if policy::allowed(
        principal,
        Action::Read,
        &ResourceScope::EntryCollection { student_id },
    ) {
        Ok(())
    } else {
        Err(ServiceError::forbidden("not allowed to generate reports"))
    }
}

async fn report_rows(
    server: &ProntuarioServer,
    principal: &Principal,
    student: Option<&Student>,
    period: &ReportPeriod,
) -> Result<Vec<ReportRow>, ServiceError> {
    let mut filter = EntryFilter::new()
        .created_between(period.start, period.end)
        .order(EntryOrder::OldestFirst);
    if let Some(student) = student {
        filter = filter.student(student.id.clone());
    }
    let Some(filter) = policy::visibility(principal).scope(filter) else {
        return Ok(Vec::new());
    };

    let entries = server.store.list_entries(&filter).await?;

    let mut student_names: HashMap<StudentId, String> = HashMap::new();
    if let Some(student) = student {
        student_names.insert(student.id.clone(), student.name.clone());
    }
    let mut author_names: HashMap<PrincipalId, String> = HashMap::new();

    let mut rows = Vec::with_capacity(entries.len());
    for entry in entries {
        let student_name = match student_names.get(&entry.student_id) {
            Some(name) => name.clone(),
            None => {
                let name = server.store.get_student(&entry.student_id).await?.name;
                student_names.insert(entry.student_id.clone(), name.clone());
                name
            }
        };
        let professional_name = match author_names.get(&entry.author_id) {
            Some(name) => name.clone(),
            None => {
                let name = server.store.get_principal(&entry.author_id).await?.full_name();
                author_names.insert(entry.author_id.clone(), name.clone());
                name
            }
        };
        rows.push(ReportRow {
            entry_id: entry.id.0,
            student_name,
            professional_name,
            created_at: entry.created_at,
            description: entry.description,
        });
    }
    Ok(rows)
}

async fn render_and_log(
    server: &ProntuarioServer,
    principal: &Principal,
    report: Report,
) -> Result<RenderedReport, ServiceError> {
    let rendered = server.renderer.render(&report)?;
    server
        .report_log
        .record(ReportLogEntry::new(
            &principal.id,
            report.report_type,
            server.clock.now(),
        ))
        .await?;
    info!(
        "Rendered {} report for principal {} ({} rows)",
        report.report_type,
        principal.id,
        report.rows.len()
    );
    Ok(rendered)
}

/// Every visible entry created in one calendar month. Year and month go
/// together; with neither, the current month is used.
pub async fn monthly_report(
    server: &ProntuarioServer,
    key: &str,
    request: MonthlyReportRequest,
) -> Result<RenderedReport, ServiceError> {
    let principal = server.authenticate(key).await?;
    authorize(&principal, None)?;

    let period = match (non_blank(request.year), non_blank(request.month)) {
        (None, None) => ReportPeriod::current_month(server.clock.now()),
        (Some(year), Some(month)) => {
            ReportPeriod::month(parse_number(&year, "year")?, parse_number(&month, "month")?)
        }
        _ => {
            return Err(ServiceError::bad_request(
                "year and month must be given together",
            ))
        }
    }
    .map_err(|e| ServiceError::bad_request(e.to_string()))?;

    let first_day = period.start_date();
    let rows = report_rows(server, &principal, None, &period).await?;
    let report = Report {
        report_type: ReportType::GeneralMonthly,
        title: format!("Relatório Mensal {:02}/{}", first_day.month(), first_day.year()),
        file_stem: format!("relatorio_mensal_{}-{}", first_day.year(), first_day.month()),
        period,
        rows,
    };
    render_and_log(server, &principal, report).await
}

/// One student's visible entries between two dates, both days included.
/// With neither date given, the current month is used.
pub async fn student_report(
    server: &ProntuarioServer,
    key: &str,
    request: StudentReportRequest,
) -> Result<RenderedReport, ServiceError> {
    let principal = server.authenticate(key).await?;
    let student = super::load_student(server, &request.student_id).await?;
    authorize(&principal, Some(&student.id))?;

    let period = match (non_blank(request.start_date), non_blank(request.end_date)) {
        (None, None) => ReportPeriod::current_month(server.clock.now()),
        (Some(start), Some(end)) => ReportPeriod::parse_days(&start, &end),
        _ => {
            return Err(ServiceError::bad_request(
                "start_date and end_date must be given together",
            ))
        }
    }
    .map_err(|e| ServiceError::bad_request(e.to_string()))?;

    let rows = report_rows(server, &principal, Some(&student), &period).await?;
    let start = period.start_date().format(DATE_FORMAT);
    let end = period.end_date().format(DATE_FORMAT);
    let report = Report {
        report_type: ReportType::StudentHistory,
        title: format!("Histórico de {} ({start} a {end})", student.name),
        file_stem: format!("relatorio_{}_{start}_{end}", file_component(&student.name)),
        period,
        rows,
    };
    render_and_log(server, &principal, report).await
}
