use crate::database::{
    AdminRequest, AdminRequestStatus, Database, NewReport, Report, ReportStatus, ReportType,
};
use crate::error::AppError;
use regex::Regex;
use std::sync::OnceLock;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
    })
}

/// Loose shape check for a contact address: `local@domain.tld`, no spaces
pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email.trim())
}

/// Parse a report type string coming from a form
pub fn parse_report_type(value: &str) -> Result<ReportType, AppError> {
    ReportType::parse(value.trim())
        .ok_or_else(|| AppError::Invalid(format!("unknown report type \"{}\"", value)))
}

// =========================================================================
// Reports
// =========================================================================

/// File a report against a podcast. Anonymous reports are allowed.
pub async fn create_report(db: &Database, mut report: NewReport) -> Result<i64, AppError> {
    report.contact_email = report
        .contact_email
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty());
    if let Some(email) = &report.contact_email {
        if !is_valid_email(email) {
            return Err(AppError::Invalid(format!("invalid contact email \"{}\"", email)));
        }
    }
    report.details = report
        .details
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    log::info!(
        "Report ({}) filed against podcast {} by {}",
        report.report_type,
        report.podcast_id,
        report.reported_by.as_deref().unwrap_or("anonymous")
    );
    db.create_report(&report).map_err(AppError::from)
}

pub async fn get_reports(db: &Database, status: Option<ReportStatus>) -> Result<Vec<Report>, AppError> {
    db.get_reports_by_status(status.unwrap_or_default())
        .map_err(AppError::from)
}

pub async fn get_reports_for_podcast(db: &Database, podcast_id: i64) -> Result<Vec<Report>, AppError> {
    db.get_reports_for_podcast(podcast_id).map_err(AppError::from)
}

pub async fn review_report(
    db: &Database,
    report_id: i64,
    status: ReportStatus,
    reviewed_by: String,
    review_notes: Option<String>,
) -> Result<(), AppError> {
    log::info!("Report {} marked {} by {}", report_id, status, reviewed_by);
    db.review_report(report_id, status, &reviewed_by, review_notes.as_deref())
        .map_err(AppError::from)
}

// =========================================================================
// Admin requests
// =========================================================================

pub async fn request_admin(db: &Database, user_id: String, reason: String) -> Result<i64, AppError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(AppError::Invalid("a reason is required".to_string()));
    }
    log::info!("Admin access requested by {}", user_id);
    db.create_admin_request(&user_id, reason).map_err(AppError::from)
}

pub async fn get_admin_requests(
    db: &Database,
    status: Option<AdminRequestStatus>,
) -> Result<Vec<AdminRequest>, AppError> {
    db.get_admin_requests(status).map_err(AppError::from)
}

pub async fn review_admin_request(
    db: &Database,
    request_id: i64,
    approve: bool,
    reviewed_by: String,
    review_notes: Option<String>,
) -> Result<AdminRequestStatus, AppError> {
    let status = db.review_admin_request(request_id, approve, &reviewed_by, review_notes.as_deref())?;
    log::info!("Admin request {} {} by {}", request_id, status, reviewed_by);
    Ok(status)
}
