use super::notify::{Notifier, Toast};
use super::Viewer;
use crate::commands::is_valid_email;
use crate::database::{NewReport, ReportType};
use crate::error::AppError;
use crate::remote::PodcastService;

/// Fields of the "Report podcast" dialog.
#[derive(Debug, Clone, Default)]
pub struct ReportForm {
    pub report_type: Option<ReportType>,
    pub details: String,
    pub contact_email: String,
}

impl ReportForm {
    /// Check the form before anything is sent.
    pub fn validate(&self) -> Result<ReportType, AppError> {
        let report_type = self
            .report_type
            .ok_or_else(|| AppError::Invalid("select a reason for the report".to_string()))?;
        let email = self.contact_email.trim();
        if !email.is_empty() && !is_valid_email(email) {
            return Err(AppError::Invalid(format!("invalid contact email \"{}\"", email)));
        }
        Ok(report_type)
    }

    pub fn into_report(
        self,
        podcast_id: i64,
        podcast_title: &str,
        viewer: Option<&Viewer>,
    ) -> Result<NewReport, AppError> {
        let report_type = self.validate()?;
        let non_blank = |s: String| {
            let trimmed = s.trim().to_string();
            (!trimmed.is_empty()).then_some(trimmed)
        };
        Ok(NewReport {
            podcast_id,
            podcast_title: podcast_title.to_string(),
            report_type,
            details: non_blank(self.details),
            contact_email: non_blank(self.contact_email),
            reported_by: viewer.map(|v| v.id.clone()),
        })
    }
}

/// Validate and send a report, telling the user how it went.
pub async fn submit<S: PodcastService>(
    service: &S,
    notifier: &dyn Notifier,
    form: ReportForm,
    podcast_id: i64,
    podcast_title: &str,
    viewer: Option<&Viewer>,
) -> Result<i64, AppError> {
    let report = match form.into_report(podcast_id, podcast_title, viewer) {
        Ok(report) => report,
        Err(e) => {
            notifier.notify(Toast::destructive("Please check the report").description(e.to_string()));
            return Err(e);
        }
    };

    match service.submit_report(report).await {
        Ok(id) => {
            log::info!("Report {} submitted for podcast {}", id, podcast_id);
            notifier.notify(
                Toast::new("Report submitted")
                    .description("Thank you. Our team will review this podcast."),
            );
            Ok(id)
        }
        Err(e) => {
            log::error!("Error reporting podcast {}: {}", podcast_id, e);
            notifier.notify(Toast::destructive("Failed to submit report"));
            Err(AppError::remote(e))
        }
    }
}
