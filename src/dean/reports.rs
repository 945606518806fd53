//! Student-submitted reports and their handling state.

use crate::api::{ApiClient, ApiError};
use crate::models::{Report, ReportStats, ReportStatus, ReportUpdate};

/// All reports, optionally filtered by status.
pub async fn list_reports(
    api: &ApiClient,
    status: Option<ReportStatus>,
) -> Result<Vec<Report>, ApiError> {
    match status {
        None => api.get("/reports/all").await,
        Some(status) => {
            api.get_with_query("/reports/all", &[("status", status.as_str().to_string())])
                .await
        }
    }
}

pub async fn get_report(api: &ApiClient, id: i64) -> Result<Report, ApiError> {
    api.get(&format!("/reports/{id}")).await
}

/// Records the dean's decision: new status and/or response text.
pub async fn update_report(
    api: &ApiClient,
    id: i64,
    update: &ReportUpdate,
) -> Result<Report, ApiError> {
    api.put(&format!("/reports/{id}"), update).await
}

pub async fn report_stats(api: &ApiClient) -> Result<ReportStats, ApiError> {
    api.get("/reports/stats").await
}
