//! Dashboard statistics and the audit trail.

use crate::api::{ApiClient, ApiError};
use crate::models::{AuditLogEntry, Statistics};

/// Headline counters for the dashboard.
pub async fn statistics(api: &ApiClient) -> Result<Statistics, ApiError> {
    api.get("/deans/statistics").await
}

/// Chart payloads for the dashboard. The series set varies with the
/// backend release, so this stays schemaless and is rendered as-is.
pub async fn statistics_charts(api: &ApiClient) -> Result<serde_json::Value, ApiError> {
    api.get("/deans/statistics/charts").await
}

/// The audit trail, newest first.
pub async fn audit_logs(api: &ApiClient) -> Result<Vec<AuditLogEntry>, ApiError> {
    api.get("/deans/audit-logs").await
}
