//! Tuition settings and per-student tuition records.

use crate::api::{ApiClient, ApiError};
use crate::models::{Tuition, TuitionSettings, TuitionUpdate};

/// The global price per credit.
pub async fn settings(api: &ApiClient) -> Result<TuitionSettings, ApiError> {
    api.get("/deans/tuition-settings").await
}

/// Replaces the global price per credit.
pub async fn set_price_per_credit(
    api: &ApiClient,
    price_per_credit: i64,
) -> Result<TuitionSettings, ApiError> {
    api.post(
        "/deans/tuition-settings",
        &TuitionSettings { price_per_credit },
    )
    .await
}

pub async fn list_tuitions(api: &ApiClient) -> Result<Vec<Tuition>, ApiError> {
    api.get("/deans/tuitions").await
}

/// Updates the paid amount and/or status of one tuition record. Status
/// derivation from the amounts remains the server's call.
pub async fn update_tuition(
    api: &ApiClient,
    id: i64,
    update: &TuitionUpdate,
) -> Result<Tuition, ApiError> {
    api.put(&format!("/deans/tuitions/{id}"), update).await
}
