//! Academic years and semesters.

use crate::api::{ApiClient, ApiError};
use crate::models::{AcademicYear, AcademicYearPayload, Semester, SemesterPayload};

pub async fn list_academic_years(api: &ApiClient) -> Result<Vec<AcademicYear>, ApiError> {
    api.get("/deans/academic-years").await
}

pub async fn create_academic_year(
    api: &ApiClient,
    payload: &AcademicYearPayload,
) -> Result<AcademicYear, ApiError> {
    api.post("/deans/academic-years", payload).await
}

pub async fn update_academic_year(
    api: &ApiClient,
    id: i64,
    payload: &AcademicYearPayload,
) -> Result<AcademicYear, ApiError> {
    api.put(&format!("/deans/academic-years/{id}"), payload).await
}

pub async fn delete_academic_year(api: &ApiClient, id: i64) -> Result<(), ApiError> {
    api.delete(&format!("/deans/academic-years/{id}")).await
}

pub async fn list_semesters(api: &ApiClient) -> Result<Vec<Semester>, ApiError> {
    api.get("/deans/semesters").await
}

pub async fn create_semester(
    api: &ApiClient,
    payload: &SemesterPayload,
) -> Result<Semester, ApiError> {
    api.post("/deans/semesters", payload).await
}

pub async fn update_semester(
    api: &ApiClient,
    id: i64,
    payload: &SemesterPayload,
) -> Result<Semester, ApiError> {
    api.put(&format!("/deans/semesters/{id}"), payload).await
}

pub async fn delete_semester(api: &ApiClient, id: i64) -> Result<(), ApiError> {
    api.delete(&format!("/deans/semesters/{id}")).await
}

/// Marks one semester active. The server deactivates every other
/// semester in the same scope; the client only issues the call.
pub async fn activate_semester(api: &ApiClient, id: i64) -> Result<(), ApiError> {
    api.post_empty(&format!("/deans/semesters/{id}/activate")).await
}
