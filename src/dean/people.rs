//! Lecturer and student account management.

use super::Page;
use crate::api::{ApiClient, ApiError};
use crate::models::{AcademicResults, User, UserPayload};

pub async fn list_lecturers(api: &ApiClient, page: Page) -> Result<Vec<User>, ApiError> {
    if page.is_unpaginated() {
        api.get("/deans/lecturers").await
    } else {
        api.get_with_query("/deans/lecturers", &page.query()).await
    }
}

pub async fn create_lecturer(api: &ApiClient, payload: &UserPayload) -> Result<User, ApiError> {
    api.post("/deans/lecturers", payload).await
}

pub async fn update_lecturer(
    api: &ApiClient,
    id: i64,
    payload: &UserPayload,
) -> Result<User, ApiError> {
    api.put(&format!("/deans/lecturers/{id}"), payload).await
}

pub async fn delete_lecturer(api: &ApiClient, id: i64) -> Result<(), ApiError> {
    api.delete(&format!("/deans/lecturers/{id}")).await
}

pub async fn list_students(api: &ApiClient, page: Page) -> Result<Vec<User>, ApiError> {
    if page.is_unpaginated() {
        api.get("/deans/students").await
    } else {
        api.get_with_query("/deans/students", &page.query()).await
    }
}

pub async fn create_student(api: &ApiClient, payload: &UserPayload) -> Result<User, ApiError> {
    api.post("/deans/students", payload).await
}

pub async fn update_student(
    api: &ApiClient,
    id: i64,
    payload: &UserPayload,
) -> Result<User, ApiError> {
    api.put(&format!("/deans/students/{id}"), payload).await
}

pub async fn delete_student(api: &ApiClient, id: i64) -> Result<(), ApiError> {
    api.delete(&format!("/deans/students/{id}")).await
}

/// Per-semester GPA lines plus the cumulative CPA summary for one
/// student.
pub async fn academic_results(
    api: &ApiClient,
    student_id: i64,
) -> Result<AcademicResults, ApiError> {
    api.get(&format!("/deans/students/{student_id}/academic-results"))
        .await
}
