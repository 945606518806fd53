//! Grade sheets and grade entry.

use crate::api::{ApiClient, ApiError};
use crate::models::{ClassGradeRow, Grade, GradePayload, GradeType};

/// The grade sheet for one class: one row per enrollment with any
/// recorded components.
pub async fn class_grades(api: &ApiClient, class_id: i64) -> Result<Vec<ClassGradeRow>, ApiError> {
    api.get(&format!("/deans/classes/{class_id}/grades")).await
}

/// Records a new grade component. The weight is fixed by the component
/// kind; callers pass the score only.
pub async fn create_grade(
    api: &ApiClient,
    enrollment_id: i64,
    grade_type: GradeType,
    score: f64,
) -> Result<Grade, ApiError> {
    let payload = GradePayload {
        enrollment_id,
        grade_type,
        score,
        weight: grade_type.weight(),
    };
    api.post("/deans/grades", &payload).await
}

/// Replaces an existing grade component's score.
pub async fn update_grade(
    api: &ApiClient,
    grade_id: i64,
    enrollment_id: i64,
    grade_type: GradeType,
    score: f64,
) -> Result<Grade, ApiError> {
    let payload = GradePayload {
        enrollment_id,
        grade_type,
        score,
        weight: grade_type.weight(),
    };
    api.put(&format!("/deans/grades/{grade_id}"), &payload).await
}

/// Create-or-update: rows that already carry a component get a PUT,
/// the rest a POST, mirroring how the grade sheet edits cells.
pub async fn save_grade(
    api: &ApiClient,
    row: &ClassGradeRow,
    grade_type: GradeType,
    score: f64,
) -> Result<Grade, ApiError> {
    match row.grade_id(grade_type) {
        Some(grade_id) => {
            update_grade(api, grade_id, row.enrollment_id, grade_type, score).await
        }
        None => create_grade(api, row.enrollment_id, grade_type, score).await,
    }
}
