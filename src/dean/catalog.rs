//! Departments, courses, classes and enrollment.

use super::Page;
use crate::api::{ApiClient, ApiError};
use crate::models::{
    BulkEnrollment, Class, ClassPayload, Course, CoursePayload, Department, DepartmentPayload,
    User,
};

pub async fn list_departments(api: &ApiClient) -> Result<Vec<Department>, ApiError> {
    api.get("/deans/departments").await
}

pub async fn create_department(
    api: &ApiClient,
    payload: &DepartmentPayload,
) -> Result<Department, ApiError> {
    api.post("/deans/departments", payload).await
}

pub async fn update_department(
    api: &ApiClient,
    id: i64,
    payload: &DepartmentPayload,
) -> Result<Department, ApiError> {
    api.put(&format!("/deans/departments/{id}"), payload).await
}

pub async fn delete_department(api: &ApiClient, id: i64) -> Result<(), ApiError> {
    api.delete(&format!("/deans/departments/{id}")).await
}

pub async fn list_courses(api: &ApiClient) -> Result<Vec<Course>, ApiError> {
    api.get("/deans/courses").await
}

pub async fn create_course(api: &ApiClient, payload: &CoursePayload) -> Result<Course, ApiError> {
    api.post("/deans/courses", payload).await
}

pub async fn update_course(
    api: &ApiClient,
    id: i64,
    payload: &CoursePayload,
) -> Result<Course, ApiError> {
    api.put(&format!("/deans/courses/{id}"), payload).await
}

pub async fn delete_course(api: &ApiClient, id: i64) -> Result<(), ApiError> {
    api.delete(&format!("/deans/courses/{id}")).await
}

pub async fn list_classes(api: &ApiClient, page: Page) -> Result<Vec<Class>, ApiError> {
    if page.is_unpaginated() {
        api.get("/deans/classes").await
    } else {
        api.get_with_query("/deans/classes", &page.query()).await
    }
}

pub async fn get_class(api: &ApiClient, id: i64) -> Result<Class, ApiError> {
    api.get(&format!("/deans/classes/{id}")).await
}

pub async fn create_class(api: &ApiClient, payload: &ClassPayload) -> Result<Class, ApiError> {
    api.post("/deans/classes", payload).await
}

pub async fn update_class(
    api: &ApiClient,
    id: i64,
    payload: &ClassPayload,
) -> Result<Class, ApiError> {
    api.put(&format!("/deans/classes/{id}"), payload).await
}

pub async fn delete_class(api: &ApiClient, id: i64) -> Result<(), ApiError> {
    api.delete(&format!("/deans/classes/{id}")).await
}

/// Students currently enrolled in a class.
pub async fn class_students(api: &ApiClient, class_id: i64) -> Result<Vec<User>, ApiError> {
    api.get(&format!("/deans/classes/{class_id}/students")).await
}

/// Enrolls a set of students in one request, returning how many were
/// submitted so the caller can report the count added.
pub async fn enroll_students(
    api: &ApiClient,
    class_id: i64,
    student_ids: &[i64],
) -> Result<usize, ApiError> {
    let payload = BulkEnrollment {
        student_ids: student_ids.to_vec(),
    };
    api.post_unit(&format!("/deans/classes/{class_id}/enrollments/bulk"), &payload)
        .await?;
    Ok(student_ids.len())
}

/// The complement set offered by the bulk-add picker: every student not
/// already enrolled in the class.
pub fn available_students(all_students: &[User], enrolled: &[User]) -> Vec<User> {
    let enrolled_ids: std::collections::HashSet<i64> = enrolled.iter().map(|s| s.id).collect();
    all_students
        .iter()
        .filter(|s| !enrolled_ids.contains(&s.id))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(id: i64, name: &str) -> User {
        User {
            id,
            username: name.to_string(),
            email: format!("{name}@student.university.edu.vn"),
            full_name: name.to_string(),
            phone_number: None,
            is_active: true,
            student_code: None,
            department_id: None,
            department_name: None,
        }
    }

    #[test]
    fn test_available_students_is_the_complement_set() {
        let all = vec![student(1, "an"), student(2, "binh"), student(3, "chi")];
        let enrolled = vec![student(2, "binh")];

        let available = available_students(&all, &enrolled);
        let ids: Vec<i64> = available.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_available_students_empty_roster() {
        let all = vec![student(1, "an")];
        assert_eq!(available_students(&all, &[]).len(), 1);
        assert!(available_students(&[], &all).is_empty());
    }
}
