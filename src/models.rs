//! Wire types for the dean administration API.
//!
//! Flat records exchanged as JSON with the collaborator backend. The
//! client never owns these past the screen that fetched them; payload
//! types mirror their record types minus server-derived fields.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::derive::{FINAL_WEIGHT, MIDTERM_WEIGHT};

/// A faculty department.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Department {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

/// Create/update payload for a department.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepartmentPayload {
    pub name: String,
    pub description: Option<String>,
}

/// A course in the catalog. `code` is unique server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub credits: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoursePayload {
    pub code: String,
    pub name: String,
    pub credits: i32,
}

/// A scheduled class of a course within one semester.
///
/// `day_of_week` follows the timetable convention 2=Monday .. 8=Sunday.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Class {
    pub id: i64,
    pub code: String,
    pub course_id: i64,
    pub lecturer_id: i64,
    pub semester: String,
    pub max_students: i32,
    pub start_week: Option<i32>,
    pub end_week: Option<i32>,
    pub day_of_week: Option<i32>,
    pub start_period: Option<i32>,
    pub end_period: Option<i32>,
    pub room: Option<String>,
    pub course: Option<Course>,
    #[serde(default)]
    pub enrolled_count: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassPayload {
    pub code: String,
    pub course_id: i64,
    pub lecturer_id: i64,
    pub semester: String,
    pub max_students: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_week: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_week: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_period: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_period: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
}

/// Principal kind for account management endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Dean,
    Lecturer,
    Student,
}

/// A lecturer or student account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub phone_number: Option<String>,
    pub is_active: bool,
    pub student_code: Option<String>,
    pub department_id: Option<i64>,
    pub department_name: Option<String>,
}

/// Create/update payload for a user account.
///
/// `password` is the initial password on create; on update an empty
/// value means "unchanged" and is omitted from the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPayload {
    pub username: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub full_name: String,
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// The relation linking one student to one class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: i64,
    pub class_id: i64,
    pub student_id: i64,
    #[serde(default)]
    pub grades: Vec<Grade>,
}

/// Bulk enrollment request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkEnrollment {
    pub student_ids: Vec<i64>,
}

/// Grade component kind. The weight is fixed per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradeType {
    Midterm,
    Final,
}

impl GradeType {
    /// Fixed weight of this component in the course total.
    pub fn weight(self) -> f64 {
        match self {
            GradeType::Midterm => MIDTERM_WEIGHT,
            GradeType::Final => FINAL_WEIGHT,
        }
    }
}

/// One recorded grade component. `score` is on the 0..=10 scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grade {
    pub id: i64,
    pub grade_type: GradeType,
    pub score: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradePayload {
    pub enrollment_id: i64,
    pub grade_type: GradeType,
    pub score: f64,
    pub weight: f64,
}

/// One row of a class grade sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassGradeRow {
    pub enrollment_id: i64,
    pub student_id: i64,
    pub student_code: String,
    pub full_name: String,
    #[serde(default)]
    pub grades: Vec<Grade>,
}

impl ClassGradeRow {
    /// The recorded score for one component, if any.
    pub fn score(&self, grade_type: GradeType) -> Option<f64> {
        self.grades
            .iter()
            .find(|g| g.grade_type == grade_type)
            .map(|g| g.score)
    }

    /// The recorded grade id for one component, if any.
    pub fn grade_id(&self, grade_type: GradeType) -> Option<i64> {
        self.grades
            .iter()
            .find(|g| g.grade_type == grade_type)
            .map(|g| g.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcademicYear {
    pub id: i64,
    pub year: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcademicYearPayload {
    pub year: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Semester {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub academic_year_id: i64,
    pub semester_number: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemesterPayload {
    pub code: String,
    pub name: String,
    pub academic_year_id: i64,
    pub semester_number: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_active: bool,
}

/// One semester line of a student's academic record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemesterResult {
    pub semester_id: i64,
    pub semester_code: String,
    pub semester_name: String,
    pub gpa: f64,
    pub total_credits: i32,
    pub completed_credits: i32,
    pub failed_credits: i32,
}

/// Per-semester GPA lines plus the cumulative CPA summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcademicResults {
    pub student_id: i64,
    pub student_code: String,
    pub full_name: String,
    pub semester_results: Vec<SemesterResult>,
    pub cumulative_cpa: f64,
    pub total_registered_credits: i32,
    pub total_completed_credits: i32,
    pub total_failed_credits: i32,
}

/// Global tuition price per credit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TuitionSettings {
    pub price_per_credit: i64,
}

/// Settlement state of a tuition record, derived server-side from the
/// paid amount against the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TuitionStatus {
    Pending,
    Partial,
    Completed,
}

impl TuitionStatus {
    /// Vietnamese display label.
    pub fn label(self) -> &'static str {
        match self {
            TuitionStatus::Pending => "Chưa đóng",
            TuitionStatus::Partial => "Đóng một phần",
            TuitionStatus::Completed => "Đã hoàn thành",
        }
    }

    /// The status the server is expected to derive for these amounts.
    /// Display-side preview only; the collaborator stays authoritative.
    pub fn derived(total_amount: i64, paid_amount: i64) -> Self {
        if paid_amount <= 0 {
            TuitionStatus::Pending
        } else if paid_amount < total_amount {
            TuitionStatus::Partial
        } else {
            TuitionStatus::Completed
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tuition {
    pub id: i64,
    pub student_id: i64,
    pub semester: String,
    pub total_amount: i64,
    pub paid_amount: i64,
    pub status: TuitionStatus,
    pub student_name: Option<String>,
    pub student_code: Option<String>,
}

/// Update payload for a tuition record; absent fields stay unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TuitionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TuitionStatus>,
}

/// Processing state of a student-submitted report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pending,
    Processing,
    Resolved,
    Rejected,
}

impl ReportStatus {
    /// Vietnamese display label.
    pub fn label(self) -> &'static str {
        match self {
            ReportStatus::Pending => "Chờ xử lý",
            ReportStatus::Processing => "Đang xử lý",
            ReportStatus::Resolved => "Đã giải quyết",
            ReportStatus::Rejected => "Từ chối",
        }
    }

    /// Wire value, also used as a query-filter parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Processing => "processing",
            ReportStatus::Resolved => "resolved",
            ReportStatus::Rejected => "rejected",
        }
    }
}

/// A student-submitted report with the dean's handling state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: i64,
    pub student_id: i64,
    pub student_code: Option<String>,
    pub student_name: String,
    pub title: String,
    pub description: String,
    pub report_type: String,
    pub status: ReportStatus,
    pub dean_response: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by_name: Option<String>,
}

/// Update payload for a report; absent fields stay unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ReportStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dean_response: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportStats {
    pub total: i64,
    pub pending: i64,
    pub processing: i64,
    pub resolved: i64,
    pub rejected: i64,
}

/// Headline counters for the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statistics {
    pub total_students: i64,
    pub total_lecturers: i64,
    pub total_courses: i64,
    pub total_classes: i64,
    pub total_departments: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: i64,
    pub action: String,
    pub details: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub user: String,
}

/// Successful token response from login or OTP verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    pub role: String,
}

/// OTP challenge response issued by login for second-factor accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpChallengeResponse {
    pub requires_otp: bool,
    pub message: String,
    pub email_hint: Option<String>,
}

/// Either outcome of `POST /auth/login`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LoginOutcome {
    Token(TokenResponse),
    OtpChallenge(OtpChallengeResponse),
}

/// Generic `{"message": ...}` acknowledgement body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_type_weights() {
        assert_eq!(GradeType::Midterm.weight(), 0.3);
        assert_eq!(GradeType::Final.weight(), 0.7);
    }

    #[test]
    fn test_grade_type_wire_format() {
        assert_eq!(serde_json::to_string(&GradeType::Midterm).unwrap(), "\"midterm\"");
        let parsed: GradeType = serde_json::from_str("\"final\"").unwrap();
        assert_eq!(parsed, GradeType::Final);
    }

    #[test]
    fn test_tuition_status_wire_format() {
        assert_eq!(serde_json::to_string(&TuitionStatus::Partial).unwrap(), "\"PARTIAL\"");
        let parsed: TuitionStatus = serde_json::from_str("\"COMPLETED\"").unwrap();
        assert_eq!(parsed, TuitionStatus::Completed);
    }

    #[test]
    fn test_tuition_status_derivation() {
        assert_eq!(TuitionStatus::derived(1_000_000, 0), TuitionStatus::Pending);
        assert_eq!(TuitionStatus::derived(1_000_000, 500_000), TuitionStatus::Partial);
        assert_eq!(TuitionStatus::derived(1_000_000, 1_000_000), TuitionStatus::Completed);
        // Overpayment is not rejected anywhere; it still reads as completed.
        assert_eq!(TuitionStatus::derived(1_000_000, 1_200_000), TuitionStatus::Completed);
    }

    #[test]
    fn test_login_outcome_token() {
        let body = r#"{"access_token":"abc","token_type":"bearer","role":"dean"}"#;
        match serde_json::from_str::<LoginOutcome>(body).unwrap() {
            LoginOutcome::Token(t) => {
                assert_eq!(t.access_token, "abc");
                assert_eq!(t.role, "dean");
            }
            LoginOutcome::OtpChallenge(_) => panic!("expected token outcome"),
        }
    }

    #[test]
    fn test_login_outcome_otp_challenge() {
        let body = r#"{"requires_otp":true,"message":"OTP đã được gửi","email_hint":"ngu***@hust.edu.vn"}"#;
        match serde_json::from_str::<LoginOutcome>(body).unwrap() {
            LoginOutcome::OtpChallenge(c) => {
                assert!(c.requires_otp);
                assert_eq!(c.email_hint.as_deref(), Some("ngu***@hust.edu.vn"));
            }
            LoginOutcome::Token(_) => panic!("expected challenge outcome"),
        }
    }

    #[test]
    fn test_update_payloads_omit_absent_fields() {
        let update = TuitionUpdate { paid_amount: Some(500_000), status: None };
        assert_eq!(serde_json::to_string(&update).unwrap(), r#"{"paid_amount":500000}"#);

        let update = ReportUpdate::default();
        assert_eq!(serde_json::to_string(&update).unwrap(), "{}");
    }

    #[test]
    fn test_class_grade_row_lookup() {
        let row = ClassGradeRow {
            enrollment_id: 9,
            student_id: 4,
            student_code: "20210001".into(),
            full_name: "Nguyen Van Duc".into(),
            grades: vec![Grade { id: 1, grade_type: GradeType::Midterm, score: 8.0, weight: 0.3 }],
        };
        assert_eq!(row.score(GradeType::Midterm), Some(8.0));
        assert_eq!(row.score(GradeType::Final), None);
        assert_eq!(row.grade_id(GradeType::Midterm), Some(1));
    }
}
