//! Form state for the create/edit modals, expressed as reducers.
//!
//! Each form is a plain value; applying an event yields the next value.
//! Derived fields (username, e-mail, class code) recompute only while
//! the form is in `Create` mode — editing an existing record never
//! overwrites its identity fields. That freeze rule is the mode flag,
//! not a view-lifecycle accident.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::derive;
use crate::models::{ClassPayload, CoursePayload, DepartmentPayload, Role, User, UserPayload};

/// Semester strings look like `2023.1`.
static SEMESTER_FORMAT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4}\.\d$").unwrap());

/// Default capacity of a newly created class.
pub const DEFAULT_MAX_STUDENTS: i32 = 50;

/// Whether the form creates a new record or edits an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit,
}

/// Field-level validation failures, collected rather than
/// first-failure-wins so the operator sees everything at once.
#[derive(Debug, Default)]
pub struct ValidationErrors {
    errors: Vec<(String, String)>,
}

impl std::error::Error for ValidationErrors {}

impl ValidationErrors {
    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push((field.to_string(), message.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.errors.iter().map(|(f, m)| (f.as_str(), m.as_str()))
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .errors
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect();
        write!(f, "{}", rendered.join("; "))
    }
}

/// Checks a grade score against the 0..=10 scale.
pub fn validate_score(score: f64) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if !(0.0..=10.0).contains(&score) || score.is_nan() {
        errors.push("score", "Điểm phải nằm trong khoảng 0 đến 10");
    }
    errors.into_result()
}

/// Warning line when a tuition update would pay more than the total.
///
/// Nothing in the system rejects this, so the console warns and
/// submits; the server stays authoritative for the resulting status.
pub fn tuition_overpayment_warning(total_amount: i64, paid_amount: i64) -> Option<String> {
    (paid_amount > total_amount).then(|| {
        format!("Số tiền đã đóng ({paid_amount}) lớn hơn tổng học phí ({total_amount})")
    })
}

pub fn validate_department(payload: &DepartmentPayload) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if payload.name.trim().is_empty() {
        errors.push("name", "Tên khoa là bắt buộc");
    }
    errors.into_result()
}

pub fn validate_course(payload: &CoursePayload) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if payload.code.trim().is_empty() {
        errors.push("code", "Mã học phần là bắt buộc");
    }
    if payload.name.trim().is_empty() {
        errors.push("name", "Tên học phần là bắt buộc");
    }
    if payload.credits < 1 {
        errors.push("credits", "Số tín chỉ phải lớn hơn 0");
    }
    errors.into_result()
}

/// Form state for lecturer and student accounts.
///
/// While creating, any change to the full name (or, for students, the
/// student code) recomputes the username and e-mail; both freeze the
/// moment the form edits an existing user.
#[derive(Debug, Clone)]
pub struct UserForm {
    pub mode: FormMode,
    pub role: Role,
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone_number: String,
    pub student_code: String,
    pub department_id: Option<i64>,
    email_domain: String,
}

/// Events the user form reduces over.
#[derive(Debug, Clone)]
pub enum UserFormEvent {
    SetFullName(String),
    SetStudentCode(String),
    SetPhoneNumber(String),
    SetPassword(String),
    SetDepartment(Option<i64>),
    /// Manual username override. A later name/code change while
    /// creating recomputes over it, same as typing into the original
    /// form.
    SetUsername(String),
    /// Manual e-mail override, with the same recompute caveat.
    SetEmail(String),
}

impl UserForm {
    /// Blank create-mode form. `email_domain` is the role-appropriate
    /// institutional domain; `default_password` seeds new accounts.
    pub fn create(role: Role, email_domain: &str, default_password: &str) -> Self {
        Self {
            mode: FormMode::Create,
            role,
            username: String::new(),
            email: String::new(),
            password: default_password.to_string(),
            full_name: String::new(),
            phone_number: String::new(),
            student_code: String::new(),
            department_id: None,
            email_domain: email_domain.to_string(),
        }
    }

    /// Edit-mode form pre-filled from an existing record. An empty
    /// password means "unchanged".
    pub fn edit(user: &User, role: Role, email_domain: &str) -> Self {
        Self {
            mode: FormMode::Edit,
            role,
            username: user.username.clone(),
            email: user.email.clone(),
            password: String::new(),
            full_name: user.full_name.clone(),
            phone_number: user.phone_number.clone().unwrap_or_default(),
            student_code: user.student_code.clone().unwrap_or_default(),
            department_id: user.department_id,
            email_domain: email_domain.to_string(),
        }
    }

    /// Reduces one event into the next form state.
    pub fn apply(mut self, event: UserFormEvent) -> Self {
        match event {
            UserFormEvent::SetFullName(name) => {
                self.full_name = name;
                self.recompute_credentials();
            }
            UserFormEvent::SetStudentCode(code) => {
                self.student_code = code;
                self.recompute_credentials();
            }
            UserFormEvent::SetPhoneNumber(phone) => self.phone_number = phone,
            UserFormEvent::SetPassword(password) => self.password = password,
            UserFormEvent::SetDepartment(id) => self.department_id = id,
            UserFormEvent::SetUsername(username) => self.username = username,
            UserFormEvent::SetEmail(email) => self.email = email,
        }
        self
    }

    fn recompute_credentials(&mut self) {
        if self.mode != FormMode::Create {
            return;
        }
        let suffix = match self.role {
            Role::Student if !self.student_code.is_empty() => {
                Some(derive::student_code_suffix(&self.student_code))
            }
            _ => None,
        };
        self.username = derive::derive_username(&self.full_name, suffix.as_deref());
        self.email = derive::derive_email(&self.username, &self.email_domain);
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if self.full_name.trim().is_empty() {
            errors.push("full_name", "Họ tên là bắt buộc");
        }
        if self.username.trim().is_empty() {
            errors.push("username", "Tên đăng nhập là bắt buộc");
        }
        if !self.email.contains('@') {
            errors.push("email", "Email không hợp lệ");
        }
        if self.role == Role::Student && self.student_code.trim().is_empty() {
            errors.push("student_code", "Mã sinh viên là bắt buộc");
        }
        if self.mode == FormMode::Create && self.password.is_empty() {
            errors.push("password", "Mật khẩu là bắt buộc");
        }
        errors.into_result()
    }

    /// Validates, then builds the wire payload.
    pub fn payload(&self) -> Result<UserPayload, ValidationErrors> {
        self.validate()?;
        Ok(UserPayload {
            username: self.username.clone(),
            email: self.email.clone(),
            password: (!self.password.is_empty()).then(|| self.password.clone()),
            full_name: self.full_name.clone(),
            phone_number: (!self.phone_number.is_empty()).then(|| self.phone_number.clone()),
            student_code: (self.role == Role::Student && !self.student_code.is_empty())
                .then(|| self.student_code.clone()),
            department_id: self.department_id,
            role: (self.mode == FormMode::Create).then_some(self.role),
        })
    }
}

/// Form state for a class.
#[derive(Debug, Clone)]
pub struct ClassForm {
    pub mode: FormMode,
    pub code: String,
    pub course_id: Option<i64>,
    pub lecturer_id: Option<i64>,
    pub semester: String,
    pub max_students: i32,
    pub start_week: Option<i32>,
    pub end_week: Option<i32>,
    pub day_of_week: Option<i32>,
    pub start_period: Option<i32>,
    pub end_period: Option<i32>,
    pub room: Option<String>,
    course_code: Option<String>,
}

#[derive(Debug, Clone)]
pub enum ClassFormEvent {
    /// Manual code override; later course/semester changes while
    /// creating recompute over it.
    SetCode(String),
    /// Course selection carries the code so derivation needs no lookup.
    SetCourse { id: i64, code: String },
    SetLecturer(i64),
    SetSemester(String),
    SetMaxStudents(i32),
    SetWeeks {
        start: Option<i32>,
        end: Option<i32>,
    },
    SetDayOfWeek(Option<i32>),
    SetPeriods {
        start: Option<i32>,
        end: Option<i32>,
    },
    SetRoom(Option<String>),
}

impl ClassForm {
    pub fn create() -> Self {
        Self {
            mode: FormMode::Create,
            code: String::new(),
            course_id: None,
            lecturer_id: None,
            semester: String::new(),
            max_students: DEFAULT_MAX_STUDENTS,
            start_week: None,
            end_week: None,
            day_of_week: None,
            start_period: None,
            end_period: None,
            room: None,
            course_code: None,
        }
    }

    pub fn edit(class: &crate::models::Class) -> Self {
        Self {
            mode: FormMode::Edit,
            code: class.code.clone(),
            course_id: Some(class.course_id),
            lecturer_id: Some(class.lecturer_id),
            semester: class.semester.clone(),
            max_students: class.max_students,
            start_week: class.start_week,
            end_week: class.end_week,
            day_of_week: class.day_of_week,
            start_period: class.start_period,
            end_period: class.end_period,
            room: class.room.clone(),
            course_code: class.course.as_ref().map(|c| c.code.clone()),
        }
    }

    pub fn apply(mut self, event: ClassFormEvent) -> Self {
        match event {
            ClassFormEvent::SetCode(code) => self.code = code,
            ClassFormEvent::SetCourse { id, code } => {
                self.course_id = Some(id);
                self.course_code = Some(code);
                self.recompute_code();
            }
            ClassFormEvent::SetLecturer(id) => self.lecturer_id = Some(id),
            ClassFormEvent::SetSemester(semester) => {
                self.semester = semester;
                self.recompute_code();
            }
            ClassFormEvent::SetMaxStudents(max) => self.max_students = max,
            ClassFormEvent::SetWeeks { start, end } => {
                self.start_week = start;
                self.end_week = end;
            }
            ClassFormEvent::SetDayOfWeek(day) => self.day_of_week = day,
            ClassFormEvent::SetPeriods { start, end } => {
                self.start_period = start;
                self.end_period = end;
            }
            ClassFormEvent::SetRoom(room) => self.room = room,
        }
        self
    }

    /// Derives the class code, only while creating and only once both
    /// the course and the semester are known.
    fn recompute_code(&mut self) {
        if self.mode != FormMode::Create {
            return;
        }
        if let Some(course_code) = &self.course_code {
            if !self.semester.is_empty() {
                self.code = derive::derive_class_code(course_code, &self.semester);
            }
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if self.code.trim().is_empty() {
            errors.push("code", "Mã lớp là bắt buộc");
        }
        if self.course_id.is_none() {
            errors.push("course_id", "Học phần là bắt buộc");
        }
        if self.lecturer_id.is_none() {
            errors.push("lecturer_id", "Giảng viên là bắt buộc");
        }
        if !SEMESTER_FORMAT.is_match(&self.semester) {
            errors.push("semester", "Học kỳ phải có dạng YYYY.N, ví dụ 2023.1");
        }
        if self.max_students < 1 {
            errors.push("max_students", "Sĩ số tối đa phải lớn hơn 0");
        }
        if let (Some(start), Some(end)) = (self.start_week, self.end_week) {
            if start > end {
                errors.push("start_week", "Tuần bắt đầu phải trước tuần kết thúc");
            }
        }
        if let (Some(start), Some(end)) = (self.start_period, self.end_period) {
            if start > end {
                errors.push("start_period", "Tiết bắt đầu phải trước tiết kết thúc");
            }
        }
        if let Some(day) = self.day_of_week {
            if !(2..=8).contains(&day) {
                errors.push("day_of_week", "Thứ phải nằm trong khoảng 2 đến 8");
            }
        }
        errors.into_result()
    }

    pub fn payload(&self) -> Result<ClassPayload, ValidationErrors> {
        self.validate()?;
        Ok(ClassPayload {
            code: self.code.clone(),
            // validate() guarantees both ids are present.
            course_id: self.course_id.unwrap_or_default(),
            lecturer_id: self.lecturer_id.unwrap_or_default(),
            semester: self.semester.clone(),
            max_students: self.max_students,
            start_week: self.start_week,
            end_week: self.end_week,
            day_of_week: self.day_of_week,
            start_period: self.start_period,
            end_period: self.end_period,
            room: self.room.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: 7,
            username: "nguyenvanduc0001".into(),
            email: "nguyenvanduc0001@student.university.edu.vn".into(),
            full_name: "Nguyễn Văn Đức".into(),
            phone_number: None,
            is_active: true,
            student_code: Some("20210001".into()),
            department_id: Some(2),
            department_name: None,
        }
    }

    #[test]
    fn test_student_credentials_derive_while_creating() {
        let form = UserForm::create(Role::Student, "student.university.edu.vn", "12345678")
            .apply(UserFormEvent::SetFullName("Nguyễn Văn Đức".into()))
            .apply(UserFormEvent::SetStudentCode("20210001".into()));

        assert_eq!(form.username, "nguyenvanduc0001");
        assert_eq!(form.email, "nguyenvanduc0001@student.university.edu.vn");
    }

    #[test]
    fn test_lecturer_credentials_use_staff_domain() {
        let form = UserForm::create(Role::Lecturer, "hust.edu.vn", "12345678")
            .apply(UserFormEvent::SetFullName("Trần Thị Hồng".into()));

        assert_eq!(form.username, "tranthihong");
        assert_eq!(form.email, "tranthihong@hust.edu.vn");
    }

    #[test]
    fn test_editing_never_overwrites_username() {
        let user = sample_user();
        let form = UserForm::edit(&user, Role::Student, "student.university.edu.vn")
            .apply(UserFormEvent::SetFullName("Tên Hoàn Toàn Khác".into()));

        assert_eq!(form.username, "nguyenvanduc0001");
        assert_eq!(form.email, "nguyenvanduc0001@student.university.edu.vn");
        assert_eq!(form.full_name, "Tên Hoàn Toàn Khác");
    }

    #[test]
    fn test_edit_payload_omits_empty_password_and_role() {
        let user = sample_user();
        let form = UserForm::edit(&user, Role::Student, "student.university.edu.vn");
        let payload = form.payload().unwrap();
        assert!(payload.password.is_none());
        assert!(payload.role.is_none());

        let form = UserForm::create(Role::Student, "student.university.edu.vn", "12345678")
            .apply(UserFormEvent::SetFullName("Nguyễn Văn Đức".into()))
            .apply(UserFormEvent::SetStudentCode("20210001".into()));
        let payload = form.payload().unwrap();
        assert_eq!(payload.password.as_deref(), Some("12345678"));
        assert_eq!(payload.role, Some(Role::Student));
    }

    #[test]
    fn test_user_form_requires_name() {
        let form = UserForm::create(Role::Lecturer, "hust.edu.vn", "12345678");
        let errors = form.validate().unwrap_err();
        assert!(errors.iter().any(|(field, _)| field == "full_name"));
    }

    #[test]
    fn test_class_code_derives_once_both_inputs_set() {
        let form = ClassForm::create().apply(ClassFormEvent::SetCourse {
            id: 5,
            code: "IT3040".into(),
        });
        // Course alone does not derive.
        assert!(form.code.is_empty());

        let form = form.apply(ClassFormEvent::SetSemester("2024.2".into()));
        assert_eq!(form.code, "IT304020242");
    }

    #[test]
    fn test_class_code_frozen_while_editing() {
        let class = crate::models::Class {
            id: 1,
            code: "IT304020231".into(),
            course_id: 5,
            lecturer_id: 2,
            semester: "2023.1".into(),
            max_students: 50,
            start_week: None,
            end_week: None,
            day_of_week: None,
            start_period: None,
            end_period: None,
            room: None,
            course: Some(crate::models::Course {
                id: 5,
                code: "IT3040".into(),
                name: "Lập trình mạng".into(),
                credits: 3,
            }),
            enrolled_count: 0,
        };
        let form = ClassForm::edit(&class).apply(ClassFormEvent::SetSemester("2024.2".into()));
        assert_eq!(form.code, "IT304020231");
    }

    #[test]
    fn test_class_form_validation() {
        let form = ClassForm::create()
            .apply(ClassFormEvent::SetCourse {
                id: 5,
                code: "IT3040".into(),
            })
            .apply(ClassFormEvent::SetLecturer(2))
            .apply(ClassFormEvent::SetSemester("2023.1".into()));
        assert!(form.validate().is_ok());

        let bad = form
            .clone()
            .apply(ClassFormEvent::SetSemester("20231".into()))
            .apply(ClassFormEvent::SetMaxStudents(0));
        let errors = bad.validate().unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|(f, _)| f).collect();
        // Edit-free create form re-derives the code from the dotless
        // semester, so only semester and capacity fail.
        assert!(fields.contains(&"semester"));
        assert!(fields.contains(&"max_students"));
    }

    #[test]
    fn test_score_bounds() {
        assert!(validate_score(0.0).is_ok());
        assert!(validate_score(10.0).is_ok());
        assert!(validate_score(-0.5).is_err());
        assert!(validate_score(10.5).is_err());
        assert!(validate_score(f64::NAN).is_err());
    }

    #[test]
    fn test_tuition_overpayment_warns_but_does_not_block() {
        assert!(tuition_overpayment_warning(1_000_000, 900_000).is_none());
        assert!(tuition_overpayment_warning(1_000_000, 1_100_000).is_some());
    }

    #[test]
    fn test_course_and_department_validation() {
        let course = CoursePayload {
            code: "IT3040".into(),
            name: "Lập trình mạng".into(),
            credits: 3,
        };
        assert!(validate_course(&course).is_ok());

        let bad = CoursePayload {
            code: "".into(),
            name: "".into(),
            credits: 0,
        };
        let errors = validate_course(&bad).unwrap_err();
        assert_eq!(errors.iter().count(), 3);

        let dept = DepartmentPayload {
            name: " ".into(),
            description: None,
        };
        assert!(validate_department(&dept).is_err());
    }
}
