//! Console rendering of the entity screens.
//!
//! Every screen follows the same contract: announce loading, fetch,
//! render a table (or the screen's empty-state line), and surface any
//! failure as a printed message instead of a crash. Deletes require an
//! explicit confirmation; create/edit submit a validated form and show
//! the collaborator's error detail inline on rejection. No automatic
//! retries anywhere.

pub mod table;

use std::io::{self, BufRead, Write as _};

use anyhow::{anyhow, Context, Result};
use futures::join;
use tracing::debug;

use crate::api::{ApiClient, ApiError, ListCache};
use crate::auth::{AuthFlow, AuthState, LoginResult};
use crate::cli::{ClassFields, UserFields};
use crate::config::AppConfig;
use crate::dean::{self, Page};
use crate::derive;
use crate::form::{
    tuition_overpayment_warning, validate_course, validate_department, validate_score, ClassForm,
    ClassFormEvent, UserForm, UserFormEvent,
};
use crate::models::{
    AcademicYearPayload, Class, Course, CoursePayload, Department, DepartmentPayload, GradeType,
    ReportStatus, ReportUpdate, Role, SemesterPayload, TuitionUpdate, User,
};
use table::{dash, score, Table};

const LOADING: &str = "Đang tải dữ liệu...";

const COURSES_KEY: &str = "/deans/courses";
const LECTURERS_KEY: &str = "/deans/lecturers";
const DEPARTMENTS_KEY: &str = "/deans/departments";

/// Screen driver bundling the client, configuration and the
/// reference-list caches the forms share.
pub struct Console {
    api: ApiClient,
    config: AppConfig,
    courses: ListCache<Course>,
    lecturers: ListCache<User>,
    departments: ListCache<Department>,
}

impl Console {
    pub fn new(api: ApiClient, config: AppConfig) -> Self {
        Self {
            api,
            config,
            courses: ListCache::with_default_ttl(),
            lecturers: ListCache::with_default_ttl(),
            departments: ListCache::with_default_ttl(),
        }
    }

    // ----- authentication -------------------------------------------------

    pub async fn login(&self, username: &str, password: Option<String>) -> Result<()> {
        let password = match password {
            Some(p) => p,
            None => prompt_line("Mật khẩu: ")?,
        };
        let flow = AuthFlow::new(&self.api);
        match flow.login(username, &password).await {
            Ok(LoginResult::Authenticated { role }) => {
                println!("Đăng nhập thành công với vai trò {role}.");
                Ok(())
            }
            Ok(LoginResult::OtpRequired { message, email_hint }) => {
                println!("{message}");
                if let Some(hint) = email_hint {
                    println!("Mã xác thực đã được gửi đến: {hint}");
                }
                println!("Nhập mã bằng lệnh: deanreg otp verify <mã>");
                Ok(())
            }
            Err(e) => Err(anyhow!("Tên đăng nhập hoặc mật khẩu không đúng ({e})")),
        }
    }

    pub async fn otp_verify(&self, code: &str) -> Result<()> {
        if code.len() != 6 || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(anyhow!("Mã OTP phải gồm 6 chữ số"));
        }
        let flow = AuthFlow::new(&self.api);
        let role = flow.verify_otp(code).await.map_err(|e| anyhow!("{e}"))?;
        println!("Xác thực OTP thành công. Đăng nhập với vai trò {role}.");
        Ok(())
    }

    pub async fn otp_resend(&self) -> Result<()> {
        let flow = AuthFlow::new(&self.api);
        let message = flow.resend_otp().await.map_err(|e| anyhow!("{e}"))?;
        println!("{message}");
        Ok(())
    }

    pub fn otp_abandon(&self) -> Result<()> {
        AuthFlow::new(&self.api).abandon();
        println!("Đã hủy phiên xác thực OTP.");
        Ok(())
    }

    pub fn logout(&self) -> Result<()> {
        AuthFlow::new(&self.api).logout();
        println!("Đã đăng xuất.");
        Ok(())
    }

    pub fn whoami(&self) -> Result<()> {
        match AuthFlow::new(&self.api).state() {
            AuthState::Anonymous => println!("Chưa đăng nhập."),
            AuthState::Challenged { username } => {
                println!("Đang chờ xác thực OTP cho tài khoản {username}.")
            }
            AuthState::Authenticated => println!("Đã đăng nhập."),
        }
        Ok(())
    }

    pub async fn change_password(&self, old: &str, new: &str) -> Result<()> {
        let flow = AuthFlow::new(&self.api);
        let message = flow.change_password(old, new).await.map_err(|e| anyhow!("{e}"))?;
        println!("{message}");
        Ok(())
    }

    // ----- departments ----------------------------------------------------

    pub async fn departments_list(&self) -> Result<()> {
        println!("{LOADING}");
        let departments = surface(
            dean::catalog::list_departments(&self.api).await,
            "Không thể tải danh sách khoa",
        )?;
        if departments.is_empty() {
            println!("Chưa có khoa nào");
            return Ok(());
        }
        let mut table = Table::new(&["ID", "Tên khoa", "Mô tả"]);
        for d in &departments {
            table.row(vec![
                d.id.to_string(),
                d.name.clone(),
                d.description.clone().unwrap_or_default(),
            ]);
        }
        println!("{}", table.render());
        Ok(())
    }

    pub async fn departments_create(&self, name: &str, description: Option<String>) -> Result<()> {
        let payload = DepartmentPayload {
            name: name.to_string(),
            description,
        };
        validate_department(&payload).map_err(|e| anyhow!("{e}"))?;
        let created = surface(
            dean::catalog::create_department(&self.api, &payload).await,
            "Không thể lưu thông tin khoa",
        )?;
        self.departments.invalidate(DEPARTMENTS_KEY);
        println!("Đã tạo khoa {} (id {}).", created.name, created.id);
        Ok(())
    }

    pub async fn departments_update(
        &self,
        id: i64,
        name: &str,
        description: Option<String>,
    ) -> Result<()> {
        let payload = DepartmentPayload {
            name: name.to_string(),
            description,
        };
        validate_department(&payload).map_err(|e| anyhow!("{e}"))?;
        let updated = surface(
            dean::catalog::update_department(&self.api, id, &payload).await,
            "Không thể lưu thông tin khoa",
        )?;
        self.departments.invalidate(DEPARTMENTS_KEY);
        println!("Đã cập nhật khoa {} (id {}).", updated.name, updated.id);
        Ok(())
    }

    pub async fn departments_delete(&self, id: i64, yes: bool) -> Result<()> {
        if !confirm_delete(yes)? {
            println!("Đã hủy.");
            return Ok(());
        }
        match dean::catalog::delete_department(&self.api, id).await {
            Ok(()) => {
                self.departments.invalidate(DEPARTMENTS_KEY);
                println!("Đã xóa khoa (id {id}).");
                Ok(())
            }
            // Referential constraints are the common failure here; the
            // record stays in place server-side.
            Err(e) => Err(anyhow!("Không thể xóa khoa này: {}", detail_of(e))),
        }
    }

    // ----- courses --------------------------------------------------------

    pub async fn courses_list(&self) -> Result<()> {
        println!("{LOADING}");
        let courses = surface(
            dean::catalog::list_courses(&self.api).await,
            "Không thể tải danh sách học phần",
        )?;
        if courses.is_empty() {
            println!("Chưa có học phần nào");
            return Ok(());
        }
        let mut table = Table::new(&["ID", "Mã", "Tên học phần", "Tín chỉ"]);
        for c in &courses {
            table.row(vec![
                c.id.to_string(),
                c.code.clone(),
                c.name.clone(),
                c.credits.to_string(),
            ]);
        }
        println!("{}", table.render());
        Ok(())
    }

    pub async fn courses_create(&self, code: &str, name: &str, credits: i32) -> Result<()> {
        let payload = CoursePayload {
            code: code.to_string(),
            name: name.to_string(),
            credits,
        };
        validate_course(&payload).map_err(|e| anyhow!("{e}"))?;
        let created = surface(
            dean::catalog::create_course(&self.api, &payload).await,
            "Không thể lưu thông tin học phần",
        )?;
        self.courses.invalidate(COURSES_KEY);
        println!("Đã tạo học phần {} (id {}).", created.code, created.id);
        Ok(())
    }

    pub async fn courses_update(
        &self,
        id: i64,
        code: &str,
        name: &str,
        credits: i32,
    ) -> Result<()> {
        let payload = CoursePayload {
            code: code.to_string(),
            name: name.to_string(),
            credits,
        };
        validate_course(&payload).map_err(|e| anyhow!("{e}"))?;
        let updated = surface(
            dean::catalog::update_course(&self.api, id, &payload).await,
            "Không thể lưu thông tin học phần",
        )?;
        self.courses.invalidate(COURSES_KEY);
        println!("Đã cập nhật học phần {} (id {}).", updated.code, updated.id);
        Ok(())
    }

    pub async fn courses_delete(&self, id: i64, yes: bool) -> Result<()> {
        if !confirm_delete(yes)? {
            println!("Đã hủy.");
            return Ok(());
        }
        match dean::catalog::delete_course(&self.api, id).await {
            Ok(()) => {
                self.courses.invalidate(COURSES_KEY);
                println!("Đã xóa học phần (id {id}).");
                Ok(())
            }
            Err(e) => Err(anyhow!("Không thể xóa học phần này: {}", detail_of(e))),
        }
    }

    // ----- classes --------------------------------------------------------

    pub async fn classes_list(&self, page: Page) -> Result<()> {
        println!("{LOADING}");
        let classes = surface(
            dean::catalog::list_classes(&self.api, page).await,
            "Không thể tải danh sách lớp học",
        )?;
        if classes.is_empty() {
            println!("Chưa có lớp học nào");
            return Ok(());
        }
        let mut table = Table::new(&["ID", "Mã lớp", "Học phần", "Học kỳ", "Sĩ số"]);
        for c in &classes {
            table.row(vec![
                c.id.to_string(),
                c.code.clone(),
                c.course.as_ref().map(|co| co.name.clone()).unwrap_or_default(),
                c.semester.clone(),
                format!("{}/{}", c.enrolled_count, c.max_students),
            ]);
        }
        println!("{}", table.render());
        Ok(())
    }

    pub async fn classes_show(&self, id: i64) -> Result<()> {
        println!("{LOADING}");
        // Class header and roster are independent; fetch them together.
        let (class, students) = join!(
            dean::catalog::get_class(&self.api, id),
            dean::catalog::class_students(&self.api, id)
        );
        let class = surface(class, "Lớp học không tồn tại")?;
        let students = surface(students, "Không thể tải danh sách sinh viên")?;

        print_class(&class);
        if students.is_empty() {
            println!("Chưa có sinh viên nào trong lớp.");
            return Ok(());
        }
        let mut table = Table::new(&["ID", "Mã SV", "Họ tên", "Email"]);
        for s in &students {
            table.row(vec![
                s.id.to_string(),
                s.student_code.clone().unwrap_or_default(),
                s.full_name.clone(),
                s.email.clone(),
            ]);
        }
        println!("{}", table.render());
        Ok(())
    }

    pub async fn classes_create(&self, fields: &ClassFields) -> Result<()> {
        // The form needs courses and lecturers; independent fetches,
        // joined before anything renders.
        let (courses, lecturers) = join!(self.courses(), self.lecturers_all());
        let courses = surface(courses, "Không thể tải danh sách học phần")?;
        let lecturers = surface(lecturers, "Không thể tải danh sách giảng viên")?;

        let form = apply_class_fields(ClassForm::create(), fields, &courses)?;
        if let Some(lecturer_id) = form.lecturer_id {
            if !lecturers.iter().any(|l| l.id == lecturer_id) {
                return Err(anyhow!("Không tìm thấy giảng viên với id {lecturer_id}"));
            }
        }
        let payload = form.payload().map_err(|e| anyhow!("{e}"))?;
        let created = surface(
            dean::catalog::create_class(&self.api, &payload).await,
            "Không thể lưu thông tin lớp học",
        )?;
        println!("Đã tạo lớp {} (id {}).", created.code, created.id);
        Ok(())
    }

    pub async fn classes_update(&self, id: i64, fields: &ClassFields) -> Result<()> {
        let class = surface(
            dean::catalog::get_class(&self.api, id).await,
            "Lớp học không tồn tại",
        )?;
        let courses = surface(self.courses().await, "Không thể tải danh sách học phần")?;
        let form = apply_class_fields(ClassForm::edit(&class), fields, &courses)?;
        let payload = form.payload().map_err(|e| anyhow!("{e}"))?;
        let updated = surface(
            dean::catalog::update_class(&self.api, id, &payload).await,
            "Không thể lưu thông tin lớp học",
        )?;
        println!("Đã cập nhật lớp {} (id {}).", updated.code, updated.id);
        Ok(())
    }

    pub async fn classes_delete(&self, id: i64, yes: bool) -> Result<()> {
        if !confirm_delete(yes)? {
            println!("Đã hủy.");
            return Ok(());
        }
        match dean::catalog::delete_class(&self.api, id).await {
            Ok(()) => {
                println!("Đã xóa lớp học (id {id}).");
                Ok(())
            }
            Err(e) => Err(anyhow!("Không thể xóa lớp học này: {}", detail_of(e))),
        }
    }

    /// Bulk-add screen. With no ids, shows the complement set (all
    /// students minus those already enrolled); with ids, enrolls them
    /// in one request and reports the count.
    pub async fn classes_enroll(&self, class_id: i64, student_ids: &[i64]) -> Result<()> {
        println!("{LOADING}");
        let (enrolled, all_students) = join!(
            dean::catalog::class_students(&self.api, class_id),
            dean::people::list_students(&self.api, Page::default())
        );
        let enrolled = surface(enrolled, "Không thể tải danh sách sinh viên")?;
        let all_students = surface(all_students, "Lỗi tải danh sách sinh viên")?;
        let available = dean::catalog::available_students(&all_students, &enrolled);

        if student_ids.is_empty() {
            if available.is_empty() {
                println!("Tất cả sinh viên đã có trong lớp.");
                return Ok(());
            }
            println!("Sinh viên có thể thêm vào lớp:");
            let mut table = Table::new(&["ID", "Mã SV", "Họ tên"]);
            for s in &available {
                table.row(vec![
                    s.id.to_string(),
                    s.student_code.clone().unwrap_or_default(),
                    s.full_name.clone(),
                ]);
            }
            println!("{}", table.render());
            println!("Chọn bằng lệnh: deanreg classes enroll {class_id} --students <id,id,...>");
            return Ok(());
        }

        let mut selected = Vec::new();
        for id in student_ids {
            if available.iter().any(|s| s.id == *id) {
                selected.push(*id);
            } else {
                println!("Bỏ qua id {id}: không có trong danh sách có thể thêm.");
            }
        }
        if selected.is_empty() {
            return Err(anyhow!("Không có sinh viên hợp lệ nào được chọn"));
        }

        let added = surface(
            dean::catalog::enroll_students(&self.api, class_id, &selected).await,
            "Lỗi khi thêm sinh viên",
        )?;
        println!("Đã thêm {added} sinh viên vào lớp.");
        Ok(())
    }

    // ----- lecturers and students -----------------------------------------

    pub async fn users_list(&self, role: Role, page: Page) -> Result<()> {
        println!("{LOADING}");
        let (users, empty_line) = match role {
            Role::Student => (
                dean::people::list_students(&self.api, page).await,
                "Chưa có sinh viên nào",
            ),
            _ => (
                dean::people::list_lecturers(&self.api, page).await,
                "Chưa có giảng viên nào",
            ),
        };
        let users = surface(users, "Không thể tải danh sách người dùng")?;
        if users.is_empty() {
            println!("{empty_line}");
            return Ok(());
        }
        let mut table = Table::new(&["ID", "Mã SV", "Họ tên", "Tên đăng nhập", "Email", "Trạng thái"]);
        for u in &users {
            table.row(vec![
                u.id.to_string(),
                u.student_code.clone().unwrap_or_default(),
                u.full_name.clone(),
                u.username.clone(),
                u.email.clone(),
                if u.is_active { "Hoạt động" } else { "Đã khóa" }.to_string(),
            ]);
        }
        println!("{}", table.render());
        Ok(())
    }

    pub async fn users_create(&self, role: Role, fields: &UserFields) -> Result<()> {
        self.check_department(fields.department_id).await?;
        let form = UserForm::create(role, self.email_domain(role), &self.config.default_password);
        let form = apply_user_fields(form, fields);
        let payload = form.payload().map_err(|e| anyhow!("{e}"))?;
        debug!(username = %payload.username, "Derived credentials for new account");

        let (created, fallback) = match role {
            Role::Student => (
                dean::people::create_student(&self.api, &payload).await,
                "Không thể lưu thông tin sinh viên",
            ),
            _ => (
                dean::people::create_lecturer(&self.api, &payload).await,
                "Không thể lưu thông tin giảng viên",
            ),
        };
        let created = surface(created, fallback)?;
        if role != Role::Student {
            self.lecturers.invalidate(LECTURERS_KEY);
        }
        println!(
            "Đã tạo tài khoản {} ({}) với mật khẩu mặc định.",
            created.username, created.email
        );
        Ok(())
    }

    pub async fn users_update(&self, role: Role, id: i64, fields: &UserFields) -> Result<()> {
        self.check_department(fields.department_id).await?;
        let page = Page::default();
        let users = match role {
            Role::Student => dean::people::list_students(&self.api, page).await,
            _ => dean::people::list_lecturers(&self.api, page).await,
        };
        let users = surface(users, "Không thể tải danh sách người dùng")?;
        let user = users
            .iter()
            .find(|u| u.id == id)
            .with_context(|| format!("Không tìm thấy người dùng với id {id}"))?;

        let form = UserForm::edit(user, role, self.email_domain(role));
        let form = apply_user_fields(form, fields);
        let payload = form.payload().map_err(|e| anyhow!("{e}"))?;

        let (updated, fallback) = match role {
            Role::Student => (
                dean::people::update_student(&self.api, id, &payload).await,
                "Không thể lưu thông tin sinh viên",
            ),
            _ => (
                dean::people::update_lecturer(&self.api, id, &payload).await,
                "Không thể lưu thông tin giảng viên",
            ),
        };
        let updated = surface(updated, fallback)?;
        if role != Role::Student {
            self.lecturers.invalidate(LECTURERS_KEY);
        }
        println!("Đã cập nhật tài khoản {} (id {}).", updated.username, updated.id);
        Ok(())
    }

    pub async fn users_delete(&self, role: Role, id: i64, yes: bool) -> Result<()> {
        if !confirm_delete(yes)? {
            println!("Đã hủy.");
            return Ok(());
        }
        let result = match role {
            Role::Student => dean::people::delete_student(&self.api, id).await,
            _ => dean::people::delete_lecturer(&self.api, id).await,
        };
        match result {
            Ok(()) => {
                if role != Role::Student {
                    self.lecturers.invalidate(LECTURERS_KEY);
                }
                println!("Đã xóa tài khoản (id {id}).");
                Ok(())
            }
            Err(e) => match role {
                Role::Student => Err(anyhow!("Không thể xóa sinh viên này: {}", detail_of(e))),
                _ => Err(anyhow!("Không thể xóa giảng viên này: {}", detail_of(e))),
            },
        }
    }

    pub async fn students_results(&self, student_id: i64) -> Result<()> {
        println!("{LOADING}");
        let results = surface(
            dean::people::academic_results(&self.api, student_id).await,
            "Không thể tải kết quả học tập",
        )?;
        println!(
            "Kết quả học tập của {} ({})",
            results.full_name, results.student_code
        );
        if results.semester_results.is_empty() {
            println!("Chưa có kết quả học kỳ nào.");
        } else {
            let mut table = Table::new(&["Học kỳ", "GPA", "Tín chỉ đăng ký", "Hoàn thành", "Trượt"]);
            for sem in &results.semester_results {
                table.row(vec![
                    sem.semester_name.clone(),
                    format!("{:.2}", sem.gpa),
                    sem.total_credits.to_string(),
                    sem.completed_credits.to_string(),
                    sem.failed_credits.to_string(),
                ]);
            }
            println!("{}", table.render());
        }
        println!(
            "CPA tích lũy: {:.2} — {}/{} tín chỉ hoàn thành, {} tín chỉ trượt",
            results.cumulative_cpa,
            results.total_completed_credits,
            results.total_registered_credits,
            results.total_failed_credits
        );
        Ok(())
    }

    // ----- grades ---------------------------------------------------------

    pub async fn grades_sheet(&self, class_id: i64) -> Result<()> {
        println!("{LOADING}");
        let rows = surface(
            dean::grades::class_grades(&self.api, class_id).await,
            "Không thể tải bảng điểm",
        )?;
        if rows.is_empty() {
            println!("Chưa có sinh viên nào trong lớp.");
            return Ok(());
        }
        let mut table = Table::new(&["Mã SV", "Họ tên", "Giữa kỳ", "Cuối kỳ", "Tổng kết"]);
        for row in &rows {
            let midterm = row.score(GradeType::Midterm);
            let final_score = row.score(GradeType::Final);
            table.row(vec![
                row.student_code.clone(),
                row.full_name.clone(),
                score(midterm),
                score(final_score),
                score(derive::weighted_total(midterm, final_score)),
            ]);
        }
        println!("{}", table.render());
        Ok(())
    }

    pub async fn grades_set(
        &self,
        class_id: i64,
        enrollment_id: i64,
        grade_type: GradeType,
        value: f64,
    ) -> Result<()> {
        validate_score(value).map_err(|e| anyhow!("{e}"))?;
        let rows = surface(
            dean::grades::class_grades(&self.api, class_id).await,
            "Không thể tải bảng điểm",
        )?;
        let row = rows
            .iter()
            .find(|r| r.enrollment_id == enrollment_id)
            .with_context(|| format!("Không tìm thấy sinh viên với mã đăng ký {enrollment_id}"))?;

        surface(
            dean::grades::save_grade(&self.api, row, grade_type, value).await,
            "Không thể lưu điểm",
        )?;

        let midterm = match grade_type {
            GradeType::Midterm => Some(value),
            GradeType::Final => row.score(GradeType::Midterm),
        };
        let final_score = match grade_type {
            GradeType::Final => Some(value),
            GradeType::Midterm => row.score(GradeType::Final),
        };
        println!(
            "Đã lưu điểm cho {}. Tổng kết: {}",
            row.full_name,
            score(derive::weighted_total(midterm, final_score))
        );
        Ok(())
    }

    // ----- academic calendar ----------------------------------------------

    pub async fn years_list(&self) -> Result<()> {
        println!("{LOADING}");
        let years = surface(
            dean::calendar::list_academic_years(&self.api).await,
            "Không thể tải danh sách năm học",
        )?;
        if years.is_empty() {
            println!("Chưa có năm học nào");
            return Ok(());
        }
        let mut table = Table::new(&["ID", "Năm học", "Bắt đầu", "Kết thúc", "Trạng thái"]);
        for y in &years {
            table.row(vec![
                y.id.to_string(),
                y.year.clone(),
                y.start_date.to_string(),
                y.end_date.to_string(),
                if y.is_active { "Hoạt động" } else { "Đã đóng" }.to_string(),
            ]);
        }
        println!("{}", table.render());
        Ok(())
    }

    pub async fn years_create(&self, payload: &AcademicYearPayload) -> Result<()> {
        let created = surface(
            dean::calendar::create_academic_year(&self.api, payload).await,
            "Không thể lưu năm học",
        )?;
        println!("Đã tạo năm học {} (id {}).", created.year, created.id);
        Ok(())
    }

    pub async fn years_update(&self, id: i64, payload: &AcademicYearPayload) -> Result<()> {
        let updated = surface(
            dean::calendar::update_academic_year(&self.api, id, payload).await,
            "Không thể lưu năm học",
        )?;
        println!("Đã cập nhật năm học {} (id {}).", updated.year, updated.id);
        Ok(())
    }

    pub async fn years_delete(&self, id: i64, yes: bool) -> Result<()> {
        if !confirm_delete(yes)? {
            println!("Đã hủy.");
            return Ok(());
        }
        match dean::calendar::delete_academic_year(&self.api, id).await {
            Ok(()) => {
                println!("Đã xóa năm học (id {id}).");
                Ok(())
            }
            Err(e) => Err(anyhow!("Không thể xóa năm học này: {}", detail_of(e))),
        }
    }

    pub async fn semesters_list(&self) -> Result<()> {
        println!("{LOADING}");
        let semesters = surface(
            dean::calendar::list_semesters(&self.api).await,
            "Không thể tải danh sách học kỳ",
        )?;
        if semesters.is_empty() {
            println!("Chưa có học kỳ nào");
            return Ok(());
        }
        let mut table = Table::new(&["ID", "Mã", "Tên học kỳ", "Bắt đầu", "Kết thúc", "Trạng thái"]);
        for s in &semesters {
            table.row(vec![
                s.id.to_string(),
                s.code.clone(),
                s.name.clone(),
                s.start_date.to_string(),
                s.end_date.to_string(),
                if s.is_active { "Hoạt động" } else { "" }.to_string(),
            ]);
        }
        println!("{}", table.render());
        Ok(())
    }

    pub async fn semesters_create(&self, payload: &SemesterPayload) -> Result<()> {
        let created = surface(
            dean::calendar::create_semester(&self.api, payload).await,
            "Không thể lưu học kỳ",
        )?;
        println!("Đã tạo học kỳ {} (id {}).", created.name, created.id);
        Ok(())
    }

    pub async fn semesters_update(&self, id: i64, payload: &SemesterPayload) -> Result<()> {
        let updated = surface(
            dean::calendar::update_semester(&self.api, id, payload).await,
            "Không thể lưu học kỳ",
        )?;
        println!("Đã cập nhật học kỳ {} (id {}).", updated.name, updated.id);
        Ok(())
    }

    pub async fn semesters_delete(&self, id: i64, yes: bool) -> Result<()> {
        if !confirm_delete(yes)? {
            println!("Đã hủy.");
            return Ok(());
        }
        match dean::calendar::delete_semester(&self.api, id).await {
            Ok(()) => {
                println!("Đã xóa học kỳ (id {id}).");
                Ok(())
            }
            Err(e) => Err(anyhow!("Không thể xóa học kỳ này: {}", detail_of(e))),
        }
    }

    pub async fn semesters_activate(&self, id: i64) -> Result<()> {
        surface(
            dean::calendar::activate_semester(&self.api, id).await,
            "Không thể kích hoạt học kỳ",
        )?;
        println!("Đã kích hoạt học kỳ (id {id}). Các học kỳ khác đã bị vô hiệu hóa.");
        Ok(())
    }

    // ----- tuition --------------------------------------------------------

    pub async fn tuition_settings(&self, price_per_credit: Option<i64>) -> Result<()> {
        match price_per_credit {
            None => {
                let settings = surface(
                    dean::tuition::settings(&self.api).await,
                    "Không thể tải cài đặt học phí",
                )?;
                println!("Đơn giá mỗi tín chỉ: {} VND", settings.price_per_credit);
            }
            Some(price) => {
                if price < 0 {
                    return Err(anyhow!("Đơn giá không được âm"));
                }
                let settings = surface(
                    dean::tuition::set_price_per_credit(&self.api, price).await,
                    "Không thể lưu cài đặt học phí",
                )?;
                println!("Đã cập nhật đơn giá: {} VND/tín chỉ", settings.price_per_credit);
            }
        }
        Ok(())
    }

    pub async fn tuition_list(&self) -> Result<()> {
        println!("{LOADING}");
        let tuitions = surface(
            dean::tuition::list_tuitions(&self.api).await,
            "Không thể tải dữ liệu học phí",
        )?;
        if tuitions.is_empty() {
            println!("Chưa có dữ liệu học phí.");
            return Ok(());
        }
        let mut table = Table::new(&["ID", "Mã SV", "Sinh viên", "Học kỳ", "Tổng", "Đã đóng", "Trạng thái"]);
        for t in &tuitions {
            table.row(vec![
                t.id.to_string(),
                t.student_code.clone().unwrap_or_default(),
                t.student_name.clone().unwrap_or_default(),
                t.semester.clone(),
                t.total_amount.to_string(),
                t.paid_amount.to_string(),
                t.status.label().to_string(),
            ]);
        }
        println!("{}", table.render());
        Ok(())
    }

    pub async fn tuition_update(&self, id: i64, paid_amount: Option<i64>) -> Result<()> {
        if paid_amount.is_none() {
            return Err(anyhow!("Chưa có thay đổi nào được chỉ định"));
        }
        if let Some(paid) = paid_amount {
            if paid < 0 {
                return Err(anyhow!("Số tiền đã đóng không được âm"));
            }
            // Overpayment is not rejected anywhere in the system; warn
            // and submit, the server derives the resulting status.
            let tuitions = surface(
                dean::tuition::list_tuitions(&self.api).await,
                "Không thể tải dữ liệu học phí",
            )?;
            if let Some(record) = tuitions.iter().find(|t| t.id == id) {
                if let Some(warning) = tuition_overpayment_warning(record.total_amount, paid) {
                    println!("Cảnh báo: {warning}");
                }
            }
        }
        let update = TuitionUpdate {
            paid_amount,
            status: None,
        };
        let updated = surface(
            dean::tuition::update_tuition(&self.api, id, &update).await,
            "Không thể cập nhật học phí",
        )?;
        println!(
            "Đã cập nhật học phí (id {}): {}/{} — {}",
            updated.id,
            updated.paid_amount,
            updated.total_amount,
            updated.status.label()
        );
        Ok(())
    }

    // ----- reports --------------------------------------------------------

    pub async fn reports_list(&self, status: Option<ReportStatus>) -> Result<()> {
        println!("{LOADING}");
        let reports = surface(
            dean::reports::list_reports(&self.api, status).await,
            "Không thể tải danh sách báo cáo",
        )?;
        if reports.is_empty() {
            println!("Chưa có báo cáo nào");
            return Ok(());
        }
        let mut table = Table::new(&["ID", "Sinh viên", "Tiêu đề", "Loại", "Trạng thái", "Ngày gửi"]);
        for r in &reports {
            table.row(vec![
                r.id.to_string(),
                r.student_name.clone(),
                r.title.clone(),
                r.report_type.clone(),
                r.status.label().to_string(),
                r.created_at.format("%Y-%m-%d").to_string(),
            ]);
        }
        println!("{}", table.render());
        Ok(())
    }

    pub async fn reports_show(&self, id: i64) -> Result<()> {
        let report = surface(
            dean::reports::get_report(&self.api, id).await,
            "Không thể tải báo cáo",
        )?;
        println!("Báo cáo #{} — {}", report.id, report.title);
        println!(
            "Sinh viên: {} ({})",
            report.student_name,
            report.student_code.clone().unwrap_or_default()
        );
        println!("Loại: {}", report.report_type);
        println!("Trạng thái: {}", report.status.label());
        println!("Nội dung: {}", report.description);
        println!("Phản hồi: {}", dash(report.dean_response.clone()));
        if let Some(resolved_at) = report.resolved_at {
            println!(
                "Đã xử lý lúc {} bởi {}",
                resolved_at.format("%Y-%m-%d %H:%M"),
                report.resolved_by_name.clone().unwrap_or_default()
            );
        }
        Ok(())
    }

    pub async fn reports_update(
        &self,
        id: i64,
        status: Option<ReportStatus>,
        response: Option<String>,
    ) -> Result<()> {
        if status.is_none() && response.is_none() {
            return Err(anyhow!("Chưa có thay đổi nào được chỉ định"));
        }
        let update = ReportUpdate {
            status,
            dean_response: response,
        };
        let updated = surface(
            dean::reports::update_report(&self.api, id, &update).await,
            "Không thể cập nhật báo cáo",
        )?;
        println!("Đã cập nhật báo cáo #{} — {}", updated.id, updated.status.label());
        Ok(())
    }

    pub async fn reports_stats(&self) -> Result<()> {
        let stats = surface(
            dean::reports::report_stats(&self.api).await,
            "Không thể tải thống kê báo cáo",
        )?;
        println!("Tổng số báo cáo: {}", stats.total);
        println!("  Chờ xử lý:     {}", stats.pending);
        println!("  Đang xử lý:    {}", stats.processing);
        println!("  Đã giải quyết: {}", stats.resolved);
        println!("  Từ chối:       {}", stats.rejected);
        Ok(())
    }

    // ----- statistics -----------------------------------------------------

    pub async fn stats_overview(&self) -> Result<()> {
        let stats = surface(
            dean::stats::statistics(&self.api).await,
            "Không thể tải thống kê",
        )?;
        println!("Sinh viên:  {}", stats.total_students);
        println!("Giảng viên: {}", stats.total_lecturers);
        println!("Học phần:   {}", stats.total_courses);
        println!("Lớp học:    {}", stats.total_classes);
        println!("Khoa:       {}", stats.total_departments);
        Ok(())
    }

    pub async fn stats_charts(&self) -> Result<()> {
        let charts = surface(
            dean::stats::statistics_charts(&self.api).await,
            "Không thể tải dữ liệu biểu đồ",
        )?;
        println!("{}", serde_json::to_string_pretty(&charts)?);
        Ok(())
    }

    pub async fn audit_logs(&self) -> Result<()> {
        println!("{LOADING}");
        let logs = surface(
            dean::stats::audit_logs(&self.api).await,
            "Không thể tải nhật ký hệ thống",
        )?;
        if logs.is_empty() {
            println!("Chưa có nhật ký nào");
            return Ok(());
        }
        let mut table = Table::new(&["Thời gian", "Người dùng", "Hành động", "Chi tiết"]);
        for log in &logs {
            table.row(vec![
                log.timestamp.format("%Y-%m-%d %H:%M").to_string(),
                log.user.clone(),
                log.action.clone(),
                log.details.clone().unwrap_or_default(),
            ]);
        }
        println!("{}", table.render());
        Ok(())
    }

    // ----- shared helpers -------------------------------------------------

    fn email_domain(&self, role: Role) -> &str {
        match role {
            Role::Student => &self.config.student_email_domain,
            _ => &self.config.staff_email_domain,
        }
    }

    /// Courses list, cached for the duration of the TTL.
    async fn courses(&self) -> Result<Vec<Course>, ApiError> {
        if let Some(cached) = self.courses.get(COURSES_KEY) {
            return Ok(cached);
        }
        let list = dean::catalog::list_courses(&self.api).await?;
        self.courses.insert(COURSES_KEY, list.clone());
        Ok(list)
    }

    /// Lecturers list, cached for the duration of the TTL.
    async fn lecturers_all(&self) -> Result<Vec<User>, ApiError> {
        if let Some(cached) = self.lecturers.get(LECTURERS_KEY) {
            return Ok(cached);
        }
        let list = dean::people::list_lecturers(&self.api, Page::default()).await?;
        self.lecturers.insert(LECTURERS_KEY, list.clone());
        Ok(list)
    }

    /// Validates a department selection against the (cached) list, the
    /// way the form's select box constrains it.
    async fn check_department(&self, department_id: Option<i64>) -> Result<()> {
        let Some(department_id) = department_id else {
            return Ok(());
        };
        let departments = match self.departments.get(DEPARTMENTS_KEY) {
            Some(cached) => cached,
            None => {
                let list = surface(
                    dean::catalog::list_departments(&self.api).await,
                    "Không thể tải danh sách khoa",
                )?;
                self.departments.insert(DEPARTMENTS_KEY, list.clone());
                list
            }
        };
        if departments.iter().any(|d| d.id == department_id) {
            Ok(())
        } else {
            Err(anyhow!("Không tìm thấy khoa với id {department_id}"))
        }
    }
}

fn print_class(class: &Class) {
    println!("Lớp {} (id {})", class.code, class.id);
    if let Some(course) = &class.course {
        println!("Học phần: {} — {} ({} tín chỉ)", course.code, course.name, course.credits);
    }
    println!("Học kỳ: {}", class.semester);
    println!("Sĩ số: {}/{}", class.enrolled_count, class.max_students);
    if let (Some(start), Some(end)) = (class.start_week, class.end_week) {
        println!(
            "Lịch học: tuần {start}-{end}, thứ {}, tiết {}-{}, phòng {}",
            dash(class.day_of_week),
            dash(class.start_period),
            dash(class.end_period),
            class.room.clone().unwrap_or_else(|| "—".to_string())
        );
    }
}

/// Builds the class form from CLI fields, resolving the course id to
/// its code so derivation can run.
fn apply_class_fields(
    mut form: ClassForm,
    fields: &ClassFields,
    courses: &[Course],
) -> Result<ClassForm> {
    if let Some(course_id) = fields.course_id {
        let course = courses
            .iter()
            .find(|c| c.id == course_id)
            .with_context(|| format!("Không tìm thấy học phần với id {course_id}"))?;
        form = form.apply(ClassFormEvent::SetCourse {
            id: course.id,
            code: course.code.clone(),
        });
    }
    if let Some(lecturer_id) = fields.lecturer_id {
        form = form.apply(ClassFormEvent::SetLecturer(lecturer_id));
    }
    if let Some(semester) = &fields.semester {
        form = form.apply(ClassFormEvent::SetSemester(semester.clone()));
    }
    if let Some(max_students) = fields.max_students {
        form = form.apply(ClassFormEvent::SetMaxStudents(max_students));
    }
    if fields.start_week.is_some() || fields.end_week.is_some() {
        let start = fields.start_week.or(form.start_week);
        let end = fields.end_week.or(form.end_week);
        form = form.apply(ClassFormEvent::SetWeeks { start, end });
    }
    if let Some(day) = fields.day_of_week {
        form = form.apply(ClassFormEvent::SetDayOfWeek(Some(day)));
    }
    if fields.start_period.is_some() || fields.end_period.is_some() {
        let start = fields.start_period.or(form.start_period);
        let end = fields.end_period.or(form.end_period);
        form = form.apply(ClassFormEvent::SetPeriods { start, end });
    }
    if let Some(room) = &fields.room {
        form = form.apply(ClassFormEvent::SetRoom(Some(room.clone())));
    }
    // Explicit --code wins over the derived value.
    if let Some(code) = &fields.code {
        form = form.apply(ClassFormEvent::SetCode(code.clone()));
    }
    Ok(form)
}

/// Feeds CLI fields through the user form reducer; overrides land
/// after the deriving events so they win.
fn apply_user_fields(mut form: UserForm, fields: &UserFields) -> UserForm {
    if let Some(code) = &fields.student_code {
        form = form.apply(UserFormEvent::SetStudentCode(code.clone()));
    }
    if let Some(name) = &fields.full_name {
        form = form.apply(UserFormEvent::SetFullName(name.clone()));
    }
    if let Some(phone) = &fields.phone_number {
        form = form.apply(UserFormEvent::SetPhoneNumber(phone.clone()));
    }
    if let Some(department_id) = fields.department_id {
        form = form.apply(UserFormEvent::SetDepartment(Some(department_id)));
    }
    if let Some(password) = &fields.password {
        form = form.apply(UserFormEvent::SetPassword(password.clone()));
    }
    if let Some(username) = &fields.username {
        form = form.apply(UserFormEvent::SetUsername(username.clone()));
    }
    if let Some(email) = &fields.email {
        form = form.apply(UserFormEvent::SetEmail(email.clone()));
    }
    form
}

/// Maps an API failure to the message shown inline on the screen: the
/// collaborator's own detail when it sent one, a localized fallback
/// otherwise.
fn surface<T>(result: Result<T, ApiError>, fallback: &str) -> Result<T> {
    result.map_err(|e| match &e {
        ApiError::Unauthorized => anyhow!("{e}"),
        ApiError::Api { detail, .. } if !detail.is_empty() => anyhow!("{}", detail.clone()),
        _ => anyhow!("{fallback} ({e})"),
    })
}

/// The message body used for delete failures.
fn detail_of(error: ApiError) -> String {
    match error {
        ApiError::Api { detail, .. } if !detail.is_empty() => detail,
        other => other.to_string(),
    }
}

/// Mandatory delete confirmation; `--yes` counts as explicit consent.
fn confirm_delete(yes: bool) -> io::Result<bool> {
    if yes {
        return Ok(true);
    }
    print!("Bạn có chắc chắn muốn xóa? [y/N] ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let answer = line.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}

fn prompt_line(prompt: &str) -> io::Result<String> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
