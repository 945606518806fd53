//! Command-line interface for the dean console.
//!
//! One subcommand tree per entity screen; global flags select the
//! backend, the config file and the session file.

use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::models::{GradeType, ReportStatus};

#[derive(Parser, Debug)]
#[command(name = "deanreg")]
#[command(about = "Console for a university LMS dean administration API", long_about = None)]
pub struct Cli {
    /// Path to a JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Base URL of the LMS backend
    #[arg(long, env = "DEANREG_API_URL")]
    pub api_url: Option<String>,

    /// Session file holding the bearer token and pending OTP challenge
    #[arg(long, env = "DEANREG_SESSION_FILE")]
    pub session: Option<PathBuf>,

    /// Override log level (e.g. debug, deanreg=trace)
    #[arg(long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in with username and password
    Login {
        #[arg(long)]
        username: String,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// OTP second-factor commands
    #[command(subcommand)]
    Otp(OtpCommands),

    /// Clear the stored session
    Logout,

    /// Show the current session state
    Whoami,

    /// Change the current operator's password
    ChangePassword {
        #[arg(long)]
        old: String,
        #[arg(long)]
        new: String,
    },

    /// Department management
    #[command(subcommand)]
    Departments(DepartmentCommands),

    /// Course catalog management
    #[command(subcommand)]
    Courses(CourseCommands),

    /// Class management and enrollment
    #[command(subcommand)]
    Classes(ClassCommands),

    /// Lecturer account management
    #[command(subcommand)]
    Lecturers(UserCommands),

    /// Student account management
    #[command(subcommand)]
    Students(StudentCommands),

    /// Grade sheets and grade entry
    #[command(subcommand)]
    Grades(GradeCommands),

    /// Academic years and semesters
    #[command(subcommand)]
    Calendar(CalendarCommands),

    /// Tuition settings and records
    #[command(subcommand)]
    Tuition(TuitionCommands),

    /// Student reports
    #[command(subcommand)]
    Reports(ReportCommands),

    /// Dashboard statistics
    #[command(subcommand)]
    Stats(StatsCommands),

    /// View the audit trail
    AuditLogs,
}

#[derive(Subcommand, Debug)]
pub enum OtpCommands {
    /// Submit the 6-digit code
    Verify { code: String },
    /// Request a fresh code (60 s cooldown)
    Resend,
    /// Abandon the pending challenge
    Abandon,
}

#[derive(Subcommand, Debug)]
pub enum DepartmentCommands {
    List,
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    Update {
        id: i64,
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    Delete {
        id: i64,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum CourseCommands {
    List,
    Create {
        #[arg(long)]
        code: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        credits: i32,
    },
    Update {
        id: i64,
        #[arg(long)]
        code: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        credits: i32,
    },
    Delete {
        id: i64,
        #[arg(long)]
        yes: bool,
    },
}

/// Class form fields shared by create and update. The class code is
/// derived from the course and semester on create; `--code` overrides.
#[derive(Args, Debug, Default)]
pub struct ClassFields {
    #[arg(long)]
    pub code: Option<String>,
    #[arg(long)]
    pub course_id: Option<i64>,
    #[arg(long)]
    pub lecturer_id: Option<i64>,
    /// Semester in the form YYYY.N, e.g. 2023.1
    #[arg(long)]
    pub semester: Option<String>,
    #[arg(long)]
    pub max_students: Option<i32>,
    #[arg(long)]
    pub start_week: Option<i32>,
    #[arg(long)]
    pub end_week: Option<i32>,
    /// 2=Monday .. 8=Sunday
    #[arg(long)]
    pub day_of_week: Option<i32>,
    #[arg(long)]
    pub start_period: Option<i32>,
    #[arg(long)]
    pub end_period: Option<i32>,
    #[arg(long)]
    pub room: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ClassCommands {
    List {
        #[command(flatten)]
        page: PageArgs,
    },
    /// Class details and roster
    Show { id: i64 },
    Create {
        #[command(flatten)]
        fields: ClassFields,
    },
    Update {
        id: i64,
        #[command(flatten)]
        fields: ClassFields,
    },
    Delete {
        id: i64,
        #[arg(long)]
        yes: bool,
    },
    /// Bulk-add students; without --students, lists who can be added
    Enroll {
        class_id: i64,
        /// Comma-separated student ids
        #[arg(long, value_delimiter = ',')]
        students: Vec<i64>,
    },
}

/// User form fields shared by create and update. Username and e-mail
/// derive from the name (and student code) on create and freeze on
/// edit; explicit flags override.
#[derive(Args, Debug, Default)]
pub struct UserFields {
    #[arg(long)]
    pub full_name: Option<String>,
    #[arg(long)]
    pub phone_number: Option<String>,
    #[arg(long)]
    pub student_code: Option<String>,
    #[arg(long)]
    pub department_id: Option<i64>,
    #[arg(long)]
    pub username: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub password: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    List {
        #[command(flatten)]
        page: PageArgs,
    },
    Create {
        #[command(flatten)]
        fields: UserFields,
    },
    Update {
        id: i64,
        #[command(flatten)]
        fields: UserFields,
    },
    Delete {
        id: i64,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum StudentCommands {
    List {
        #[command(flatten)]
        page: PageArgs,
    },
    Create {
        #[command(flatten)]
        fields: UserFields,
    },
    Update {
        id: i64,
        #[command(flatten)]
        fields: UserFields,
    },
    Delete {
        id: i64,
        #[arg(long)]
        yes: bool,
    },
    /// Per-semester GPA and cumulative CPA for one student
    Results { id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum GradeCommands {
    /// Grade sheet for one class
    Sheet { class_id: i64 },
    /// Record or replace one grade component
    Set {
        class_id: i64,
        enrollment_id: i64,
        #[arg(value_enum)]
        kind: GradeKindArg,
        score: f64,
    },
}

#[derive(Subcommand, Debug)]
pub enum CalendarCommands {
    #[command(subcommand)]
    Years(YearCommands),
    #[command(subcommand)]
    Semesters(SemesterCommands),
}

#[derive(Subcommand, Debug)]
pub enum YearCommands {
    List,
    Create {
        /// Label such as 2023-2024
        #[arg(long)]
        year: String,
        #[arg(long)]
        start_date: NaiveDate,
        #[arg(long)]
        end_date: NaiveDate,
        /// true/false; new years default to active
        #[arg(long, action = ArgAction::Set, default_value_t = true)]
        active: bool,
    },
    Update {
        id: i64,
        #[arg(long)]
        year: String,
        #[arg(long)]
        start_date: NaiveDate,
        #[arg(long)]
        end_date: NaiveDate,
        /// true/false; new years default to active
        #[arg(long, action = ArgAction::Set, default_value_t = true)]
        active: bool,
    },
    Delete {
        id: i64,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum SemesterCommands {
    List,
    Create {
        /// Code such as 2023.1
        #[arg(long)]
        code: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        academic_year_id: i64,
        #[arg(long)]
        semester_number: i32,
        #[arg(long)]
        start_date: NaiveDate,
        #[arg(long)]
        end_date: NaiveDate,
    },
    Update {
        id: i64,
        #[arg(long)]
        code: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        academic_year_id: i64,
        #[arg(long)]
        semester_number: i32,
        #[arg(long)]
        start_date: NaiveDate,
        #[arg(long)]
        end_date: NaiveDate,
    },
    Delete {
        id: i64,
        #[arg(long)]
        yes: bool,
    },
    /// Activate one semester; the server deactivates the others
    Activate { id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum TuitionCommands {
    /// Show or set the global price per credit
    Settings {
        #[arg(long)]
        price_per_credit: Option<i64>,
    },
    List,
    Update {
        id: i64,
        #[arg(long)]
        paid_amount: Option<i64>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ReportCommands {
    List {
        #[arg(long, value_enum)]
        status: Option<ReportStatusArg>,
    },
    Show { id: i64 },
    Update {
        id: i64,
        #[arg(long, value_enum)]
        status: Option<ReportStatusArg>,
        #[arg(long)]
        response: Option<String>,
    },
    Stats,
}

#[derive(Subcommand, Debug)]
pub enum StatsCommands {
    /// Headline counters
    Overview,
    /// Chart payloads, printed as JSON
    Charts,
}

/// Optional skip/limit window for paginated list endpoints.
#[derive(Args, Debug, Default, Clone, Copy)]
pub struct PageArgs {
    #[arg(long)]
    pub skip: Option<u32>,
    #[arg(long)]
    pub limit: Option<u32>,
}

impl From<PageArgs> for crate::dean::Page {
    fn from(args: PageArgs) -> Self {
        Self {
            skip: args.skip,
            limit: args.limit,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum GradeKindArg {
    Midterm,
    Final,
}

impl From<GradeKindArg> for GradeType {
    fn from(kind: GradeKindArg) -> Self {
        match kind {
            GradeKindArg::Midterm => GradeType::Midterm,
            GradeKindArg::Final => GradeType::Final,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ReportStatusArg {
    Pending,
    Processing,
    Resolved,
    Rejected,
}

impl From<ReportStatusArg> for ReportStatus {
    fn from(status: ReportStatusArg) -> Self {
        match status {
            ReportStatusArg::Pending => ReportStatus::Pending,
            ReportStatusArg::Processing => ReportStatus::Processing,
            ReportStatusArg::Resolved => ReportStatus::Resolved,
            ReportStatusArg::Rejected => ReportStatus::Rejected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enroll_parses_comma_separated_ids() {
        let cli = Cli::parse_from([
            "deanreg", "classes", "enroll", "12", "--students", "1,2,3",
        ]);
        match cli.command {
            Commands::Classes(ClassCommands::Enroll { class_id, students }) => {
                assert_eq!(class_id, 12);
                assert_eq!(students, vec![1, 2, 3]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_class_create_fields() {
        let cli = Cli::parse_from([
            "deanreg",
            "classes",
            "create",
            "--course-id",
            "5",
            "--lecturer-id",
            "2",
            "--semester",
            "2024.2",
        ]);
        match cli.command {
            Commands::Classes(ClassCommands::Create { fields }) => {
                assert_eq!(fields.course_id, Some(5));
                assert_eq!(fields.lecturer_id, Some(2));
                assert_eq!(fields.semester.as_deref(), Some("2024.2"));
                assert!(fields.code.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_date_flags_parse() {
        let cli = Cli::parse_from([
            "deanreg",
            "calendar",
            "years",
            "create",
            "--year",
            "2023-2024",
            "--start-date",
            "2023-09-01",
            "--end-date",
            "2024-06-30",
        ]);
        match cli.command {
            Commands::Calendar(CalendarCommands::Years(YearCommands::Create {
                start_date, ..
            })) => {
                assert_eq!(start_date, NaiveDate::from_ymd_opt(2023, 9, 1).unwrap());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
