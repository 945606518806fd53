use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use deanreg::api::{ApiClient, CredentialStore, FileCredentials};
use deanreg::cli::{
    CalendarCommands, ClassCommands, Cli, Commands, CourseCommands, DepartmentCommands,
    GradeCommands, OtpCommands, ReportCommands, SemesterCommands, StatsCommands, StudentCommands,
    TuitionCommands, UserCommands, YearCommands,
};
use deanreg::config::AppConfig;
use deanreg::console::Console;
use deanreg::models::Role;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    if let Err(e) = run(cli).await {
        eprintln!("⚠️  {e}");
        std::process::exit(1);
    }
}

fn init_tracing(log_level: Option<&str>) {
    let filter = match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(api_url) = cli.api_url {
        config.base_url = api_url;
    }
    if let Some(session) = cli.session {
        config.session_file = session;
    }

    let store: Arc<dyn CredentialStore> = Arc::new(FileCredentials::open(&config.session_file));
    let api = ApiClient::with_timeout(
        &config.base_url,
        store,
        config.request_timeout_secs.map(Duration::from_secs),
    )?
    .on_unauthorized(Arc::new(|| {
        eprintln!("Phiên đăng nhập đã hết hạn. Vui lòng đăng nhập lại: deanreg login");
    }));
    let console = Console::new(api, config);

    match cli.command {
        Commands::Login { username, password } => console.login(&username, password).await,
        Commands::Otp(command) => match command {
            OtpCommands::Verify { code } => console.otp_verify(&code).await,
            OtpCommands::Resend => console.otp_resend().await,
            OtpCommands::Abandon => console.otp_abandon(),
        },
        Commands::Logout => console.logout(),
        Commands::Whoami => console.whoami(),
        Commands::ChangePassword { old, new } => console.change_password(&old, &new).await,

        Commands::Departments(command) => match command {
            DepartmentCommands::List => console.departments_list().await,
            DepartmentCommands::Create { name, description } => {
                console.departments_create(&name, description).await
            }
            DepartmentCommands::Update {
                id,
                name,
                description,
            } => console.departments_update(id, &name, description).await,
            DepartmentCommands::Delete { id, yes } => console.departments_delete(id, yes).await,
        },

        Commands::Courses(command) => match command {
            CourseCommands::List => console.courses_list().await,
            CourseCommands::Create { code, name, credits } => {
                console.courses_create(&code, &name, credits).await
            }
            CourseCommands::Update {
                id,
                code,
                name,
                credits,
            } => console.courses_update(id, &code, &name, credits).await,
            CourseCommands::Delete { id, yes } => console.courses_delete(id, yes).await,
        },

        Commands::Classes(command) => match command {
            ClassCommands::List { page } => console.classes_list(page.into()).await,
            ClassCommands::Show { id } => console.classes_show(id).await,
            ClassCommands::Create { fields } => console.classes_create(&fields).await,
            ClassCommands::Update { id, fields } => console.classes_update(id, &fields).await,
            ClassCommands::Delete { id, yes } => console.classes_delete(id, yes).await,
            ClassCommands::Enroll { class_id, students } => {
                console.classes_enroll(class_id, &students).await
            }
        },

        Commands::Lecturers(command) => match command {
            UserCommands::List { page } => console.users_list(Role::Lecturer, page.into()).await,
            UserCommands::Create { fields } => console.users_create(Role::Lecturer, &fields).await,
            UserCommands::Update { id, fields } => {
                console.users_update(Role::Lecturer, id, &fields).await
            }
            UserCommands::Delete { id, yes } => {
                console.users_delete(Role::Lecturer, id, yes).await
            }
        },

        Commands::Students(command) => match command {
            StudentCommands::List { page } => console.users_list(Role::Student, page.into()).await,
            StudentCommands::Create { fields } => {
                console.users_create(Role::Student, &fields).await
            }
            StudentCommands::Update { id, fields } => {
                console.users_update(Role::Student, id, &fields).await
            }
            StudentCommands::Delete { id, yes } => {
                console.users_delete(Role::Student, id, yes).await
            }
            StudentCommands::Results { id } => console.students_results(id).await,
        },

        Commands::Grades(command) => match command {
            GradeCommands::Sheet { class_id } => console.grades_sheet(class_id).await,
            GradeCommands::Set {
                class_id,
                enrollment_id,
                kind,
                score,
            } => {
                console
                    .grades_set(class_id, enrollment_id, kind.into(), score)
                    .await
            }
        },

        Commands::Calendar(command) => match command {
            CalendarCommands::Years(command) => match command {
                YearCommands::List => console.years_list().await,
                YearCommands::Create {
                    year,
                    start_date,
                    end_date,
                    active,
                } => {
                    console
                        .years_create(&deanreg::models::AcademicYearPayload {
                            year,
                            start_date,
                            end_date,
                            is_active: active,
                        })
                        .await
                }
                YearCommands::Update {
                    id,
                    year,
                    start_date,
                    end_date,
                    active,
                } => {
                    console
                        .years_update(
                            id,
                            &deanreg::models::AcademicYearPayload {
                                year,
                                start_date,
                                end_date,
                                is_active: active,
                            },
                        )
                        .await
                }
                YearCommands::Delete { id, yes } => console.years_delete(id, yes).await,
            },
            CalendarCommands::Semesters(command) => match command {
                SemesterCommands::List => console.semesters_list().await,
                SemesterCommands::Create {
                    code,
                    name,
                    academic_year_id,
                    semester_number,
                    start_date,
                    end_date,
                } => {
                    console
                        .semesters_create(&deanreg::models::SemesterPayload {
                            code,
                            name,
                            academic_year_id,
                            semester_number,
                            start_date,
                            end_date,
                            is_active: false,
                        })
                        .await
                }
                SemesterCommands::Update {
                    id,
                    code,
                    name,
                    academic_year_id,
                    semester_number,
                    start_date,
                    end_date,
                } => {
                    console
                        .semesters_update(
                            id,
                            &deanreg::models::SemesterPayload {
                                code,
                                name,
                                academic_year_id,
                                semester_number,
                                start_date,
                                end_date,
                                is_active: false,
                            },
                        )
                        .await
                }
                SemesterCommands::Delete { id, yes } => console.semesters_delete(id, yes).await,
                SemesterCommands::Activate { id } => console.semesters_activate(id).await,
            },
        },

        Commands::Tuition(command) => match command {
            TuitionCommands::Settings { price_per_credit } => {
                console.tuition_settings(price_per_credit).await
            }
            TuitionCommands::List => console.tuition_list().await,
            TuitionCommands::Update { id, paid_amount } => {
                console.tuition_update(id, paid_amount).await
            }
        },

        Commands::Reports(command) => match command {
            ReportCommands::List { status } => console.reports_list(status.map(Into::into)).await,
            ReportCommands::Show { id } => console.reports_show(id).await,
            ReportCommands::Update {
                id,
                status,
                response,
            } => {
                console
                    .reports_update(id, status.map(Into::into), response)
                    .await
            }
            ReportCommands::Stats => console.reports_stats().await,
        },

        Commands::Stats(command) => match command {
            StatsCommands::Overview => console.stats_overview().await,
            StatsCommands::Charts => console.stats_charts().await,
        },

        Commands::AuditLogs => console.audit_logs().await,
    }
}
