//! Configuration for the console.
//!
//! Loaded from an optional JSON file, with every field defaulted so a
//! bare invocation works against a local backend. CLI flags and
//! environment variables override the file (handled by the CLI layer).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the LMS backend.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// E-mail domain for staff (lecturer) accounts.
    #[serde(default = "default_staff_email_domain")]
    pub staff_email_domain: String,

    /// E-mail domain for student accounts.
    #[serde(default = "default_student_email_domain")]
    pub student_email_domain: String,

    /// Where the session (token + pending OTP challenge) is persisted.
    #[serde(default = "default_session_file")]
    pub session_file: PathBuf,

    /// Initial password assigned to newly created accounts.
    #[serde(default = "default_password")]
    pub default_password: String,

    /// Overall request timeout in seconds. Unset keeps the HTTP stack
    /// defaults.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl AppConfig {
    /// Loads configuration from `path`, or the defaults when `path` is
    /// `None`. A named-but-missing file is an error; relying on
    /// defaults silently is only acceptable when nothing was named.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            None => Ok(Self::default()),
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config file {}", path.display()))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("failed to parse config file {}", path.display()))
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            staff_email_domain: default_staff_email_domain(),
            student_email_domain: default_student_email_domain(),
            session_file: default_session_file(),
            default_password: default_password(),
            request_timeout_secs: None,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_staff_email_domain() -> String {
    "hust.edu.vn".to_string()
}

fn default_student_email_domain() -> String {
    "student.university.edu.vn".to_string()
}

fn default_session_file() -> PathBuf {
    PathBuf::from(".deanreg/session.json")
}

fn default_password() -> String {
    "12345678".to_string()
}
