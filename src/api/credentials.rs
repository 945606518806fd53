//! Credential storage for the API client.
//!
//! The only state the client persists across sessions: the bearer token
//! and, while a second-factor login is in flight, the OTP challenge.
//! The store is an explicit, swappable interface so tests can run on an
//! in-memory double while the console uses a session file.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;

/// A pending OTP challenge, issued by login and cleared on completion
/// or abandonment. Survives a process restart via the session file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpChallenge {
    /// Account the challenge was issued for.
    pub username: String,
    /// Masked address the code was mailed to (display only).
    pub email_hint: Option<String>,
    /// When the current code was issued.
    pub issued_at: DateTime<Utc>,
    /// Resends are refused until this instant.
    pub cooldown_until: DateTime<Utc>,
}

impl OtpChallenge {
    /// Whole seconds left on the resend cooldown, if any.
    pub fn cooldown_remaining(&self, now: DateTime<Utc>) -> Option<i64> {
        let remaining = (self.cooldown_until - now).num_seconds();
        (remaining > 0).then_some(remaining)
    }
}

/// Session state persisted by a credential store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SessionData {
    token: Option<String>,
    challenge: Option<OtpChallenge>,
}

/// Durable storage for the bearer token and pending OTP challenge.
///
/// Implementations must never fail an API operation: storage I/O
/// problems are logged and swallowed.
pub trait CredentialStore: Send + Sync {
    fn token(&self) -> Option<String>;
    fn set_token(&self, token: &str);
    fn clear_token(&self);

    fn challenge(&self) -> Option<OtpChallenge>;
    fn set_challenge(&self, challenge: OtpChallenge);
    fn clear_challenge(&self);
}

/// Volatile store for tests and one-shot scripted use.
#[derive(Default)]
pub struct MemoryCredentials {
    data: Mutex<SessionData>,
}

impl MemoryCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-seeded with a token.
    pub fn with_token(token: &str) -> Self {
        let store = Self::new();
        store.set_token(token);
        store
    }
}

impl CredentialStore for MemoryCredentials {
    fn token(&self) -> Option<String> {
        self.data.lock().unwrap().token.clone()
    }

    fn set_token(&self, token: &str) {
        self.data.lock().unwrap().token = Some(token.to_string());
    }

    fn clear_token(&self) {
        self.data.lock().unwrap().token = None;
    }

    fn challenge(&self) -> Option<OtpChallenge> {
        self.data.lock().unwrap().challenge.clone()
    }

    fn set_challenge(&self, challenge: OtpChallenge) {
        self.data.lock().unwrap().challenge = Some(challenge);
    }

    fn clear_challenge(&self) {
        self.data.lock().unwrap().challenge = None;
    }
}

/// JSON session file, durable across console invocations.
pub struct FileCredentials {
    path: PathBuf,
    data: Mutex<SessionData>,
}

impl FileCredentials {
    /// Opens (or lazily creates) the session file at `path`.
    ///
    /// An unreadable or corrupt file starts an empty session rather
    /// than failing: worst case the operator logs in again.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = Self::load(&path).unwrap_or_default();
        Self {
            path,
            data: Mutex::new(data),
        }
    }

    fn load(path: &Path) -> Option<SessionData> {
        let raw = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(data) => Some(data),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable session file");
                None
            }
        }
    }

    fn save(&self, data: &SessionData) {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    warn!(path = %self.path.display(), error = %e, "Could not create session directory");
                    return;
                }
            }
        }
        let serialized = match serde_json::to_string_pretty(data) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "Could not serialize session state");
                return;
            }
        };
        if let Err(e) = std::fs::write(&self.path, serialized) {
            warn!(path = %self.path.display(), error = %e, "Could not write session file");
        }
    }

    fn mutate(&self, f: impl FnOnce(&mut SessionData)) {
        let mut data = self.data.lock().unwrap();
        f(&mut data);
        self.save(&data);
    }
}

impl CredentialStore for FileCredentials {
    fn token(&self) -> Option<String> {
        self.data.lock().unwrap().token.clone()
    }

    fn set_token(&self, token: &str) {
        self.mutate(|d| d.token = Some(token.to_string()));
    }

    fn clear_token(&self) {
        self.mutate(|d| d.token = None);
    }

    fn challenge(&self) -> Option<OtpChallenge> {
        self.data.lock().unwrap().challenge.clone()
    }

    fn set_challenge(&self, challenge: OtpChallenge) {
        self.mutate(|d| d.challenge = Some(challenge));
    }

    fn clear_challenge(&self) {
        self.mutate(|d| d.challenge = None);
    }
}

/// Short fingerprint of a token for log lines.
///
/// Tokens never appear in logs; the first 8 hex characters of the
/// SHA-256 digest are enough to correlate sessions.
pub fn token_fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    digest[..4].iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryCredentials::new();
        assert!(store.token().is_none());
        store.set_token("abc123");
        assert_eq!(store.token().as_deref(), Some("abc123"));
        store.clear_token();
        assert!(store.token().is_none());
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = std::env::temp_dir().join("deanreg-test-session");
        let path = dir.join("session.json");
        let _ = std::fs::remove_file(&path);

        let store = FileCredentials::open(&path);
        store.set_token("tok");
        store.set_challenge(OtpChallenge {
            username: "dean".into(),
            email_hint: Some("dea***@hust.edu.vn".into()),
            issued_at: Utc::now(),
            cooldown_until: Utc::now() + Duration::seconds(60),
        });

        // A second store on the same path sees the persisted state.
        let reopened = FileCredentials::open(&path);
        assert_eq!(reopened.token().as_deref(), Some("tok"));
        assert_eq!(reopened.challenge().unwrap().username, "dean");

        reopened.clear_challenge();
        let third = FileCredentials::open(&path);
        assert!(third.challenge().is_none());
        assert_eq!(third.token().as_deref(), Some("tok"));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_corrupt_session_file_starts_empty() {
        let path = std::env::temp_dir().join("deanreg-test-corrupt.json");
        std::fs::write(&path, "not json").unwrap();
        let store = FileCredentials::open(&path);
        assert!(store.token().is_none());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_cooldown_remaining() {
        let now = Utc::now();
        let challenge = OtpChallenge {
            username: "dean".into(),
            email_hint: None,
            issued_at: now,
            cooldown_until: now + Duration::seconds(60),
        };
        assert!(challenge.cooldown_remaining(now).unwrap() > 0);
        assert!(challenge
            .cooldown_remaining(now + Duration::seconds(61))
            .is_none());
    }

    #[test]
    fn test_token_fingerprint_is_stable_and_short() {
        let fp = token_fingerprint("secret-token");
        assert_eq!(fp.len(), 8);
        assert_eq!(fp, token_fingerprint("secret-token"));
        assert_ne!(fp, token_fingerprint("other-token"));
    }
}
