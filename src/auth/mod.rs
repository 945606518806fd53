//! Authentication flow: login, OTP second factor, logout.
//!
//! Session states: Anonymous -> Authenticating -> Authenticated, back
//! to Anonymous on logout or any 401. Dean accounts add an OTP
//! sub-flow: a login that answers with a challenge parks the session in
//! `Challenged` until the code is verified, resent (after a cooldown)
//! or abandoned. The challenge is persisted through the credential
//! store so an interrupted login survives a process restart.
//!
//! The resend cooldown is a client-side throttle only; the backend
//! rate-limits on its own authority.

use chrono::{Duration, Utc};
use thiserror::Error;

use crate::api::{ApiClient, ApiError, OtpChallenge};
use crate::models::{LoginOutcome, MessageResponse, TokenResponse};

/// Seconds an operator must wait between OTP resends.
pub const OTP_RESEND_COOLDOWN_SECS: i64 = 60;

/// Where the session currently stands, derived from stored state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// No token, no pending challenge.
    Anonymous,
    /// Login succeeded at the password step; waiting on the OTP code.
    Challenged { username: String },
    /// A bearer token is stored.
    Authenticated,
}

/// Outcome of the password step.
#[derive(Debug, Clone)]
pub enum LoginResult {
    /// Token received and stored.
    Authenticated { role: String },
    /// Second factor required; a challenge was issued and persisted.
    OtpRequired {
        message: String,
        email_hint: Option<String>,
    },
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Resend requested before the cooldown elapsed.
    #[error("Vui lòng chờ {remaining} giây trước khi gửi lại OTP")]
    CooldownActive { remaining: i64 },

    /// OTP operation without a pending challenge (expired or abandoned).
    #[error("Phiên xác thực đã hết hạn. Vui lòng thử lại từ đầu.")]
    NoChallenge,
}

/// Drives the authentication endpoints over an [`ApiClient`].
pub struct AuthFlow<'a> {
    api: &'a ApiClient,
}

impl<'a> AuthFlow<'a> {
    pub fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    /// Current session state, derived from the credential store.
    pub fn state(&self) -> AuthState {
        let store = self.api.store();
        if store.token().is_some() {
            AuthState::Authenticated
        } else if let Some(challenge) = store.challenge() {
            AuthState::Challenged {
                username: challenge.username,
            }
        } else {
            AuthState::Anonymous
        }
    }

    /// Password step. Form-encoded, per the collaborator contract.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError> {
        let outcome: LoginOutcome = self
            .api
            .post_form("/auth/login", &[("username", username), ("password", password)])
            .await?;

        match outcome {
            LoginOutcome::Token(token) => {
                self.accept_token(&token);
                Ok(LoginResult::Authenticated { role: token.role })
            }
            LoginOutcome::OtpChallenge(challenge) => {
                let now = Utc::now();
                self.api.store().set_challenge(OtpChallenge {
                    username: username.to_string(),
                    email_hint: challenge.email_hint.clone(),
                    issued_at: now,
                    cooldown_until: now + Duration::seconds(OTP_RESEND_COOLDOWN_SECS),
                });
                Ok(LoginResult::OtpRequired {
                    message: challenge.message,
                    email_hint: challenge.email_hint,
                })
            }
        }
    }

    /// OTP step for the pending challenge. Clears the challenge and
    /// stores the token on success; a wrong code leaves the challenge
    /// in place for another attempt.
    pub async fn verify_otp(&self, otp: &str) -> Result<String, AuthError> {
        let challenge = self.api.store().challenge().ok_or(AuthError::NoChallenge)?;
        let token: TokenResponse = self
            .api
            .post(
                "/auth/verify-otp",
                &serde_json::json!({
                    "username": challenge.username,
                    "otp": otp,
                }),
            )
            .await?;
        self.accept_token(&token);
        Ok(token.role)
    }

    /// Requests a fresh code for the pending challenge.
    ///
    /// Refused while the cooldown is running; on success the cooldown
    /// restarts from now.
    pub async fn resend_otp(&self) -> Result<String, AuthError> {
        let challenge = self.api.store().challenge().ok_or(AuthError::NoChallenge)?;
        let now = Utc::now();
        if let Some(remaining) = challenge.cooldown_remaining(now) {
            return Err(AuthError::CooldownActive { remaining });
        }

        let response: MessageResponse = self
            .api
            .post_form("/auth/resend-otp", &[("username", challenge.username.as_str())])
            .await?;

        self.api.store().set_challenge(OtpChallenge {
            issued_at: now,
            cooldown_until: now + Duration::seconds(OTP_RESEND_COOLDOWN_SECS),
            ..challenge
        });
        Ok(response.message)
    }

    /// Drops the pending challenge and returns to Anonymous.
    pub fn abandon(&self) {
        self.api.store().clear_challenge();
    }

    /// Clears the whole session.
    pub fn logout(&self) {
        let store = self.api.store();
        store.clear_token();
        store.clear_challenge();
    }

    /// Changes the current operator's password (authenticated).
    pub async fn change_password(&self, old: &str, new: &str) -> Result<String, AuthError> {
        let response: MessageResponse = self
            .api
            .post_form(
                "/auth/change-password",
                &[("old_password", old), ("new_password", new)],
            )
            .await?;
        Ok(response.message)
    }

    fn accept_token(&self, token: &TokenResponse) {
        let store = self.api.store();
        store.set_token(&token.access_token);
        store.clear_challenge();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{CredentialStore, MemoryCredentials};
    use std::sync::Arc;

    fn client_with_store() -> ApiClient {
        let store: Arc<dyn CredentialStore> = Arc::new(MemoryCredentials::new());
        ApiClient::new("http://localhost:8000", store).unwrap()
    }

    #[test]
    fn test_state_derivation() {
        let api = client_with_store();
        let flow = AuthFlow::new(&api);
        assert_eq!(flow.state(), AuthState::Anonymous);

        let now = Utc::now();
        api.store().set_challenge(OtpChallenge {
            username: "dean".into(),
            email_hint: None,
            issued_at: now,
            cooldown_until: now + Duration::seconds(OTP_RESEND_COOLDOWN_SECS),
        });
        assert_eq!(
            flow.state(),
            AuthState::Challenged {
                username: "dean".into()
            }
        );

        api.store().set_token("tok");
        assert_eq!(flow.state(), AuthState::Authenticated);

        flow.logout();
        assert_eq!(flow.state(), AuthState::Anonymous);
    }

    #[tokio::test]
    async fn test_resend_refused_during_cooldown() {
        let api = client_with_store();
        let flow = AuthFlow::new(&api);

        let now = Utc::now();
        api.store().set_challenge(OtpChallenge {
            username: "dean".into(),
            email_hint: None,
            issued_at: now,
            cooldown_until: now + Duration::seconds(OTP_RESEND_COOLDOWN_SECS),
        });

        match flow.resend_otp().await {
            Err(AuthError::CooldownActive { remaining }) => {
                assert!(remaining > 0 && remaining <= OTP_RESEND_COOLDOWN_SECS);
            }
            other => panic!("expected cooldown refusal, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_otp_operations_require_challenge() {
        let api = client_with_store();
        let flow = AuthFlow::new(&api);
        assert!(matches!(
            flow.verify_otp("123456").await,
            Err(AuthError::NoChallenge)
        ));
        assert!(matches!(
            flow.resend_otp().await,
            Err(AuthError::NoChallenge)
        ));
    }

    #[test]
    fn test_abandon_clears_challenge_only() {
        let api = client_with_store();
        let flow = AuthFlow::new(&api);
        let now = Utc::now();
        api.store().set_token("tok");
        api.store().set_challenge(OtpChallenge {
            username: "dean".into(),
            email_hint: None,
            issued_at: now,
            cooldown_until: now,
        });
        flow.abandon();
        assert!(api.store().challenge().is_none());
        assert!(api.store().token().is_some());
    }
}
