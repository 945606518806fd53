//! Error types for the API client.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors surfaced by [`crate::api::ApiClient`] calls.
///
/// Only the 401 policy is centralized (token cleared, hook fired);
/// every other failure propagates to the caller unchanged, carrying the
/// collaborator's `detail` message where one was provided.
#[derive(Debug, Error, Clone)]
pub enum ApiError {
    /// The collaborator rejected the request as unauthenticated. The
    /// stored token has already been cleared by the time this is seen.
    #[error("Phiên đăng nhập đã hết hạn hoặc không hợp lệ")]
    Unauthorized,

    /// Any non-401 error status, with the backend's `detail` body when
    /// it sent one. Validation, conflict and referential-integrity
    /// failures all arrive here.
    #[error("{detail}")]
    Api { status: u16, detail: String },

    /// Request never produced a response (DNS, refused, reset).
    #[error("Network error: {message}")]
    Network { message: String },

    /// Response body did not match the expected shape.
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// The configured base URL is not a valid URL.
    #[error("Invalid base URL: {message}")]
    InvalidBaseUrl { message: String },
}

impl ApiError {
    /// True when the operator must log in again.
    pub fn needs_reauth(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }

    /// True for 4xx responses other than 401 (caller-side problems that
    /// should be rendered inline, not treated as outages).
    pub fn is_client_error(&self) -> bool {
        matches!(self, ApiError::Api { status, .. } if (400..500).contains(status))
    }

    /// Builds the error for a non-success status and its raw body.
    ///
    /// FastAPI-style backends wrap messages as `{"detail": "..."}`;
    /// anything else falls back to the raw text or the canonical
    /// status reason.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        if status == StatusCode::UNAUTHORIZED {
            return ApiError::Unauthorized;
        }
        let detail = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("detail").and_then(|d| d.as_str().map(str::to_owned)))
            .unwrap_or_else(|| {
                let text = body.trim();
                if text.is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                } else {
                    text.to_string()
                }
            });
        ApiError::Api {
            status: status.as_u16(),
            detail,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode {
                message: err.to_string(),
            }
        } else {
            ApiError::Network {
                message: err.to_string(),
            }
        }
    }
}

impl From<url::ParseError> for ApiError {
    fn from(err: url::ParseError) -> Self {
        ApiError::InvalidBaseUrl {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_extracted_from_body() {
        let err = ApiError::from_status(
            StatusCode::BAD_REQUEST,
            r#"{"detail":"Không thể xóa khoa đang có học phần"}"#,
        );
        match &err {
            ApiError::Api { status, detail } => {
                assert_eq!(*status, 400);
                assert_eq!(detail, "Không thể xóa khoa đang có học phần");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.is_client_error());
        assert!(!err.needs_reauth());
    }

    #[test]
    fn test_unauthorized_short_circuits() {
        let err = ApiError::from_status(StatusCode::UNAUTHORIZED, r#"{"detail":"x"}"#);
        assert!(matches!(err, ApiError::Unauthorized));
        assert!(err.needs_reauth());
    }

    #[test]
    fn test_fallback_to_canonical_reason() {
        let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "");
        match err {
            ApiError::Api { status, detail } => {
                assert_eq!(status, 500);
                assert_eq!(detail, "Internal Server Error");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
