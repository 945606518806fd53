//! HTTP client for the dean administration API.
//!
//! One explicit client instance is constructed at startup with injected
//! configuration (base URL, credential store, unauthorized hook) and
//! passed by reference to every screen. Responsibilities:
//!
//! 1. Attach `Authorization: Bearer <token>` when a token is stored.
//! 2. Unconditionally attach the tunnel-bypass header the deployment's
//!    ngrok front requires.
//! 3. On any 401, clear the stored token once and fire the hook; every
//!    other error status propagates to the caller unchanged.
//!
//! No retries, no request cancellation, no timeouts beyond the HTTP
//! stack defaults unless configured.

pub mod cache;
pub mod credentials;
pub mod error;

pub use cache::ListCache;
pub use credentials::{
    token_fingerprint, CredentialStore, FileCredentials, MemoryCredentials, OtpChallenge,
};
pub use error::ApiError;

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

/// Header that makes the ngrok tunnel in front of the backend skip its
/// browser interstitial.
pub const TUNNEL_BYPASS_HEADER: &str = "ngrok-skip-browser-warning";

/// Callback fired when a 401 invalidates the session, so the hosting
/// surface can send the operator back to login.
pub type UnauthorizedHook = Arc<dyn Fn() + Send + Sync>;

/// Client for the dean administration API.
pub struct ApiClient {
    http: Client,
    base_url: Url,
    store: Arc<dyn CredentialStore>,
    on_unauthorized: Option<UnauthorizedHook>,
}

impl ApiClient {
    /// Creates a client for `base_url` backed by `store`.
    pub fn new(base_url: &str, store: Arc<dyn CredentialStore>) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, store, None)
    }

    /// Creates a client with an optional overall request timeout.
    ///
    /// `None` keeps the HTTP stack defaults, matching the observed
    /// deployment.
    pub fn with_timeout(
        base_url: &str,
        store: Arc<dyn CredentialStore>,
        timeout: Option<Duration>,
    ) -> Result<Self, ApiError> {
        // A trailing slash makes Url::join treat the last path segment
        // as a directory.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base_url = Url::parse(&normalized)?;

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|e| ApiError::Network {
            message: format!("Failed to build HTTP client: {e}"),
        })?;

        Ok(Self {
            http,
            base_url,
            store,
            on_unauthorized: None,
        })
    }

    /// Installs the hook fired when a 401 invalidates the session.
    pub fn on_unauthorized(mut self, hook: UnauthorizedHook) -> Self {
        self.on_unauthorized = Some(hook);
        self
    }

    /// The credential store backing this client.
    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// GET a JSON resource.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send(Method::GET, path, Payload::None).await?;
        Ok(response.json().await?)
    }

    /// GET a JSON resource with query parameters.
    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let query = query
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        let response = self.send(Method::GET, path, Payload::Query(query)).await?;
        Ok(response.json().await?)
    }

    /// POST a JSON body, returning the parsed response.
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = to_json(body)?;
        let response = self.send(Method::POST, path, Payload::Json(body)).await?;
        Ok(response.json().await?)
    }

    /// POST a form-encoded body (the auth endpoints speak
    /// `application/x-www-form-urlencoded`).
    pub async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let form = form
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let response = self.send(Method::POST, path, Payload::Form(form)).await?;
        Ok(response.json().await?)
    }

    /// PUT a JSON body, returning the parsed response.
    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = to_json(body)?;
        let response = self.send(Method::PUT, path, Payload::Json(body)).await?;
        Ok(response.json().await?)
    }

    /// DELETE a resource, discarding any response body.
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send(Method::DELETE, path, Payload::None).await?;
        Ok(())
    }

    /// POST with a JSON body, discarding any response body.
    pub async fn post_unit<B: Serialize>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        let body = to_json(body)?;
        self.send(Method::POST, path, Payload::Json(body)).await?;
        Ok(())
    }

    /// POST with no body, discarding any response body (e.g. semester
    /// activation).
    pub async fn post_empty(&self, path: &str) -> Result<(), ApiError> {
        self.send(Method::POST, path, Payload::None).await?;
        Ok(())
    }

    /// Issues one request and applies the global response policy.
    async fn send(&self, method: Method, path: &str, payload: Payload) -> Result<Response, ApiError> {
        let url = self.endpoint(path)?;
        let correlation_id = generate_correlation_id();

        let mut request = self
            .http
            .request(method.clone(), url)
            .header(TUNNEL_BYPASS_HEADER, "true");

        if let Some(token) = self.store.token() {
            debug!(
                correlation_id = %correlation_id,
                session = %token_fingerprint(&token),
                method = %method,
                path = %path,
                "Sending authenticated request"
            );
            request = request.bearer_auth(&token);
        } else {
            debug!(
                correlation_id = %correlation_id,
                method = %method,
                path = %path,
                "Sending anonymous request"
            );
        }

        request = match payload {
            Payload::None => request,
            Payload::Json(body) => request.json(&body),
            Payload::Form(pairs) => request.form(&pairs),
            Payload::Query(pairs) => request.query(&pairs),
        };

        let response = request.send().await?;
        let status = response.status();
        debug!(
            correlation_id = %correlation_id,
            status = status.as_u16(),
            path = %path,
            "Received response"
        );

        if status == reqwest::StatusCode::UNAUTHORIZED {
            self.handle_unauthorized(path);
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &body));
        }
        Ok(response)
    }

    /// Clears the session exactly once per stored token and notifies
    /// the hosting surface. Subsequent 401s on the already-cleared
    /// session stay silent so the redirect cannot loop.
    fn handle_unauthorized(&self, path: &str) {
        if self.store.token().is_none() {
            return;
        }
        warn!(path = %path, "Token rejected with 401, clearing session");
        self.store.clear_token();
        if let Some(hook) = &self.on_unauthorized {
            hook();
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }
}

/// Request payload variants the verb methods produce.
enum Payload {
    None,
    Json(serde_json::Value),
    Form(Vec<(String, String)>),
    Query(Vec<(String, String)>),
}

fn to_json<B: Serialize>(body: &B) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(body).map_err(|e| ApiError::Decode {
        message: e.to_string(),
    })
}

/// Generates a unique correlation ID for request tracing.
fn generate_correlation_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros();
    let random: u32 = rand::thread_rng().gen();
    format!("{:x}-{:08x}", timestamp & 0xFFFFFFFF, random)
}
