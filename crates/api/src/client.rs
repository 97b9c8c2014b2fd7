//! Authenticated request pipeline
//!
//! Wraps outbound HTTP calls with token attachment and single-retry-on-401
//! semantics: a rejected token gets exactly one forced refresh and one
//! retry, after which the session is terminated. The retry is an explicit
//! budget-bounded loop, never recursion.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::auth::AccessTokenProvider;
use crate::errors::ApiError;

/// Configuration for the API client.
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL without trailing slash (e.g. "https://api.example.com")
    pub base_url: String,

    /// Transport-level timeout; a timeout is a generic failure, not a 401
    pub timeout: Duration,

    /// How many 401-triggered refresh-and-retry cycles a single request may
    /// spend. One is the intended production value.
    pub retry_budget: u32,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout: Duration::from_secs(30),
            retry_budget: 1,
        }
    }
}

impl ApiClientConfig {
    /// Base URL from `REPORTMAX_API_BASE_URL`, defaults otherwise.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(base_url) = std::env::var("REPORTMAX_API_BASE_URL") {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }
        config
    }
}

/// Per-request options supplied by the caller.
///
/// Caller headers are applied first; `Authorization` and `Content-Type` are
/// always set by the pipeline and win over anything supplied here.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub body: Option<serde_json::Value>,
    pub headers: HeaderMap,
}

impl RequestOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a JSON body.
    pub fn with_json<B: Serialize>(mut self, body: &B) -> Result<Self, ApiError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }
}

/// Standard `{success, message?, data}` envelope the backend wraps every
/// payload in.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,

    #[serde(default)]
    pub message: Option<String>,

    pub data: T,
}

/// HTTP client for the ReportMax backend with automatic authentication.
pub struct ApiClient {
    http: Client,
    auth: Arc<dyn AccessTokenProvider>,
    config: ApiClientConfig,
}

impl ApiClient {
    pub fn new(config: ApiClientConfig, auth: Arc<dyn AccessTokenProvider>) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self { http, auth, config })
    }

    /// Execute an authenticated request and parse the JSON response.
    ///
    /// Fails fast with [`ApiError::NotAuthenticated`] when no credential is
    /// available, so unauthenticated requests never leak onto the network.
    /// A 401 response spends one unit of retry budget on a forced refresh;
    /// when the budget is gone the session is terminated and the call fails
    /// with [`ApiError::SessionExpired`].
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let mut budget = self.config.retry_budget;
        let mut token = self.auth.access_token().await?.ok_or(ApiError::NotAuthenticated)?;
        let url = format!("{}{}", self.config.base_url, path);

        loop {
            debug!(%method, path, "API request");

            let mut headers = options.headers.clone();
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
            // The pipeline owns this header; drop anything the caller set
            headers.remove(header::AUTHORIZATION);

            let mut request =
                self.http.request(method.clone(), &url).headers(headers).bearer_auth(&token);
            if let Some(body) = &options.body {
                request = request.json(body);
            }

            let response = request.send().await?;
            let status = response.status();

            if status == StatusCode::UNAUTHORIZED {
                if budget == 0 {
                    warn!(path, "Still unauthorized after retry, ending session");
                    self.auth.end_session().await?;
                    return Err(ApiError::SessionExpired);
                }
                budget -= 1;

                // The server just proved the token invalid; skip the expiry
                // fast path and refresh directly.
                match self.auth.refresh_after_rejection().await? {
                    Some(fresh) => {
                        debug!(path, "Retrying with refreshed token");
                        token = fresh;
                        continue;
                    }
                    // Refresh failed terminally; storage is already cleared
                    // and listeners were notified exactly once.
                    None => return Err(ApiError::SessionExpired),
                }
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(ApiError::Request { status: status.as_u16(), body });
            }

            return Ok(response.json::<T>().await?);
        }
    }

    /// GET returning the raw JSON payload.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::GET, path, RequestOptions::new()).await
    }

    /// POST a JSON body, returning the raw JSON payload.
    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let options = RequestOptions::new().with_json(body)?;
        self.request(Method::POST, path, options).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::DELETE, path, RequestOptions::new()).await
    }

    /// GET and unwrap the standard response envelope.
    pub async fn get_data<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let envelope: ApiEnvelope<T> = self.get(path).await?;
        Ok(envelope.data)
    }

    /// POST and unwrap the standard response envelope.
    pub async fn post_data<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let envelope: ApiEnvelope<T> = self.post(path, body).await?;
        Ok(envelope.data)
    }

    #[must_use]
    pub fn config(&self) -> &ApiClientConfig {
        &self.config
    }
}
