//! Authenticated client for the new shop's admin API.
//!
//! All endpoints share one response envelope: `status_code == 0` means
//! success, anything else is an application-level failure carrying a
//! human-readable `msg`. Transport failures are retried under the
//! configured [`RetryPolicy`]; application-level failures are returned to
//! the caller untouched.

use std::path::Path;
use std::time::Duration;

use reqwest::multipart;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::retry::{with_retry, RetryPolicy};

/// Request timeout for every API call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Upload scene the new API files goods images under.
const UPLOAD_SCENE: &str = "goods";

/// Response envelope shared by every admin API endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse {
    /// Zero on success; any other value is an application failure.
    #[serde(default)]
    pub status_code: i64,
    /// Human-readable message, meaningful when `status_code != 0`.
    #[serde(default)]
    pub msg: String,
    /// Endpoint-specific payload. Shape varies per endpoint, so it stays
    /// a raw JSON value and callers normalize it.
    #[serde(default)]
    pub data: Value,
}

impl ApiResponse {
    /// True when the envelope signals success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status_code == 0
    }
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Admin API client holding the session token.
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
    http: reqwest::Client,
    retry: RetryPolicy,
}

impl ApiClient {
    /// Creates a client for `base_url` with the given retry policy.
    #[must_use]
    pub fn new(base_url: impl Into<String>, retry: RetryPolicy) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            base_url,
            token: None,
            http,
            retry,
        }
    }

    /// Base URL this client talks to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Logs in and stores the bearer token for subsequent calls.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Authentication`] when the API rejects the
    /// credentials or the response carries no token.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<()> {
        let request = LoginRequest { username, password };
        let resp = self.post("/login", &request).await?;
        if !resp.is_success() {
            return Err(Error::Authentication(resp.msg));
        }
        let token = resp
            .data
            .get("token")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Authentication("login response carried no token".to_string()))?;
        self.token = Some(token.to_string());
        Ok(())
    }

    /// POSTs a JSON payload and decodes the response envelope.
    ///
    /// # Errors
    ///
    /// Returns an error when every transport attempt fails; a decoded
    /// envelope with a non-zero status is returned as `Ok`.
    pub async fn post<T: Serialize>(&self, endpoint: &str, payload: &T) -> Result<ApiResponse> {
        let url = self.endpoint_url(endpoint);
        let body = serde_json::to_value(payload)?;
        with_retry(&self.retry, endpoint, || {
            let req = self.authorize(self.http.post(&url)).json(&body);
            async move { Ok(req.send().await?.json::<ApiResponse>().await?) }
        })
        .await
    }

    /// GETs an endpoint (query string included) and decodes the envelope.
    ///
    /// # Errors
    ///
    /// Returns an error when every transport attempt fails.
    pub async fn get(&self, endpoint: &str) -> Result<ApiResponse> {
        let url = self.endpoint_url(endpoint);
        with_retry(&self.retry, endpoint, || {
            let req = self.authorize(self.http.get(&url));
            async move { Ok(req.send().await?.json::<ApiResponse>().await?) }
        })
        .await
    }

    /// Uploads a local file as multipart form data under the goods scene.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or every transport
    /// attempt fails.
    pub async fn upload_file(&self, path: &Path) -> Result<ApiResponse> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        let url = self.endpoint_url("/upload");
        with_retry(&self.retry, "/upload", || {
            let form = multipart::Form::new()
                .part(
                    "file",
                    multipart::Part::bytes(bytes.clone()).file_name(file_name.clone()),
                )
                .text("scene", UPLOAD_SCENE);
            let req = self.authorize(self.http.post(&url)).multipart(form);
            async move { Ok(req.send().await?.json::<ApiResponse>().await?) }
        })
        .await
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
