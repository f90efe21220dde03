//! Signed HTTP client for the call-signaling service
//!
//! Wraps reqwest::Client with Hawk signing and exact-status assertions.
//! Every helper takes the one status code the scenario expects; anything else
//! is a contract violation and fails the iteration with the body attached.

use anyhow::{bail, Context, Result};
use reqwest::StatusCode;

use crate::auth::{hawk, HawkCredentials};

const CONTENT_TYPE_JSON: &str = "application/json";

/// HTTP client bound to one service instance and (after registration) one
/// Hawk session.
pub struct LoopClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Option<HawkCredentials>,
}

impl LoopClient {
    pub fn new(server_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: server_url.trim_end_matches('/').to_string(),
            credentials: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Install the session credentials derived at registration.
    pub fn set_credentials(&mut self, credentials: HawkCredentials) {
        self.credentials = Some(credentials);
    }

    pub fn credentials(&self) -> Option<&HawkCredentials> {
        self.credentials.as_ref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn sign(&self, method: &str, url: &str, content_type: &str, body: &[u8]) -> Result<String> {
        let credentials = self
            .credentials
            .as_ref()
            .context("not registered: no hawk session credentials")?;
        hawk::sign_request(credentials, method, url, content_type, body)
    }

    /// Unauthenticated JSON POST.
    pub async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
        expected: StatusCode,
    ) -> Result<reqwest::Response> {
        let url = self.url(path);
        tracing::debug!("POST {}", url);
        let resp = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("POST {} failed", url))?;
        check_status(resp, expected, &url).await
    }

    /// Hawk-signed JSON POST. Signs the exact body bytes that go on the wire.
    pub async fn post_json_signed(
        &self,
        path: &str,
        body: &serde_json::Value,
        expected: StatusCode,
    ) -> Result<reqwest::Response> {
        let url = self.url(path);
        let bytes = serde_json::to_vec(body).context("failed to encode request body")?;
        let authorization = self.sign("POST", &url, CONTENT_TYPE_JSON, &bytes)?;
        tracing::debug!("POST {} (signed)", url);
        let resp = self
            .http
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE_JSON)
            .body(bytes)
            .send()
            .await
            .with_context(|| format!("POST {} failed", url))?;
        check_status(resp, expected, &url).await
    }

    /// Hawk-signed GET.
    pub async fn get_signed(&self, path: &str, expected: StatusCode) -> Result<reqwest::Response> {
        let url = self.url(path);
        let authorization = self.sign("GET", &url, "", b"")?;
        tracing::debug!("GET {} (signed)", url);
        let resp = self
            .http
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?;
        check_status(resp, expected, &url).await
    }

    /// Unauthenticated DELETE.
    pub async fn delete(&self, path: &str, expected: StatusCode) -> Result<reqwest::Response> {
        let url = self.url(path);
        tracing::debug!("DELETE {}", url);
        let resp = self
            .http
            .delete(&url)
            .send()
            .await
            .with_context(|| format!("DELETE {} failed", url))?;
        check_status(resp, expected, &url).await
    }

    /// Hawk-signed DELETE.
    pub async fn delete_signed(
        &self,
        path: &str,
        expected: StatusCode,
    ) -> Result<reqwest::Response> {
        let url = self.url(path);
        let authorization = self.sign("DELETE", &url, "", b"")?;
        tracing::debug!("DELETE {} (signed)", url);
        let resp = self
            .http
            .delete(&url)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .send()
            .await
            .with_context(|| format!("DELETE {} failed", url))?;
        check_status(resp, expected, &url).await
    }
}

/// Assert the exact expected status code, attaching the body on mismatch.
async fn check_status(
    resp: reqwest::Response,
    expected: StatusCode,
    url: &str,
) -> Result<reqwest::Response> {
    let status = resp.status();
    if status != expected {
        let body = resp.text().await.unwrap_or_default();
        bail!(
            "{} returned HTTP {} (expected {}): {}",
            url,
            status.as_u16(),
            expected.as_u16(),
            body
        );
    }
    Ok(resp)
}
