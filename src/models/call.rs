//! Call-related response bodies.

use anyhow::{Context, Result};
use serde::Deserialize;

/// Body of `POST /calls` (call-URL generation).
///
/// Older deployments spell the field `call_url`; both are accepted.
#[derive(Debug, Deserialize)]
pub struct CallUrlResponse {
    #[serde(rename = "callUrl")]
    pub call_url: Option<String>,
    #[serde(rename = "call_url")]
    pub call_url_legacy: Option<String>,
    #[serde(rename = "callToken")]
    pub call_token: Option<String>,
    #[serde(rename = "expiresAt")]
    pub expires_at: Option<u64>,
}

impl CallUrlResponse {
    /// The opaque call token: last path segment of whichever URL field is set.
    pub fn token(&self) -> Result<String> {
        let url = self
            .call_url
            .as_deref()
            .or(self.call_url_legacy.as_deref())
            .context("response has neither callUrl nor call_url")?;
        let token = url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .context("callUrl has no path segments")?;
        Ok(token.to_string())
    }
}

/// Body of `POST /calls/{token}` (call initiation, unauthenticated caller).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallData {
    /// WebSocket endpoint for the call-progress protocol.
    #[serde(rename = "progressURL")]
    pub progress_url: String,
    /// The caller leg's auth token for the progress channel.
    pub websocket_token: String,
    pub call_id: String,
    /// Media-backend session info, unused by the progress simulation.
    pub session_id: Option<String>,
    pub session_token: Option<String>,
    pub api_key: Option<String>,
}

/// One entry of `GET /calls?version=N`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingCall {
    /// The callee leg's auth token for the progress channel.
    pub websocket_token: String,
    pub call_id: String,
    #[serde(rename = "progressURL")]
    pub progress_url: Option<String>,
    pub caller_id: Option<String>,
    pub call_type: Option<String>,
}

/// Body of `GET /calls?version=N`.
#[derive(Debug, Deserialize)]
pub struct PendingCallList {
    pub calls: Vec<PendingCall>,
}
