//! Call-flow driver: the HTTP choreography that produces the inputs the
//! WebSocket progress simulation needs.
//!
//! Each step asserts one exact status code and fails the whole iteration on
//! any mismatch; there are no retries.

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::json;

use super::client::LoopClient;
use crate::auth::HawkCredentials;
use crate::models::{CallData, CallUrlResponse, PendingCall, PendingCallList};

/// Protocol version tag for the pending-call listing.
const CALLS_VERSION: u32 = 200;

/// Register this client and derive the Hawk session from the response header.
pub async fn register(client: &mut LoopClient, simple_push_url: &str) -> Result<HawkCredentials> {
    let resp = client
        .post_json(
            "/registration",
            &json!({ "simple_push_url": simple_push_url }),
            StatusCode::OK,
        )
        .await
        .context("registration failed")?;

    let token = resp
        .headers()
        .get("hawk-session-token")
        .context("registration response is missing the hawk-session-token header")?
        .to_str()
        .context("hawk-session-token header is not valid UTF-8")?
        .to_string();

    let credentials = HawkCredentials::from_session_token(&token)?;
    client.set_credentials(credentials.clone());
    tracing::info!("registered, hawk session established");
    Ok(credentials)
}

/// Create a call invitation; returns the opaque call token taken from the
/// last path segment of the returned URL.
pub async fn generate_call_url(client: &LoopClient, caller_id: &str) -> Result<String> {
    let resp = client
        .post_json_signed("/calls", &json!({ "callerId": caller_id }), StatusCode::OK)
        .await
        .context("call creation failed")?;

    let body: CallUrlResponse = resp
        .json()
        .await
        .context("call creation response is not valid JSON")?;
    let token = body.token()?;
    tracing::info!(%token, "generated call url");
    Ok(token)
}

/// Simulate an unauthenticated caller hitting a generated call token.
///
/// Returns the progress URL, the caller's websocket token and the call id.
pub async fn initiate_call(client: &LoopClient, token: &str) -> Result<CallData> {
    let resp = client
        .post_json(
            &format!("/calls/{}", token),
            &json!({ "callType": "audio-video" }),
            StatusCode::OK,
        )
        .await
        .context("call initiation failed")?;

    let data: CallData = resp
        .json()
        .await
        .context("call initiation response is not valid JSON")?;
    tracing::info!(call_id = %data.call_id, "initiated call");
    Ok(data)
}

/// Authenticated poll for outstanding invitations; the callee's websocket
/// token comes from here. Idempotent while no call state changes.
pub async fn list_pending_calls(client: &LoopClient) -> Result<Vec<PendingCall>> {
    let resp = client
        .get_signed(&format!("/calls?version={}", CALLS_VERSION), StatusCode::OK)
        .await
        .context("listing pending calls failed")?;

    let list: PendingCallList = resp
        .json()
        .await
        .context("pending-call listing is not valid JSON")?;
    tracing::info!(count = list.calls.len(), "listed pending calls");
    Ok(list.calls)
}

/// Revoke a call-url token. No authentication required.
pub async fn revoke_call_url(client: &LoopClient, token: &str) -> Result<()> {
    client
        .delete(&format!("/call-url/{}", token), StatusCode::NO_CONTENT)
        .await
        .context("call-url revocation failed")?;
    tracing::info!(%token, "revoked call url");
    Ok(())
}

/// Fetch the state of one call, asserting the status the scenario expects
/// (200 for live calls, 404 after rejection).
pub async fn call_status(
    client: &LoopClient,
    call_id: &str,
    expected: StatusCode,
) -> Result<()> {
    client
        .get_signed(&format!("/calls/id/{}", call_id), expected)
        .await
        .context("call status fetch failed")?;
    Ok(())
}

/// Reject (discard) one pending call.
pub async fn delete_call(client: &LoopClient, call_id: &str) -> Result<()> {
    client
        .delete_signed(&format!("/calls/id/{}", call_id), StatusCode::NO_CONTENT)
        .await
        .context("call rejection failed")?;
    tracing::info!(%call_id, "rejected call");
    Ok(())
}
