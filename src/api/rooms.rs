//! Room driver: create/join/refresh/leave/delete against the rooms API.

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::json;

use super::client::LoopClient;
use crate::models::{CreateRoomRequest, RoomCreated};

/// Create a room; returns its opaque token.
pub async fn create_room(client: &LoopClient, request: &CreateRoomRequest) -> Result<String> {
    let body = serde_json::to_value(request).context("failed to encode room request")?;
    let resp = client
        .post_json_signed("/rooms", &body, StatusCode::CREATED)
        .await
        .context("room creation failed")?;

    let created: RoomCreated = resp
        .json()
        .await
        .context("room creation response is not valid JSON")?;
    tracing::info!(room_token = %created.room_token, "created room");
    Ok(created.room_token)
}

/// Join a room as a new participant.
pub async fn join_room(client: &LoopClient, room_token: &str, display_name: &str) -> Result<()> {
    client
        .post_json(
            &format!("/rooms/{}", room_token),
            &json!({
                "action": "join",
                "displayName": display_name,
                "clientMaxSize": 2,
            }),
            StatusCode::OK,
        )
        .await
        .context("room join failed")?;
    Ok(())
}

/// Refresh a participant's presence so the server keeps it in the room.
pub async fn refresh_room(client: &LoopClient, room_token: &str) -> Result<()> {
    client
        .post_json(
            &format!("/rooms/{}", room_token),
            &json!({ "action": "refresh" }),
            StatusCode::OK,
        )
        .await
        .context("room refresh failed")?;
    Ok(())
}

/// Leave a room.
pub async fn leave_room(client: &LoopClient, room_token: &str) -> Result<()> {
    client
        .post_json(
            &format!("/rooms/{}", room_token),
            &json!({ "action": "leave" }),
            StatusCode::OK,
        )
        .await
        .context("room leave failed")?;
    Ok(())
}

/// Delete a room.
pub async fn delete_room(client: &LoopClient, room_token: &str) -> Result<()> {
    client
        .delete(&format!("/rooms/{}", room_token), StatusCode::OK)
        .await
        .context("room deletion failed")?;
    tracing::info!(%room_token, "deleted room");
    Ok(())
}
