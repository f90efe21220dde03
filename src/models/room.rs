//! Room-related request and response bodies.

use serde::{Deserialize, Serialize};

/// Body of `POST /rooms`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    pub room_name: String,
    /// Hours until the room expires server-side.
    pub expires_in: u32,
    pub room_owner: String,
    pub max_size: u32,
}

impl Default for CreateRoomRequest {
    fn default() -> Self {
        Self {
            room_name: "UX Discussion".to_string(),
            expires_in: 1,
            room_owner: "Alexis".to_string(),
            max_size: 10,
        }
    }
}

/// Body of the 201 response to `POST /rooms`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomCreated {
    pub room_token: String,
    pub room_url: Option<String>,
    pub expires_at: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_room_serializes_camel_case() {
        let body = serde_json::to_value(CreateRoomRequest::default()).unwrap();
        assert_eq!(body["roomName"], "UX Discussion");
        assert_eq!(body["expiresIn"], 1);
        assert_eq!(body["maxSize"], 10);
    }
}
