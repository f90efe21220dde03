//! Call-progress wire messages.
//!
//! JSON text frames `{messageType, state?, reason?, event?, auth?, callId?}`.
//! Unknown fields are ignored so server additions do not break the probe.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Hello,
    Progress,
    Action,
    Echo,
}

/// Session state of one leg, as reported by the server. The authoritative
/// state machine lives server-side; the client only reacts to these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionState {
    Init,
    Alerting,
    Connecting,
    HalfConnected,
    Connected,
    Terminated,
}

/// One message on the progress channel, in either direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressMessage {
    pub message_type: MessageType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<SessionState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
}

impl ProgressMessage {
    /// Opening message on a leg: authenticate it against the call.
    pub fn hello(auth: &str, call_id: &str) -> Self {
        Self {
            message_type: MessageType::Hello,
            state: None,
            reason: None,
            event: None,
            auth: Some(auth.to_string()),
            call_id: Some(call_id.to_string()),
        }
    }

    /// Client action advancing the far side (`accept`, `media-up`).
    pub fn action(event: &str) -> Self {
        Self {
            message_type: MessageType::Action,
            state: None,
            reason: None,
            event: Some(event.to_string()),
            auth: None,
            call_id: None,
        }
    }

    /// Whether this is a `progress` message carrying the given state.
    pub fn is_progress(&self, state: SessionState) -> bool {
        self.message_type == MessageType::Progress && self.state == Some(state)
    }
}
