//! Signaling wire-format messages.
//!
//! Everything on the wire is an internally tagged JSON object
//! (`{"type": "...", ...}`). The `sdp` and `candidate` payloads belong to the
//! peers' negotiation protocol and are carried as raw `serde_json::Value` —
//! forwarded verbatim, never inspected.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The role a connection declares when it registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Broadcaster,
    Viewer,
}

// ---------------------------------------------------------------------------
// Client → Server
// ---------------------------------------------------------------------------

/// A message received from a client over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    Register {
        role: Role,
    },
    #[serde(rename_all = "camelCase")]
    Offer {
        viewer_id: String,
        sdp: Value,
    },
    #[serde(rename_all = "camelCase")]
    Answer {
        viewer_id: String,
        sdp: Value,
    },
    #[serde(rename_all = "camelCase")]
    Candidate {
        viewer_id: String,
        candidate: Value,
        origin: Role,
    },
    Stop,
}

// ---------------------------------------------------------------------------
// Server → Client
// ---------------------------------------------------------------------------

/// A message sent from the server to a client over WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    #[serde(rename_all = "camelCase")]
    Registered {
        role: Role,
        #[serde(skip_serializing_if = "Option::is_none")]
        viewer_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        has_broadcaster: Option<bool>,
    },
    #[serde(rename_all = "camelCase")]
    ViewerJoined { viewer_id: String },
    #[serde(rename_all = "camelCase")]
    ViewerLeft { viewer_id: String },
    #[serde(rename_all = "camelCase")]
    ViewerMissing { viewer_id: String },
    #[serde(rename_all = "camelCase")]
    Offer { viewer_id: String, sdp: Value },
    #[serde(rename_all = "camelCase")]
    Answer { viewer_id: String, sdp: Value },
    #[serde(rename_all = "camelCase")]
    Candidate {
        viewer_id: String,
        candidate: Value,
        origin: Role,
    },
    ViewerCount { count: usize },
    BroadcasterEnded,
    Stopped,
    Error { message: String },
}

impl ServerMessage {
    /// Confirmation sent to a freshly registered broadcaster.
    pub fn registered_broadcaster() -> Self {
        Self::Registered {
            role: Role::Broadcaster,
            viewer_id: None,
            has_broadcaster: None,
        }
    }

    /// Confirmation sent to a freshly registered viewer, carrying its
    /// server-issued identifier and whether a broadcaster is live.
    pub fn registered_viewer(viewer_id: String, has_broadcaster: bool) -> Self {
        Self::Registered {
            role: Role::Viewer,
            viewer_id: Some(viewer_id),
            has_broadcaster: Some(has_broadcaster),
        }
    }

    /// Structured error returned to the offending sender only.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}
