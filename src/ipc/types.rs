//! IPC message types.
//!
//! Requests are tagged by `type`, with an optional `payload`, matching the
//! message shape used by the status popup.

use serde::{Deserialize, Serialize};

use crate::inference::UpdateSnapshot;

/// Request sent to the update monitor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpdateRequest {
    /// Parse pasted log text and store the resulting status.
    ManualLogInput(String),
    /// Return the stored status.
    GetUpdateStatus,
    /// Open the settings page to start an update check.
    CheckForUpdates,
}

impl UpdateRequest {
    /// Get the request tag as sent on the wire.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ManualLogInput(_) => "MANUAL_LOG_INPUT",
            Self::GetUpdateStatus => "GET_UPDATE_STATUS",
            Self::CheckForUpdates => "CHECK_FOR_UPDATES",
        }
    }
}

/// Response to an [`UpdateRequest`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpdateResponse {
    /// Whether the request was handled.
    pub success: bool,
    /// Current status, for requests that produce one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<UpdateSnapshot>,
    /// Failure description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UpdateResponse {
    /// Successful response carrying a status.
    #[must_use]
    pub fn ok(status: UpdateSnapshot) -> Self {
        Self {
            success: true,
            status: Some(status),
            error: None,
        }
    }

    /// Successful response without a status.
    #[must_use]
    pub fn ack() -> Self {
        Self {
            success: true,
            status: None,
            error: None,
        }
    }

    /// Failed response with a reason.
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            status: None,
            error: Some(error.into()),
        }
    }
}

/// Errors that can occur during IPC.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    /// Failed to connect to the monitor socket.
    #[error("Failed to connect to update monitor: {0}")]
    ConnectionFailed(#[from] std::io::Error),

    /// The monitor socket does not exist.
    #[error("Update monitor not running (socket not found)")]
    ServerNotRunning,

    /// The operation timed out.
    #[error("IPC timeout after {0}ms")]
    Timeout(u64),

    /// Failed to serialize or deserialize a message.
    #[error("Failed to serialize message: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// The response from the monitor was invalid.
    #[error("Invalid response from update monitor")]
    InvalidResponse,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::Phase;

    #[test]
    fn manual_log_input_wire_format() {
        let request = UpdateRequest::ManualLogInput("line one\nline two".to_string());
        let serialized = serde_json::to_string(&request).unwrap();
        assert_eq!(
            serialized,
            r#"{"type":"MANUAL_LOG_INPUT","payload":"line one\nline two"}"#
        );
    }

    #[test]
    fn unit_requests_have_no_payload() {
        let serialized = serde_json::to_string(&UpdateRequest::GetUpdateStatus).unwrap();
        assert_eq!(serialized, r#"{"type":"GET_UPDATE_STATUS"}"#);

        let request: UpdateRequest = serde_json::from_str(r#"{"type":"CHECK_FOR_UPDATES"}"#).unwrap();
        assert_eq!(request, UpdateRequest::CheckForUpdates);
    }

    #[test]
    fn unknown_request_type_is_rejected() {
        let result = serde_json::from_str::<UpdateRequest>(r#"{"type":"REBOOT"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn request_kind_matches_tag() {
        for request in [
            UpdateRequest::ManualLogInput(String::new()),
            UpdateRequest::GetUpdateStatus,
            UpdateRequest::CheckForUpdates,
        ] {
            let json = serde_json::to_value(&request).unwrap();
            assert_eq!(json["type"], request.kind());
        }
    }

    #[test]
    fn response_ok_carries_status() {
        let response = UpdateResponse::ok(UpdateSnapshot::initial());
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["status"]["phase"], "idle");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn response_failure_serialization() {
        let response = UpdateResponse::failure("Unknown message type");
        let serialized = serde_json::to_string(&response).unwrap();
        assert_eq!(
            serialized,
            r#"{"success":false,"error":"Unknown message type"}"#
        );
    }

    #[test]
    fn response_deserializes_status() {
        let json = r#"{"success":true,"status":{"phase":"error","error_message":"boom","inferred_at":"2026-10-18T10:00:00Z"}}"#;
        let response: UpdateResponse = serde_json::from_str(json).unwrap();
        let status = response.status.unwrap();
        assert_eq!(status.phase, Phase::Error);
        assert_eq!(status.error_message.as_deref(), Some("boom"));
    }

    #[test]
    fn response_json_line_format() {
        let response = UpdateResponse::ok(UpdateSnapshot::initial());
        let serialized = serde_json::to_string(&response).unwrap();
        assert!(!serialized.contains('\n'));
    }

    #[test]
    fn ipc_error_display() {
        assert_eq!(
            IpcError::ServerNotRunning.to_string(),
            "Update monitor not running (socket not found)"
        );
        assert_eq!(IpcError::Timeout(4000).to_string(), "IPC timeout after 4000ms");
    }
}
