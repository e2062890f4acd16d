use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraState {
    Stopped,
    Running,
    Error,
}

/// Snapshot of the service lifecycle, replaced wholesale on every
/// transition so concurrent readers never observe a half-updated value.
#[derive(Debug, Clone, Serialize)]
pub struct CameraStatus {
    #[serde(rename = "status")]
    pub state: CameraState,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub streaming: bool,
}

impl CameraStatus {
    pub fn new(state: CameraState, message: impl Into<String>, streaming: bool) -> Self {
        Self {
            state,
            message: message.into(),
            timestamp: Utc::now(),
            streaming,
        }
    }
}

impl Default for CameraStatus {
    fn default() -> Self {
        Self::new(CameraState::Stopped, "", false)
    }
}

#[cfg(test)]
mod tests {
    use super::{CameraState, CameraStatus};

    #[test]
    fn status_serializes_with_wire_field_names() {
        let status = CameraStatus::new(CameraState::Running, "Scanning started", false);
        let value = serde_json::to_value(&status).expect("status should serialize");

        assert_eq!(value["status"], "running");
        assert_eq!(value["message"], "Scanning started");
        assert_eq!(value["streaming"], false);
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn states_serialize_as_snake_case() {
        assert_eq!(
            serde_json::to_value(CameraState::Stopped).expect("state should serialize"),
            "stopped"
        );
        assert_eq!(
            serde_json::to_value(CameraState::Error).expect("state should serialize"),
            "error"
        );
    }
}
