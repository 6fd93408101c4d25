use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub enum AppEvent {
    SetServerUrl(String),
    SetAutoSend(bool),
    TriggerCapture(TriggerMode),
    ShowResults {
        mode: TriggerMode,
        results: Vec<ResultRecord>,
    },
    RequestResults,
    LoadingChanged(bool),
    SaveOverlay(PathBuf),
    StatusUpdate(String),
    BackendReady,
    Quit,
}

/// Which trigger started a capture attempt; also selects the result store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerMode {
    Manual,
    Auto,
}

impl fmt::Display for TriggerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerMode::Manual => f.write_str("manual"),
            TriggerMode::Auto => f.write_str("auto"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Pending,
    Done,
    Error,
}

impl ResultStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ResultStatus::Pending => "pending",
            ResultStatus::Done => "done",
            ResultStatus::Error => "error",
        }
    }
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One capture attempt as shown to the operator.
///
/// Created as `Pending` and resolved exactly once to `Done` or `Error`,
/// keeping the same `id` and `timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub id: Uuid,
    pub timestamp: String,
    pub status: ResultStatus,
    pub data: serde_json::Value,
    pub msg: String,
}

impl ResultRecord {
    pub fn pending(timestamp: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: timestamp.into(),
            status: ResultStatus::Pending,
            data: serde_json::Value::Null,
            msg: String::new(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == ResultStatus::Pending
    }

    /// Final state for this record. `message` is prefixed with the status label.
    pub fn resolve(&self, status: ResultStatus, data: serde_json::Value, message: &str) -> Self {
        Self {
            id: self.id,
            timestamp: self.timestamp.clone(),
            status,
            data,
            msg: format!("{}: {}", status.label().to_uppercase(), message),
        }
    }
}

/// Axis-aligned face box in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}
