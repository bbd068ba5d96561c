//! Notification message types (session-to-caller events)

use serde::{Deserialize, Serialize};

use crate::core::types::{DetectionResult, ScanState};

/// Events published by a scan session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "method", content = "params")]
#[serde(rename_all = "snake_case")]
pub enum Notification {
    /// Scan state changed
    ScanStateChanged(ScanStateChangedParams),

    /// A QR code was decoded
    Detection(DetectionParams),
}

/// Scan state change notification parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScanStateChangedParams {
    pub state: ScanState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Detection notification parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DetectionParams {
    pub result: DetectionResult,
}

impl ScanStateChangedParams {
    pub fn new(state: ScanState) -> Self {
        Self {
            state,
            device_id: None,
            error: None,
        }
    }

    pub fn on_device(state: ScanState, device_id: String) -> Self {
        Self {
            state,
            device_id: Some(device_id),
            error: None,
        }
    }

    pub fn with_error(state: ScanState, error: String) -> Self {
        Self {
            state,
            device_id: None,
            error: Some(error),
        }
    }
}

impl Notification {
    pub fn state(state: ScanState) -> Self {
        Notification::ScanStateChanged(ScanStateChangedParams::new(state))
    }

    pub fn detection(result: DetectionResult) -> Self {
        Notification::Detection(DetectionParams { result })
    }
}
