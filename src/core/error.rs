//! Error types for Wi-Fi QR generation and scanning

use thiserror::Error;

use super::types::ScanState;

/// Result type for payload parsing
pub type ParseResult<T> = Result<T, ParseError>;

/// Result type for camera operations
pub type CameraResult<T> = Result<T, CameraError>;

/// Result type for scan session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Result type for QR rendering
pub type RenderResult<T> = Result<T, RenderError>;

/// Result type for generation operations
pub type GenerateResult<T> = Result<T, GenerateError>;

/// Result type for key-value store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for clipboard operations
pub type ClipboardResult<T> = Result<T, ClipboardError>;

/// Credentials rejected before any encoding happens
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter the Wi-Fi name (SSID)")]
    EmptySsid,

    #[error("Please enter the Wi-Fi password (or choose no password)")]
    MissingPassword,
}

/// Payload text that could not be read as Wi-Fi credentials
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Not a Wi-Fi code")]
    NotWifiFormat,
}

/// Errors related to camera access
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    #[error("Camera permission denied: {0}")]
    PermissionDenied(String),

    #[error("Camera unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Camera stream ended")]
    StreamEnded,

    #[error("Failed to read frame: {0}")]
    FrameRead(String),
}

impl CameraError {
    /// Message suitable for showing to the person holding the camera
    pub fn user_message(&self) -> &'static str {
        match self {
            CameraError::PermissionDenied(_) => {
                "Camera permission denied. Please allow camera access in your system settings."
            }
            CameraError::DeviceUnavailable(_) => "Unable to access camera.",
            CameraError::StreamEnded => "Camera stream ended.",
            CameraError::FrameRead(_) => "Could not read from camera.",
        }
    }
}

/// Errors related to the scan session
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("Invalid state transition from {from:?} to {to:?}")]
    InvalidStateTransition { from: ScanState, to: ScanState },

    #[error("Operation already in progress")]
    OperationInProgress,

    #[error("Scan worker failed: {0}")]
    WorkerFailed(String),
}

/// Errors from the QR image encoder
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("QR encoding failed: {0}")]
    Encode(String),
}

/// Errors while writing a labeled PNG
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PNG encoding error: {0}")]
    Png(#[from] png::EncodingError),
}

/// Errors while loading a still image for scanning
#[derive(Error, Debug)]
pub enum ImageScanError {
    #[error("Could not read image: {0}")]
    Image(#[from] image::ImageError),
}

/// Errors related to the clipboard
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClipboardError {
    #[error("Could not copy to clipboard: {0}")]
    WriteFailed(String),
}

/// Errors related to code generation
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Please generate a QR first")]
    NothingGenerated,

    #[error("Export failed: {0}")]
    Export(#[from] ExportError),

    #[error(transparent)]
    Clipboard(#[from] ClipboardError),
}

/// Errors related to the key-value store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_errors_have_distinct_messages() {
        let denied = CameraError::PermissionDenied("NotAllowed".into());
        let unavailable = CameraError::DeviceUnavailable("cam-9".into());
        assert_ne!(denied.user_message(), unavailable.user_message());
    }

    #[test]
    fn test_session_error_from_camera_error() {
        let err: SessionError = CameraError::DeviceUnavailable("cam-9".into()).into();
        assert!(matches!(
            err,
            SessionError::Camera(CameraError::DeviceUnavailable(_))
        ));
        assert_eq!(err.to_string(), "Camera error: Camera unavailable: cam-9");
    }
}
