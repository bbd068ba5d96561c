//! Domain types for Wi-Fi QR generation and scanning

use serde::{Deserialize, Serialize};

use super::{codec::PayloadCodec, error::ValidationError};

/// Authentication token carried in the `T:` field
///
/// The token is free-form: the codec writes and reads it verbatim and never
/// checks it against a known set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthType(String);

impl AuthType {
    pub const WPA: &'static str = "WPA";
    pub const WEP: &'static str = "WEP";
    pub const NO_PASSWORD: &'static str = "nopass";

    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn wpa() -> Self {
        Self::new(Self::WPA)
    }

    pub fn wep() -> Self {
        Self::new(Self::WEP)
    }

    pub fn open() -> Self {
        Self::new(Self::NO_PASSWORD)
    }

    /// True for the `nopass` token, which means no `P:` field is written
    pub fn is_open(&self) -> bool {
        self.0 == Self::NO_PASSWORD
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AuthType {
    fn default() -> Self {
        Self::open()
    }
}

impl From<&str> for AuthType {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

impl std::fmt::Display for AuthType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Credentials of one Wi-Fi network
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiCredentials {
    /// Network name
    pub ssid: String,
    /// Passphrase, empty for open networks
    pub password: String,
    /// Authentication token (`WPA`, `WEP`, `nopass`, ...)
    pub auth_type: AuthType,
    /// Whether the network does not broadcast its SSID
    pub hidden: bool,
}

impl WifiCredentials {
    pub fn new(
        ssid: impl Into<String>,
        password: impl Into<String>,
        auth_type: AuthType,
        hidden: bool,
    ) -> Self {
        Self {
            ssid: ssid.into(),
            password: password.into(),
            auth_type,
            hidden,
        }
    }

    /// Open network without a password
    pub fn open(ssid: impl Into<String>, hidden: bool) -> Self {
        Self::new(ssid, String::new(), AuthType::open(), hidden)
    }

    /// Check that the SSID is set and a password is present when required
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.ssid.trim().is_empty() {
            return Err(ValidationError::EmptySsid);
        }
        if !self.auth_type.is_open() && self.password.is_empty() {
            return Err(ValidationError::MissingPassword);
        }
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Outcome of one decode attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetectionResult {
    /// No QR code was found
    NoDetection,
    /// A QR code was found but it does not carry a Wi-Fi payload
    NonWifiQr { raw_text: String },
    /// A Wi-Fi payload was found and parsed
    WifiDetected {
        credentials: WifiCredentials,
        raw_payload: String,
    },
}

impl DetectionResult {
    /// Classify text returned by the QR decoder
    pub fn from_decoded(text: String) -> Self {
        match PayloadCodec::decode(&text) {
            Ok(credentials) => DetectionResult::WifiDetected {
                credentials,
                raw_payload: text,
            },
            Err(_) => DetectionResult::NonWifiQr { raw_text: text },
        }
    }

    pub fn is_wifi(&self) -> bool {
        matches!(self, DetectionResult::WifiDetected { .. })
    }

    pub fn credentials(&self) -> Option<&WifiCredentials> {
        match self {
            DetectionResult::WifiDetected { credentials, .. } => Some(credentials),
            _ => None,
        }
    }
}

/// Scan session state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ScanState {
    Idle = 0,
    Starting = 1,
    Scanning = 2,
    Paused = 3,
    Stopped = 4,
}

impl TryFrom<u8> for ScanState {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, <Self as TryFrom<u8>>::Error> {
        match value {
            0 => Ok(ScanState::Idle),
            1 => Ok(ScanState::Starting),
            2 => Ok(ScanState::Scanning),
            3 => Ok(ScanState::Paused),
            4 => Ok(ScanState::Stopped),
            _ => Err(()),
        }
    }
}

impl From<ScanState> for u8 {
    fn from(state: ScanState) -> Self {
        state as u8
    }
}

/// A video input device as reported by the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraDevice {
    pub id: String,
    pub label: String,
}

/// Which way a camera faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacingMode {
    User,
    Environment,
}

/// Constraints for acquiring a camera stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoConstraints {
    /// Exactly this device
    DeviceId(String),
    /// Any device facing this way
    FacingMode(FacingMode),
}

impl VideoConstraints {
    /// Exact device when one is selected, otherwise the rear camera
    pub fn for_selection(selected: Option<&str>) -> Self {
        match selected {
            Some(id) if !id.is_empty() => VideoConstraints::DeviceId(id.to_string()),
            _ => VideoConstraints::FacingMode(FacingMode::Environment),
        }
    }
}

/// One RGBA frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Row-major RGBA pixels, 4 bytes each
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Frame {
    pub fn new(pixels: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            pixels,
            width,
            height,
        }
    }
}
