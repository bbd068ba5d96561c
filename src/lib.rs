//! Wi-Fi QR
//!
//! Encodes Wi-Fi credentials into the `WIFI:` QR payload convention and reads
//! them back from:
//! - a live camera, sampled frame by frame until a code is found
//! - a still image file

pub mod backend;
pub mod config;
pub mod core;
pub mod protocol;
pub mod qr;
pub mod storage;

pub use core::{
    codec::{Payload, PayloadCodec},
    error::{CameraError, GenerateError, ParseError, SessionError, ValidationError},
    generator::GenerationController,
    session::ScanSession,
    types::{AuthType, DetectionResult, ScanState, WifiCredentials},
};
