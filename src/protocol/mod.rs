//! Protocol message definitions

pub mod notification;

pub use notification::{DetectionParams, Notification, ScanStateChangedParams};
