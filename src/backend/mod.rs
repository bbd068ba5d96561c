//! Platform abstraction layer (camera and clipboard)

pub mod camera_backend;
pub mod clipboard;
pub mod mock_backend;
pub mod replay_backend;

pub use camera_backend::{CameraBackend, FrameSource};
pub use clipboard::{Clipboard, CopyOutcome, SystemClipboard, copy_password};
pub use replay_backend::{ReplayBackend, ReplayStream};

#[cfg(test)]
pub use clipboard::MockClipboard;
#[cfg(test)]
pub use mock_backend::{MockCameraBackend, MockDecoder};
