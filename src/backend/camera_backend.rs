//! Camera backend trait definitions

use trait_variant::make;

use crate::core::error::CameraResult;
use crate::core::types::{CameraDevice, Frame, VideoConstraints};

/// Abstraction over the platform's video input devices
///
/// This trait enables testing by allowing mock implementations
/// while providing a standard interface for camera access.
#[make(Send)]
pub trait CameraBackend: Sync + 'static {
    /// Stream handed out by [`CameraBackend::open`]
    type Stream: FrameSource + 'static;

    /// List available video input devices
    ///
    /// Read-only; does not acquire any device.
    async fn list_video_inputs(&self) -> CameraResult<Vec<CameraDevice>>;

    /// Acquire a stream matching the constraints
    ///
    /// May wait indefinitely for a permission grant; callers impose their own
    /// timeout if they need one.
    async fn open(&self, constraints: &VideoConstraints) -> CameraResult<Self::Stream>;
}

/// Source of RGBA frames, one per request
#[make(Send)]
pub trait FrameSource: Send {
    /// Identifier of the device this stream reads from
    fn device_id(&self) -> &str;

    /// Next frame, or `None` when no frame is ready yet
    async fn next_frame(&mut self) -> CameraResult<Option<Frame>>;

    /// Stop all tracks and release the device
    ///
    /// Idempotent. Frames requested afterwards fail with `StreamEnded`.
    fn stop(&mut self);
}
