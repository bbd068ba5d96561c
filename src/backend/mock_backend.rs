//! Mock camera backend and decoder for testing

use std::{
    collections::VecDeque,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};
use tokio::sync::Mutex;

use crate::{
    backend::{CameraBackend, FrameSource},
    core::{
        error::{CameraError, CameraResult},
        types::{CameraDevice, Frame, VideoConstraints},
    },
    qr::QrDecoder,
};

/// Internal state for the mock backend
#[derive(Debug, Clone, Default)]
struct MockState {
    devices: Vec<CameraDevice>,
    open_failure: Option<CameraError>,
    frames: Vec<Option<Frame>>,
    end_after_frames: bool,
    opened_with: Vec<VideoConstraints>,
}

/// Mock camera backend for testing
///
/// Every opened stream replays the configured frame script and, unless told
/// to end, keeps yielding empty frames afterwards.
#[derive(Debug, Clone, Default)]
pub struct MockCameraBackend {
    inner: Arc<Mutex<MockState>>,
    open_handles: Arc<AtomicUsize>,
    frames_served: Arc<AtomicUsize>,
}

impl MockCameraBackend {
    /// Create a new mock backend with the given devices
    pub fn new(devices: Vec<CameraDevice>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockState {
                devices,
                ..MockState::default()
            })),
            ..Self::default()
        }
    }

    /// Frame script for streams opened from now on
    pub async fn set_frames(&self, frames: Vec<Option<Frame>>) {
        self.inner.lock().await.frames = frames;
    }

    /// End streams with `StreamEnded` once the script is exhausted
    pub async fn set_end_after_frames(&self, end: bool) {
        self.inner.lock().await.end_after_frames = end;
    }

    /// Configure mock to fail open operations
    pub async fn set_open_failure(&self, failure: Option<CameraError>) {
        self.inner.lock().await.open_failure = failure;
    }

    /// Constraints passed to every open call so far
    pub async fn opened_with(&self) -> Vec<VideoConstraints> {
        self.inner.lock().await.opened_with.clone()
    }

    /// Number of streams not yet stopped
    pub fn open_handles(&self) -> usize {
        self.open_handles.load(Ordering::SeqCst)
    }

    /// Number of frames handed out across all streams
    pub fn frames_served(&self) -> usize {
        self.frames_served.load(Ordering::SeqCst)
    }
}

impl CameraBackend for MockCameraBackend {
    type Stream = MockStream;

    async fn list_video_inputs(&self) -> CameraResult<Vec<CameraDevice>> {
        Ok(self.inner.lock().await.devices.clone())
    }

    async fn open(&self, constraints: &VideoConstraints) -> CameraResult<MockStream> {
        let mut state = self.inner.lock().await;
        state.opened_with.push(constraints.clone());

        if let Some(err) = state.open_failure.clone() {
            return Err(err);
        }

        let device_id = match constraints {
            VideoConstraints::DeviceId(id) => state
                .devices
                .iter()
                .find(|d| &d.id == id)
                .map(|d| d.id.clone())
                .ok_or_else(|| CameraError::DeviceUnavailable(id.clone()))?,
            VideoConstraints::FacingMode(_) => state
                .devices
                .last()
                .map(|d| d.id.clone())
                .ok_or_else(|| CameraError::DeviceUnavailable("no devices".into()))?,
        };

        self.open_handles.fetch_add(1, Ordering::SeqCst);
        Ok(MockStream {
            device_id,
            frames: state.frames.clone().into(),
            end_after_frames: state.end_after_frames,
            stopped: false,
            open_handles: self.open_handles.clone(),
            frames_served: self.frames_served.clone(),
        })
    }
}

/// Stream produced by [`MockCameraBackend`]
#[derive(Debug)]
pub struct MockStream {
    device_id: String,
    frames: VecDeque<Option<Frame>>,
    end_after_frames: bool,
    stopped: bool,
    open_handles: Arc<AtomicUsize>,
    frames_served: Arc<AtomicUsize>,
}

impl FrameSource for MockStream {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    async fn next_frame(&mut self) -> CameraResult<Option<Frame>> {
        if self.stopped {
            return Err(CameraError::StreamEnded);
        }
        let frame = match self.frames.pop_front() {
            Some(frame) => frame,
            None if self.end_after_frames => return Err(CameraError::StreamEnded),
            None => Some(MockDecoder::blank_frame()),
        };
        if frame.is_some() {
            self.frames_served.fetch_add(1, Ordering::SeqCst);
        }
        Ok(frame)
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.open_handles.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Drop for MockStream {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Decoder reading frame pixels as UTF-8 text
///
/// Frames built with [`MockDecoder::frame_with_text`] decode to their text;
/// blank frames decode to nothing.
#[derive(Debug, Clone, Default)]
pub struct MockDecoder {
    calls: Arc<AtomicUsize>,
}

impl MockDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of decode attempts so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn frame_with_text(text: &str) -> Frame {
        Frame::new(text.as_bytes().to_vec(), text.len() as u32, 1)
    }

    pub fn blank_frame() -> Frame {
        Frame::new(Vec::new(), 0, 0)
    }
}

impl QrDecoder for MockDecoder {
    fn decode(&mut self, pixels: &[u8], _width: u32, _height: u32) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if pixels.is_empty() {
            None
        } else {
            String::from_utf8(pixels.to_vec()).ok()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn devices() -> Vec<CameraDevice> {
        vec![
            CameraDevice {
                id: "front".into(),
                label: "Front".into(),
            },
            CameraDevice {
                id: "back".into(),
                label: "Back".into(),
            },
        ]
    }

    #[tokio::test]
    async fn test_mock_backend_tracks_handles() {
        let backend = MockCameraBackend::new(devices());

        let mut stream = backend
            .open(&VideoConstraints::DeviceId("front".into()))
            .await
            .unwrap();
        assert_eq!(backend.open_handles(), 1);

        stream.stop();
        assert_eq!(backend.open_handles(), 0);

        let stream = backend
            .open(&VideoConstraints::DeviceId("back".into()))
            .await
            .unwrap();
        drop(stream);
        assert_eq!(backend.open_handles(), 0);
    }

    #[tokio::test]
    async fn test_mock_backend_open_failure() {
        let backend = MockCameraBackend::new(devices());
        backend
            .set_open_failure(Some(CameraError::PermissionDenied("denied".into())))
            .await;

        let result = backend
            .open(&VideoConstraints::DeviceId("front".into()))
            .await;
        assert!(matches!(result, Err(CameraError::PermissionDenied(_))));
        assert_eq!(backend.open_handles(), 0);
    }

    #[tokio::test]
    async fn test_mock_stream_script() {
        let backend = MockCameraBackend::new(devices());
        backend
            .set_frames(vec![None, Some(MockDecoder::frame_with_text("hi"))])
            .await;
        backend.set_end_after_frames(true).await;

        let mut stream = backend
            .open(&VideoConstraints::DeviceId("front".into()))
            .await
            .unwrap();
        assert_eq!(stream.next_frame().await, Ok(None));
        let frame = stream.next_frame().await.unwrap().unwrap();
        let mut decoder = MockDecoder::new();
        assert_eq!(
            decoder.decode(&frame.pixels, frame.width, frame.height),
            Some("hi".to_string())
        );
        assert_eq!(stream.next_frame().await, Err(CameraError::StreamEnded));
    }

    #[test]
    fn test_mock_decoder_blank_frame() {
        let mut decoder = MockDecoder::new();
        let frame = MockDecoder::blank_frame();
        assert_eq!(decoder.decode(&frame.pixels, 0, 0), None);
        assert_eq!(decoder.calls(), 1);
    }
}
