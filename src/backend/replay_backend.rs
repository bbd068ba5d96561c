//! Replay camera backend
//!
//! Plays back recorded frames from disk. Each subdirectory of the root is one
//! device; its image files are the frames, served in lexical order. An
//! optional `label.txt` inside a device directory gives its display label.

use std::{
    collections::VecDeque,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tokio::fs;
use tracing::debug;

use crate::{
    backend::{CameraBackend, FrameSource},
    core::{
        error::{CameraError, CameraResult},
        types::{CameraDevice, FacingMode, Frame, VideoConstraints},
    },
};

const LABEL_FILE: &str = "label.txt";
const FRAME_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];
const REAR_HINTS: [&str; 3] = ["back", "rear", "environment"];

/// Camera backend replaying frame directories
#[derive(Debug, Clone)]
pub struct ReplayBackend {
    root: PathBuf,
}

impl ReplayBackend {
    /// Create a backend over the given root directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn map_io_error(err: std::io::Error, what: &Path) -> CameraError {
        match err.kind() {
            ErrorKind::PermissionDenied => {
                CameraError::PermissionDenied(format!("{}: {}", what.display(), err))
            }
            _ => CameraError::DeviceUnavailable(format!("{}: {}", what.display(), err)),
        }
    }

    async fn read_label(dir: &Path, id: &str) -> String {
        match fs::read_to_string(dir.join(LABEL_FILE)).await {
            Ok(label) if !label.trim().is_empty() => label.trim().to_string(),
            _ => id.to_string(),
        }
    }

    async fn list_frames(dir: &Path) -> CameraResult<VecDeque<PathBuf>> {
        let mut entries = fs::read_dir(dir)
            .await
            .map_err(|e| Self::map_io_error(e, dir))?;

        let mut frames = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Self::map_io_error(e, dir))?
        {
            let path = entry.path();
            let is_frame = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if is_frame {
                frames.push(path);
            }
        }
        frames.sort();

        Ok(frames.into())
    }

    fn faces_environment(device: &CameraDevice) -> bool {
        let id = device.id.to_ascii_lowercase();
        let label = device.label.to_ascii_lowercase();
        REAR_HINTS
            .iter()
            .any(|hint| id.contains(hint) || label.contains(hint))
    }

    async fn resolve(&self, constraints: &VideoConstraints) -> CameraResult<String> {
        match constraints {
            VideoConstraints::DeviceId(id) => {
                // Only listed devices; ids never reach outside the root
                let devices = self.list_video_inputs().await?;
                if devices.iter().any(|d| &d.id == id) {
                    Ok(id.clone())
                } else {
                    Err(CameraError::DeviceUnavailable(format!("no such device: {}", id)))
                }
            }
            VideoConstraints::FacingMode(mode) => {
                let devices = self.list_video_inputs().await?;
                let preferred = match mode {
                    FacingMode::Environment => devices.iter().find(|d| Self::faces_environment(d)),
                    FacingMode::User => devices.iter().find(|d| !Self::faces_environment(d)),
                };
                preferred
                    .or_else(|| devices.first())
                    .map(|d| d.id.clone())
                    .ok_or_else(|| CameraError::DeviceUnavailable("no video input devices".into()))
            }
        }
    }
}

impl CameraBackend for ReplayBackend {
    type Stream = ReplayStream;

    async fn list_video_inputs(&self) -> CameraResult<Vec<CameraDevice>> {
        let mut entries = fs::read_dir(&self.root)
            .await
            .map_err(|e| Self::map_io_error(e, &self.root))?;

        let mut devices = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Self::map_io_error(e, &self.root))?
        {
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            if !is_dir {
                continue;
            }
            let id = entry.file_name().to_string_lossy().into_owned();
            let label = Self::read_label(&entry.path(), &id).await;
            devices.push(CameraDevice { id, label });
        }
        devices.sort_by(|a, b| a.id.cmp(&b.id));

        debug!("Found {} replay devices in {}", devices.len(), self.root.display());
        Ok(devices)
    }

    async fn open(&self, constraints: &VideoConstraints) -> CameraResult<ReplayStream> {
        let device_id = self.resolve(constraints).await?;
        let frames = Self::list_frames(&self.root.join(&device_id)).await?;

        debug!("Opened replay device {} with {} frames", device_id, frames.len());
        Ok(ReplayStream {
            device_id,
            frames,
            stopped: false,
        })
    }
}

/// Stream over the frames of one replay device
#[derive(Debug)]
pub struct ReplayStream {
    device_id: String,
    frames: VecDeque<PathBuf>,
    stopped: bool,
}

impl FrameSource for ReplayStream {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    async fn next_frame(&mut self) -> CameraResult<Option<Frame>> {
        if self.stopped {
            return Err(CameraError::StreamEnded);
        }
        let path = self.frames.pop_front().ok_or(CameraError::StreamEnded)?;

        let bytes = fs::read(&path)
            .await
            .map_err(|e| CameraError::FrameRead(format!("{}: {}", path.display(), e)))?;
        let image = image::load_from_memory(&bytes)
            .map_err(|e| CameraError::FrameRead(format!("{}: {}", path.display(), e)))?
            .to_rgba8();

        let (width, height) = image.dimensions();
        Ok(Some(Frame::new(image.into_raw(), width, height)))
    }

    fn stop(&mut self) {
        if !self.stopped {
            debug!("Releasing replay device {}", self.device_id);
        }
        self.stopped = true;
        self.frames.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;
    use tokio_test::assert_ok;

    fn write_frame(path: &Path) {
        let img = image::RgbaImage::from_pixel(4, 3, image::Rgba([10, 20, 30, 255]));
        img.save(path).unwrap();
    }

    fn camera_root() -> TempDir {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("front")).unwrap();
        std::fs::create_dir(root.path().join("usb-rear")).unwrap();
        std::fs::write(root.path().join("usb-rear").join(LABEL_FILE), "Rear camera\n").unwrap();
        write_frame(&root.path().join("usb-rear").join("002.png"));
        write_frame(&root.path().join("usb-rear").join("001.png"));
        std::fs::write(root.path().join("usb-rear").join("notes.txt"), "ignored").unwrap();
        std::fs::write(root.path().join("stray.png"), "not a device").unwrap();
        root
    }

    #[tokio::test]
    async fn test_list_video_inputs() {
        let root = camera_root();
        let backend = ReplayBackend::new(root.path());

        let devices = assert_ok!(backend.list_video_inputs().await);
        assert_eq!(
            devices,
            vec![
                CameraDevice {
                    id: "front".into(),
                    label: "front".into()
                },
                CameraDevice {
                    id: "usb-rear".into(),
                    label: "Rear camera".into()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_open_prefers_rear_camera() {
        let root = camera_root();
        let backend = ReplayBackend::new(root.path());

        let stream = assert_ok!(
            backend
                .open(&VideoConstraints::FacingMode(FacingMode::Environment))
                .await
        );
        assert_eq!(stream.device_id(), "usb-rear");
    }

    #[tokio::test]
    async fn test_open_unknown_device() {
        let root = camera_root();
        let backend = ReplayBackend::new(root.path());

        let result = backend
            .open(&VideoConstraints::DeviceId("missing".into()))
            .await;
        assert!(matches!(result, Err(CameraError::DeviceUnavailable(_))));
    }

    #[tokio::test]
    async fn test_open_rejects_ids_outside_root() {
        let outer = tempfile::tempdir().unwrap();
        let root = outer.path().join("cameras");
        std::fs::create_dir(&root).unwrap();
        std::fs::create_dir(root.join("front")).unwrap();
        let elsewhere = outer.path().join("elsewhere");
        std::fs::create_dir(&elsewhere).unwrap();
        write_frame(&elsewhere.join("001.png"));

        let backend = ReplayBackend::new(&root);
        for id in [
            "../elsewhere".to_string(),
            elsewhere.display().to_string(),
            "front/..".to_string(),
        ] {
            let result = backend.open(&VideoConstraints::DeviceId(id)).await;
            assert!(matches!(result, Err(CameraError::DeviceUnavailable(_))));
        }
        assert_ok!(
            backend
                .open(&VideoConstraints::DeviceId("front".into()))
                .await
        );
    }

    #[tokio::test]
    async fn test_missing_root_is_unavailable() {
        let backend = ReplayBackend::new("/nonexistent/wifi-qr-cameras");
        let result = backend.list_video_inputs().await;
        assert!(matches!(result, Err(CameraError::DeviceUnavailable(_))));
    }

    #[tokio::test]
    async fn test_stream_replays_frames_then_ends() {
        let root = camera_root();
        let backend = ReplayBackend::new(root.path());
        let mut stream = assert_ok!(
            backend
                .open(&VideoConstraints::DeviceId("usb-rear".into()))
                .await
        );

        for _ in 0..2 {
            let frame = assert_ok!(stream.next_frame().await).unwrap();
            assert_eq!((frame.width, frame.height), (4, 3));
            assert_eq!(frame.pixels.len(), 4 * 3 * 4);
        }
        assert_eq!(stream.next_frame().await, Err(CameraError::StreamEnded));
    }

    #[tokio::test]
    async fn test_stopped_stream_yields_no_frames() {
        let root = camera_root();
        let backend = ReplayBackend::new(root.path());
        let mut stream = assert_ok!(
            backend
                .open(&VideoConstraints::DeviceId("usb-rear".into()))
                .await
        );

        stream.stop();
        stream.stop();
        assert_eq!(stream.next_frame().await, Err(CameraError::StreamEnded));
    }
}
