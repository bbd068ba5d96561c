//! Camera scan session with state machine

use std::{collections::HashSet, sync::Arc, time::Duration};
use tokio::{
    sync::{Mutex, RwLock, broadcast},
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};

use crate::{
    backend::{CameraBackend, FrameSource},
    core::{
        error::{SessionError, SessionResult},
        sampler::{CancelFlag, FrameSampler, SamplerOutcome},
        types::{CameraDevice, DetectionResult, ScanState, VideoConstraints},
    },
    protocol::{Notification, ScanStateChangedParams},
    qr::QrDecoder,
    storage::{KeyValueStore, LAST_CAMERA_KEY},
};

const NOTIFICATION_CAPACITY: usize = 64;

/// Scan session state machine
///
/// Tracks the session state, the selected camera and the detection kept on
/// display while paused.
#[derive(Debug)]
struct SessionStateMachine {
    state: ScanState,
    selected_device: Option<String>,
    displayed: Option<DetectionResult>,
}

impl SessionStateMachine {
    fn new() -> Self {
        Self {
            state: ScanState::Idle,
            selected_device: None,
            displayed: None,
        }
    }

    /// Begin acquiring a camera
    fn begin_start(&mut self) -> SessionResult<()> {
        match self.state {
            ScanState::Starting => Err(SessionError::OperationInProgress),
            _ => {
                self.state = ScanState::Starting;
                self.displayed = None;
                Ok(())
            }
        }
    }

    /// Camera acquired
    fn start_succeeded(&mut self, device_id: String) {
        self.state = ScanState::Scanning;
        self.selected_device = Some(device_id);
    }

    /// Camera acquisition failed; selection is left as it was
    fn start_failed(&mut self) {
        self.state = ScanState::Idle;
    }

    /// Start dropped before it finished, returns true if the state changed
    fn abandon_start(&mut self) -> bool {
        if self.state != ScanState::Starting {
            return false;
        }
        self.state = ScanState::Idle;
        true
    }

    /// Record a Wi-Fi detection, returns false if no longer scanning
    fn detected(&mut self, result: DetectionResult) -> bool {
        if self.state != ScanState::Scanning {
            return false;
        }
        self.state = ScanState::Paused;
        self.displayed = Some(result);
        true
    }

    /// Returns true if the state changed
    fn pause(&mut self) -> SessionResult<bool> {
        match self.state {
            ScanState::Scanning => {
                self.state = ScanState::Paused;
                Ok(true)
            }
            ScanState::Paused => Ok(false),
            from => Err(SessionError::InvalidStateTransition {
                from,
                to: ScanState::Paused,
            }),
        }
    }

    /// Returns true if there was anything to stop
    fn stop(&mut self) -> bool {
        self.displayed = None;
        match self.state {
            ScanState::Idle | ScanState::Stopped => false,
            _ => {
                self.state = ScanState::Stopped;
                true
            }
        }
    }

    fn finish_stop(&mut self) {
        if self.state == ScanState::Stopped {
            self.state = ScanState::Idle;
        }
    }

    /// Stream died underneath a running scan
    fn source_lost(&mut self) -> bool {
        if self.state != ScanState::Scanning {
            return false;
        }
        self.state = ScanState::Idle;
        true
    }

    fn select(&mut self, device_id: Option<String>) {
        self.selected_device = device_id;
    }

    fn state(&self) -> ScanState {
        self.state
    }
}

/// Sampler task reading from one open stream
struct ScanWorker<D: QrDecoder> {
    cancel: CancelFlag,
    handle: JoinHandle<FrameSampler<D>>,
}

/// Sampler parked between runs, or the worker currently holding it
struct WorkerSlot<D: QrDecoder> {
    sampler: Option<FrameSampler<D>>,
    running: Option<ScanWorker<D>>,
}

/// Returns the session to idle if a start is dropped midway
///
/// Camera requests may wait forever on a permission prompt; callers may put
/// `start` under a timeout and drop it.
struct PendingStart {
    state_machine: Arc<RwLock<SessionStateMachine>>,
    events: broadcast::Sender<Notification>,
    armed: bool,
}

impl PendingStart {
    fn new(
        state_machine: Arc<RwLock<SessionStateMachine>>,
        events: broadcast::Sender<Notification>,
    ) -> Self {
        Self {
            state_machine,
            events,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingStart {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        info!("Camera request abandoned");

        match self.state_machine.try_write() {
            Ok(mut sm) => {
                if sm.abandon_start() {
                    let _ = self.events.send(Notification::state(ScanState::Idle));
                }
            }
            Err(_) => {
                let Ok(runtime) = tokio::runtime::Handle::try_current() else {
                    return;
                };
                let state_machine = self.state_machine.clone();
                let events = self.events.clone();
                runtime.spawn(async move {
                    if state_machine.write().await.abandon_start() {
                        let _ = events.send(Notification::state(ScanState::Idle));
                    }
                });
            }
        }
    }
}

/// Camera scan session
///
/// Owns at most one camera stream at a time. Commands are serialized; a
/// command needing the camera first tears down any running worker and
/// releases its stream.
pub struct ScanSession<B: CameraBackend, D: QrDecoder + 'static, K: KeyValueStore> {
    backend: Arc<B>,
    store: Arc<K>,
    state_machine: Arc<RwLock<SessionStateMachine>>,
    worker: Mutex<WorkerSlot<D>>,
    events: broadcast::Sender<Notification>,
}

impl<B: CameraBackend, D: QrDecoder + 'static, K: KeyValueStore> ScanSession<B, D, K> {
    /// Create a new idle session
    pub fn new(backend: Arc<B>, store: Arc<K>, decoder: D, frame_interval: Duration) -> Self {
        let (events, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        Self {
            backend,
            store,
            state_machine: Arc::new(RwLock::new(SessionStateMachine::new())),
            worker: Mutex::new(WorkerSlot {
                sampler: Some(FrameSampler::new(decoder, frame_interval)),
                running: None,
            }),
            events,
        }
    }

    /// Subscribe to state changes and detections
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.events.subscribe()
    }

    /// List available cameras without acquiring any
    pub async fn list_devices(&self) -> SessionResult<Vec<CameraDevice>> {
        Ok(self.backend.list_video_inputs().await?)
    }

    /// List cameras and restore the remembered selection if still present
    pub async fn refresh_devices(&self) -> SessionResult<Vec<CameraDevice>> {
        let devices = self.list_devices().await?;

        match self.store.get(LAST_CAMERA_KEY).await {
            Ok(Some(saved)) if devices.iter().any(|d| d.id == saved) => {
                debug!("Restoring camera selection {}", saved);
                self.state_machine.write().await.select(Some(saved));
            }
            Ok(_) => {}
            Err(e) => warn!("Failed to read remembered camera: {}", e),
        }

        Ok(devices)
    }

    /// Choose the camera for the next start
    ///
    /// While scanning, the current stream is torn down and the new device
    /// acquired in its place.
    pub async fn select_device(&self, device_id: Option<String>) -> SessionResult<()> {
        let restart = {
            let mut sm = self.state_machine.write().await;
            sm.select(device_id);
            sm.state() == ScanState::Scanning
        };

        if restart {
            info!("Camera selection changed while scanning, restarting");
            self.start().await?;
        }
        Ok(())
    }

    /// Acquire the selected camera and start sampling
    ///
    /// Falls back to the rear camera when nothing is selected. Any stream
    /// still open is released first.
    pub async fn start(&self) -> SessionResult<()> {
        let mut slot = self.worker.lock().await;

        self.state_machine.write().await.begin_start()?;
        let pending = PendingStart::new(self.state_machine.clone(), self.events.clone());
        self.emit(Notification::state(ScanState::Starting));

        if let Err(e) = self.release(&mut slot).await {
            pending.disarm();
            self.fail_start(&e.to_string()).await;
            return Err(e);
        }
        if slot.sampler.is_none() {
            let e = SessionError::WorkerFailed("frame sampler unavailable".into());
            pending.disarm();
            self.fail_start(&e.to_string()).await;
            return Err(e);
        }

        let selected = self.state_machine.read().await.selected_device.clone();
        let constraints = VideoConstraints::for_selection(selected.as_deref());
        debug!(?constraints, "Requesting camera");

        let stream = match self.backend.open(&constraints).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Camera error: {}", e);
                pending.disarm();
                self.fail_start(e.user_message()).await;
                return Err(e.into());
            }
        };

        let device_id = stream.device_id().to_string();
        if let Err(e) = self.store.set(LAST_CAMERA_KEY, &device_id).await {
            warn!("Failed to remember camera {}: {}", device_id, e);
        }

        let Some(sampler) = slot.sampler.take() else {
            let e = SessionError::WorkerFailed("frame sampler unavailable".into());
            pending.disarm();
            self.fail_start(&e.to_string()).await;
            return Err(e);
        };
        self.state_machine
            .write()
            .await
            .start_succeeded(device_id.clone());
        pending.disarm();
        self.emit(Notification::ScanStateChanged(
            ScanStateChangedParams::on_device(ScanState::Scanning, device_id.clone()),
        ));
        info!("Scanning with camera {}", device_id);

        let cancel = CancelFlag::new();
        let handle = tokio::spawn(run_worker(
            sampler,
            stream,
            cancel.clone(),
            self.state_machine.clone(),
            self.events.clone(),
        ));
        slot.running = Some(ScanWorker { cancel, handle });

        Ok(())
    }

    /// Same as [`ScanSession::start`]; may pick up a newly selected camera
    pub async fn resume(&self) -> SessionResult<()> {
        self.start().await
    }

    /// Release the camera but keep the displayed detection
    pub async fn pause(&self) -> SessionResult<()> {
        let mut slot = self.worker.lock().await;
        self.release(&mut slot).await?;

        if self.state_machine.write().await.pause()? {
            info!("Scanning paused");
            self.emit(Notification::state(ScanState::Paused));
        }
        Ok(())
    }

    /// Release the camera and clear the displayed detection
    pub async fn stop(&self) -> SessionResult<()> {
        let mut slot = self.worker.lock().await;
        self.release(&mut slot).await?;

        let stopped = self.state_machine.write().await.stop();
        if stopped {
            self.emit(Notification::state(ScanState::Stopped));
            self.state_machine.write().await.finish_stop();
            self.emit(Notification::state(ScanState::Idle));
            info!("Scanning stopped");
        }
        Ok(())
    }

    /// Stop any stream and drop whatever result is on display
    pub async fn clear(&self) -> SessionResult<()> {
        self.stop().await
    }

    /// Get the current session state
    pub async fn state(&self) -> ScanState {
        self.state_machine.read().await.state()
    }

    /// Camera used for the next start
    pub async fn selected_device(&self) -> Option<String> {
        self.state_machine.read().await.selected_device.clone()
    }

    /// Wi-Fi detection kept on display while paused
    pub async fn last_detection(&self) -> Option<DetectionResult> {
        self.state_machine.read().await.displayed.clone()
    }

    /// Cancel the running worker and wait for it to release its stream
    async fn release(&self, slot: &mut WorkerSlot<D>) -> SessionResult<()> {
        // The worker stays in the slot until joined so an abandoned release
        // can be picked up again by the next command
        if let Some(worker) = slot.running.as_mut() {
            worker.cancel.cancel();
            let joined = (&mut worker.handle).await;
            slot.running = None;
            match joined {
                Ok(sampler) => slot.sampler = Some(sampler),
                Err(e) => {
                    error!("Scan worker failed: {}", e);
                    return Err(SessionError::WorkerFailed(e.to_string()));
                }
            }
        }
        Ok(())
    }

    async fn fail_start(&self, message: &str) {
        self.state_machine.write().await.start_failed();
        self.emit(Notification::ScanStateChanged(
            ScanStateChangedParams::with_error(ScanState::Idle, message.to_string()),
        ));
    }

    fn emit(&self, notification: Notification) {
        // No subscribers is fine
        let _ = self.events.send(notification);
    }
}

impl<B: CameraBackend, D: QrDecoder + 'static, K: KeyValueStore> Drop for ScanSession<B, D, K> {
    fn drop(&mut self) {
        if let Ok(slot) = self.worker.try_lock() {
            if let Some(worker) = &slot.running {
                worker.cancel.cancel();
            }
        }
    }
}

/// Sample one stream until a Wi-Fi code is found, the worker is cancelled or
/// the stream fails
///
/// Non Wi-Fi codes are reported once per distinct text and sampling goes on.
async fn run_worker<S: FrameSource, D: QrDecoder>(
    mut sampler: FrameSampler<D>,
    mut stream: S,
    cancel: CancelFlag,
    state_machine: Arc<RwLock<SessionStateMachine>>,
    events: broadcast::Sender<Notification>,
) -> FrameSampler<D> {
    let mut rejected: HashSet<String> = HashSet::new();

    loop {
        match sampler.run(&mut stream, &cancel).await {
            SamplerOutcome::Detected(result @ DetectionResult::WifiDetected { .. }) => {
                stream.stop();
                if state_machine.write().await.detected(result.clone()) {
                    info!("Wi-Fi QR detected, pausing camera");
                    let _ = events.send(Notification::detection(result));
                    let _ = events.send(Notification::state(ScanState::Paused));
                }
                break;
            }
            SamplerOutcome::Detected(DetectionResult::NonWifiQr { raw_text }) => {
                if !rejected.contains(&raw_text) {
                    info!("Ignoring QR code without Wi-Fi payload");
                    let _ = events.send(Notification::detection(DetectionResult::NonWifiQr {
                        raw_text: raw_text.clone(),
                    }));
                    rejected.insert(raw_text);
                }
            }
            SamplerOutcome::Detected(DetectionResult::NoDetection) => {}
            SamplerOutcome::Cancelled => {
                stream.stop();
                break;
            }
            SamplerOutcome::SourceFailed(e) => {
                stream.stop();
                warn!("Camera stream failed: {}", e);
                if state_machine.write().await.source_lost() {
                    let _ = events.send(Notification::ScanStateChanged(
                        ScanStateChangedParams::with_error(
                            ScanState::Idle,
                            e.user_message().to_string(),
                        ),
                    ));
                }
                break;
            }
        }
    }

    sampler
}
