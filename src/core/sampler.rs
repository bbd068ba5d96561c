//! Frame sampling loop

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, trace};

use crate::{
    backend::FrameSource,
    core::{error::CameraError, types::DetectionResult},
    qr::QrDecoder,
};

/// Default tick cadence, one refresh of a 60 Hz display
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Shared flag that stops a sampler before its next tick
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Why a sampling run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SamplerOutcome {
    /// A code was decoded; no further ticks are scheduled
    Detected(DetectionResult),
    /// The cancel flag was observed at the top of a tick
    Cancelled,
    /// The frame source failed or ran out of frames
    SourceFailed(CameraError),
}

/// Pulls frames from a source and tries to decode each one
///
/// Ticks are strictly sequential: a frame is requested only after the
/// previous decode attempt has returned.
#[derive(Debug)]
pub struct FrameSampler<D: QrDecoder> {
    decoder: D,
    interval: Duration,
}

impl<D: QrDecoder> FrameSampler<D> {
    pub fn new(decoder: D, interval: Duration) -> Self {
        Self {
            decoder,
            interval: interval.max(Duration::from_millis(1)),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    /// Sample until a code is decoded, the flag is cancelled or the source fails
    ///
    /// Decode misses are silent and the next tick is scheduled unconditionally.
    /// The first frame is requested one interval after the call.
    pub async fn run<S: FrameSource>(&mut self, source: &mut S, cancel: &CancelFlag) -> SamplerOutcome {
        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticks: u64 = 0;

        loop {
            ticker.tick().await;
            if cancel.is_cancelled() {
                debug!("Sampler cancelled after {} ticks", ticks);
                return SamplerOutcome::Cancelled;
            }
            ticks += 1;

            let frame = match source.next_frame().await {
                Ok(Some(frame)) => frame,
                Ok(None) => continue,
                Err(e) => {
                    debug!("Frame source failed after {} ticks: {}", ticks, e);
                    return SamplerOutcome::SourceFailed(e);
                }
            };

            match self.decoder.decode(&frame.pixels, frame.width, frame.height) {
                Some(text) => {
                    debug!("Decoded QR code on tick {}", ticks);
                    return SamplerOutcome::Detected(DetectionResult::from_decoded(text));
                }
                None => trace!("No code in frame {}", ticks),
            }
        }
    }
}
