//! Presence monitor: inference loop and visibility watcher

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use camera_capture::{Camera, CameraError};

use crate::detector::{build_detector, FaceDetector};
use crate::{AcquireError, PresenceConfig, PresenceError};

/// Signals the monitor raises toward the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceSignal {
    /// No face for the full grace window
    Absent,
    /// Face re-detected while the grace countdown was running
    Returned,
    /// Page backgrounded (zero tolerance)
    Hidden,
}

/// Host page visibility, as reported by the embedding environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageVisibility {
    #[default]
    Visible,
    Hidden,
}

/// Owns the camera stream, the detection loop, and the visibility
/// watcher for one session.
///
/// The camera is exclusively held from `acquire` until `release`;
/// `release` is idempotent and also runs on drop, so the stream cannot
/// outlive the session under any exit path.
pub struct PresenceMonitor {
    config: PresenceConfig,
    camera: Arc<Mutex<Box<dyn Camera>>>,
    detector: Option<Box<dyn FaceDetector>>,
    tasks: Vec<JoinHandle<()>>,
    released: bool,
}

impl PresenceMonitor {
    /// Request camera access and load the detection model.
    ///
    /// Permission denial and setup failure are reported separately; the
    /// caller treats denial as an eligibility gate and setup failure as
    /// fatal.
    pub fn acquire(
        mut camera: Box<dyn Camera>,
        config: PresenceConfig,
    ) -> Result<Self, AcquireError> {
        match camera.open(&config.camera) {
            Ok(()) => {}
            Err(CameraError::PermissionDenied) => {
                info!("camera permission denied");
                return Err(AcquireError::PermissionDenied);
            }
            Err(e) => return Err(AcquireError::Setup(PresenceError::Camera(e))),
        }

        let detector = build_detector(&config).map_err(|e| {
            // The stream was live; do not leak it past a failed setup.
            camera.release();
            AcquireError::Setup(e)
        })?;

        info!(
            grace_ms = config.absence_grace_ms,
            poll_ms = config.poll_interval_ms,
            "presence monitor ready"
        );

        Ok(Self {
            config,
            camera: Arc::new(Mutex::new(camera)),
            detector: Some(detector),
            tasks: Vec::new(),
            released: false,
        })
    }

    /// Acquire with a caller-supplied detector (scripted backends).
    pub fn acquire_with_detector(
        mut camera: Box<dyn Camera>,
        detector: Box<dyn FaceDetector>,
        config: PresenceConfig,
    ) -> Result<Self, AcquireError> {
        match camera.open(&config.camera) {
            Ok(()) => {}
            Err(CameraError::PermissionDenied) => return Err(AcquireError::PermissionDenied),
            Err(e) => return Err(AcquireError::Setup(PresenceError::Camera(e))),
        }
        Ok(Self {
            config,
            camera: Arc::new(Mutex::new(camera)),
            detector: Some(detector),
            tasks: Vec::new(),
            released: false,
        })
    }

    /// Start the detection loop.
    ///
    /// Zero faces starts the grace countdown; a face seen before the
    /// threshold cancels it (`Returned`); a full grace window with no
    /// face emits `Absent` exactly once and the loop stops. A pass that
    /// errors counts as neither presence nor absence.
    pub fn start(&mut self, signals: mpsc::Sender<PresenceSignal>) {
        let Some(mut detector) = self.detector.take() else {
            warn!("detection loop already started");
            return;
        };

        let camera = Arc::clone(&self.camera);
        let grace = Duration::from_millis(self.config.absence_grace_ms);
        let poll = Duration::from_millis(self.config.poll_interval_ms);
        let min_confidence = self.config.min_confidence;

        let handle = tokio::spawn(async move {
            let mut ticker = interval(poll);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut absent_since: Option<Instant> = None;

            loop {
                ticker.tick().await;

                let frame = {
                    let mut camera = match camera.lock() {
                        Ok(camera) => camera,
                        Err(_) => break,
                    };
                    if !camera.is_open() {
                        break;
                    }
                    camera.capture()
                };

                let observation = match frame {
                    Ok(frame) => detector.detect(&frame),
                    Err(e) => Err(PresenceError::Camera(e)),
                };

                match observation {
                    Ok(Some(face)) if face.confidence >= min_confidence => {
                        if absent_since.take().is_some() {
                            debug!("face re-detected inside grace window");
                            if signals.send(PresenceSignal::Returned).await.is_err() {
                                break;
                            }
                        }
                    }
                    Ok(_) => {
                        let since = *absent_since.get_or_insert_with(Instant::now);
                        if since.elapsed() >= grace {
                            info!(grace_ms = grace.as_millis() as u64, "sustained absence");
                            let _ = signals.send(PresenceSignal::Absent).await;
                            break;
                        }
                    }
                    Err(e) => {
                        // Inconclusive pass: keep the loop alive.
                        debug!("detection pass inconclusive: {}", e);
                    }
                }
            }
        });

        self.tasks.push(handle);
    }

    /// Watch page visibility; `Hidden` is signalled immediately, with no
    /// grace period, including when the page is already hidden here.
    pub fn observe_visibility(
        &mut self,
        mut visibility: watch::Receiver<PageVisibility>,
        signals: mpsc::Sender<PresenceSignal>,
    ) {
        let handle = tokio::spawn(async move {
            loop {
                if *visibility.borrow_and_update() == PageVisibility::Hidden {
                    info!("assessment page hidden");
                    let _ = signals.send(PresenceSignal::Hidden).await;
                    break;
                }
                if visibility.changed().await.is_err() {
                    break;
                }
            }
        });

        self.tasks.push(handle);
    }

    /// Stop the loops and the camera stream. Idempotent.
    pub fn release(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
        if let Ok(mut camera) = self.camera.lock() {
            camera.release();
        }
        if !self.released {
            self.released = true;
            info!("presence monitor released");
        }
    }
}

impl Drop for PresenceMonitor {
    fn drop(&mut self) {
        self.release();
    }
}
