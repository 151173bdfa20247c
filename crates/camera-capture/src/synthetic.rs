//! Deterministic synthetic camera backend
//!
//! Generates frames whose center-region texture matches a scripted scene,
//! so presence heuristics behave predictably in simulation and tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use crate::frame::VideoFrame;
use crate::{Camera, CameraConfig, CameraError};

/// What the synthetic camera is currently pointed at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntheticScene {
    /// A candidate is in front of the camera (textured center region)
    Candidate,
    /// Nobody in frame (flat background)
    Empty,
    /// Lens covered or device fault (capture errors)
    Obstructed,
}

/// Scripted camera producing deterministic frames
pub struct SyntheticCamera {
    scene: Arc<Mutex<SyntheticScene>>,
    config: Option<CameraConfig>,
    permission_granted: bool,
    device_present: bool,
    live: Arc<AtomicBool>,
    sequence: u32,
}

impl SyntheticCamera {
    /// Create a camera that will grant permission on open
    pub fn new(scene: SyntheticScene) -> Self {
        Self {
            scene: Arc::new(Mutex::new(scene)),
            config: None,
            permission_granted: true,
            device_present: true,
            live: Arc::new(AtomicBool::new(false)),
            sequence: 0,
        }
    }

    /// Create a camera whose open call is denied by the user
    pub fn denied() -> Self {
        Self {
            permission_granted: false,
            ..Self::new(SyntheticScene::Empty)
        }
    }

    /// Create a host environment with no capture device at all
    pub fn unavailable() -> Self {
        Self {
            device_present: false,
            ..Self::new(SyntheticScene::Empty)
        }
    }

    /// Handle for switching the scene while the stream is live
    pub fn scene_handle(&self) -> Arc<Mutex<SyntheticScene>> {
        Arc::clone(&self.scene)
    }

    /// Flag that mirrors whether the stream is live, observable after
    /// the camera has been moved into its owner
    pub fn live_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.live)
    }

    fn render(&self, scene: SyntheticScene, config: &CameraConfig) -> VideoFrame {
        let (w, h) = (config.width, config.height);
        let mut data = vec![24u8; (w * h * 3) as usize];

        if scene == SyntheticScene::Candidate {
            // Checkered patch in the center third, bright enough to give the
            // region a high luminance variance.
            let (cx, cy) = (w / 3, h / 3);
            for y in cy..(2 * cy) {
                for x in cx..(2 * cx) {
                    let idx = ((y * w + x) * 3) as usize;
                    let level = if (x + y) % 2 == 0 { 220 } else { 40 };
                    data[idx] = level;
                    data[idx + 1] = level;
                    data[idx + 2] = level;
                }
            }
        }

        VideoFrame::new(data, w, h, self.sequence as u64 * 1_000_000, self.sequence)
    }
}

impl Camera for SyntheticCamera {
    fn open(&mut self, config: &CameraConfig) -> Result<(), CameraError> {
        if !self.device_present {
            info!("synthetic camera: no device");
            return Err(CameraError::NoDevice);
        }
        if !self.permission_granted {
            info!("synthetic camera: permission denied");
            return Err(CameraError::PermissionDenied);
        }
        info!(
            width = config.width,
            height = config.height,
            "synthetic camera stream started"
        );
        self.config = Some(config.clone());
        self.live.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn capture(&mut self) -> Result<VideoFrame, CameraError> {
        let config = self.config.as_ref().ok_or(CameraError::NotOpen)?.clone();
        let scene = *self.scene.lock().map_err(|e| CameraError::Stream(e.to_string()))?;

        if scene == SyntheticScene::Obstructed {
            return Err(CameraError::Stream("sensor obstructed".into()));
        }

        self.sequence = self.sequence.wrapping_add(1);
        Ok(self.render(scene, &config))
    }

    fn release(&mut self) {
        if self.config.take().is_some() {
            self.live.store(false, Ordering::SeqCst);
            debug!("synthetic camera stream stopped");
        }
    }

    fn is_open(&self) -> bool {
        self.config.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denied_camera_never_opens() {
        let mut camera = SyntheticCamera::denied();
        assert!(matches!(
            camera.open(&CameraConfig::default()),
            Err(CameraError::PermissionDenied)
        ));
        assert!(!camera.is_open());
    }

    #[test]
    fn test_capture_requires_open() {
        let mut camera = SyntheticCamera::new(SyntheticScene::Candidate);
        assert!(matches!(camera.capture(), Err(CameraError::NotOpen)));

        camera.open(&CameraConfig::default()).unwrap();
        let frame = camera.capture().unwrap();
        assert_eq!(frame.width, 640);
        assert_eq!(frame.sequence, 1);
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut camera = SyntheticCamera::new(SyntheticScene::Empty);
        camera.open(&CameraConfig::default()).unwrap();
        camera.release();
        camera.release();
        assert!(!camera.is_open());
        assert!(matches!(camera.capture(), Err(CameraError::NotOpen)));
    }

    #[test]
    fn test_scene_switch_changes_frames() {
        let mut camera = SyntheticCamera::new(SyntheticScene::Candidate);
        let scene = camera.scene_handle();
        camera.open(&CameraConfig::default()).unwrap();

        let with_candidate = camera.capture().unwrap();
        *scene.lock().unwrap() = SyntheticScene::Empty;
        let empty = camera.capture().unwrap();

        assert_ne!(with_candidate.data, empty.data);
    }
}
