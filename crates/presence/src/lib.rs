//! Presence Monitor
//!
//! Continuous verification that a candidate remains in front of the
//! camera and on the assessment page:
//! - Face detection per bounded polling interval against the live frame
//! - A grace window for momentary look-aways before absence is signalled
//! - Zero-tolerance page-visibility watching (tab switches signal at once)
//! - Exclusive ownership of the camera stream, released on every exit path

pub mod config;
pub mod detector;
pub mod monitor;

pub use config::PresenceConfig;
pub use detector::{FaceDetector, FaceObservation, LuminanceFaceDetector, OnnxFaceDetector};
pub use monitor::{PageVisibility, PresenceMonitor, PresenceSignal};

use thiserror::Error;

/// Presence error types
#[derive(Error, Debug)]
pub enum PresenceError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Detection failed: {0}")]
    Detection(String),

    #[error("Camera error: {0}")]
    Camera(#[from] camera_capture::CameraError),
}

/// Why the monitor could not be brought up.
///
/// Permission denial is a hard eligibility gate for the session; setup
/// failures (model load, missing device) are fatal and require the
/// candidate to restart after fixing their environment.
#[derive(Error, Debug)]
pub enum AcquireError {
    #[error("Camera permission denied")]
    PermissionDenied,

    #[error("Proctoring setup failed: {0}")]
    Setup(#[source] PresenceError),
}
