//! Camera Capture Abstraction for Proctored Sessions
//!
//! Models the host environment's media-capture permission flow:
//! - Permission grant/denial as distinct open outcomes
//! - Frame-by-frame capture from an exclusively owned stream
//! - Deterministic release of the stream on every exit path
//!
//! Real deployments wire a platform backend behind the [`Camera`] trait;
//! the [`SyntheticCamera`] backend generates deterministic frames for
//! simulation and tests.

pub mod frame;
pub mod synthetic;

pub use frame::VideoFrame;
pub use synthetic::{SyntheticCamera, SyntheticScene};

use thiserror::Error;

/// Camera error types
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Camera permission denied by the user")]
    PermissionDenied,

    #[error("No capture device available")]
    NoDevice,

    #[error("Streaming error: {0}")]
    Stream(String),

    #[error("Camera not open")]
    NotOpen,
}

/// Camera configuration
#[derive(Debug, Clone)]
pub struct CameraConfig {
    /// Capture width
    pub width: u32,
    /// Capture height
    pub height: u32,
    /// Target FPS
    pub fps: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self::proctoring()
    }
}

impl CameraConfig {
    /// Low-resolution config for presence proctoring
    pub fn proctoring() -> Self {
        Self {
            width: 640,
            height: 480,
            fps: 15,
        }
    }
}

/// A permission-gated camera stream.
///
/// `open` performs the host permission flow and must succeed before
/// `capture`. `release` stops all tracks and is idempotent; callers may
/// invoke it multiple times, including after an error.
pub trait Camera: Send {
    /// Request access and start the stream.
    fn open(&mut self, config: &CameraConfig) -> Result<(), CameraError>;

    /// Capture the most recent frame.
    fn capture(&mut self) -> Result<VideoFrame, CameraError>;

    /// Stop all tracks. Idempotent.
    fn release(&mut self);

    /// Whether the stream is currently live.
    fn is_open(&self) -> bool;
}
