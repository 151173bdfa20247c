//! Presence monitor configuration

use serde::{Deserialize, Serialize};

use camera_capture::CameraConfig;

/// Presence monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceConfig {
    /// Sustained absence tolerated before the absence signal fires (ms)
    pub absence_grace_ms: u64,

    /// Detection pass interval (ms)
    pub poll_interval_ms: u64,

    /// Minimum detection confidence counted as presence
    pub min_confidence: f32,

    /// Face detection model path; heuristic detector when absent
    pub model_path: Option<String>,

    /// Camera capture settings
    #[serde(skip)]
    pub camera: CameraConfig,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            absence_grace_ms: 3000,
            poll_interval_ms: 200,
            min_confidence: 0.7,
            model_path: None,
            camera: CameraConfig::proctoring(),
        }
    }
}

impl PresenceConfig {
    /// Stricter proctoring (shorter grace, tighter confidence)
    pub fn strict() -> Self {
        Self {
            absence_grace_ms: 1500,
            min_confidence: 0.85,
            ..Default::default()
        }
    }

    /// More forgiving proctoring for low-light environments
    pub fn lenient() -> Self {
        Self {
            absence_grace_ms: 5000,
            min_confidence: 0.5,
            ..Default::default()
        }
    }
}
