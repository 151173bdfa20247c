//! Face detection backends

use image::imageops::FilterType;
use ndarray::Array4;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use camera_capture::VideoFrame;

use crate::{PresenceConfig, PresenceError};

/// Detected face region in frame coordinates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceObservation {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Detection confidence (0-1)
    pub confidence: f32,
}

/// One detection pass against a live frame.
///
/// `Ok(None)` means no face; `Err` means the pass was inconclusive and
/// the caller should treat it as neither presence nor absence.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &VideoFrame) -> Result<Option<FaceObservation>, PresenceError>;
}

/// Build the detector configured for this session.
pub fn build_detector(config: &PresenceConfig) -> Result<Box<dyn FaceDetector>, PresenceError> {
    match &config.model_path {
        Some(path) => Ok(Box::new(OnnxFaceDetector::load(path)?)),
        None => {
            warn!("No face model configured, using luminance heuristic detector");
            Ok(Box::new(LuminanceFaceDetector::default()))
        }
    }
}

/// ONNX face detector (BlazeFace-class model)
pub struct OnnxFaceDetector {
    session: Session,
    heuristic: LuminanceFaceDetector,
}

impl OnnxFaceDetector {
    const INPUT_SIZE: u32 = 128;

    /// Load the detection model; failure here is a fatal setup error.
    pub fn load(path: &str) -> Result<Self, PresenceError> {
        info!("Loading face detection model from {}", path);
        let session = Session::builder()
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|b| b.commit_from_file(path))
            .map_err(|e| {
                error!("Failed to load face model: {}", e);
                PresenceError::ModelLoad(e.to_string())
            })?;

        Ok(Self {
            session,
            heuristic: LuminanceFaceDetector::default(),
        })
    }

    fn preprocess(&self, frame: &VideoFrame) -> Result<Array4<f32>, PresenceError> {
        let img = image::ImageBuffer::<image::Rgb<u8>, _>::from_raw(
            frame.width,
            frame.height,
            frame.data.clone(),
        )
        .ok_or_else(|| PresenceError::Detection("frame buffer size mismatch".into()))?;

        let size = Self::INPUT_SIZE;
        let resized = image::imageops::resize(&img, size, size, FilterType::Triangle);

        // Model expects 1x3xHxW normalized to -1..1
        let mut input = Array4::<f32>::zeros((1, 3, size as usize, size as usize));
        for (x, y, pixel) in resized.enumerate_pixels() {
            input[[0, 0, y as usize, x as usize]] = (pixel[0] as f32 / 127.5) - 1.0;
            input[[0, 1, y as usize, x as usize]] = (pixel[1] as f32 / 127.5) - 1.0;
            input[[0, 2, y as usize, x as usize]] = (pixel[2] as f32 / 127.5) - 1.0;
        }
        Ok(input)
    }
}

impl FaceDetector for OnnxFaceDetector {
    fn detect(&mut self, frame: &VideoFrame) -> Result<Option<FaceObservation>, PresenceError> {
        let input = self.preprocess(frame)?;

        let inputs =
            ort::inputs![input].map_err(|e| PresenceError::Detection(e.to_string()))?;
        self.session
            .run(inputs)
            .map_err(|e| PresenceError::Detection(e.to_string()))?;

        // TODO(anchor-decode): port the BlazeFace anchor decoding so the
        // observation comes from the model output; until then the model
        // run gates health and the heuristic supplies the observation.
        self.heuristic.detect(frame)
    }
}

/// Heuristic detector: a face-bearing center region has high luminance
/// variance, an empty scene is flat.
#[derive(Debug, Clone)]
pub struct LuminanceFaceDetector {
    /// Minimum grayscale variance counted as a face
    pub variance_threshold: f32,
}

impl Default for LuminanceFaceDetector {
    fn default() -> Self {
        Self {
            variance_threshold: 400.0,
        }
    }
}

impl FaceDetector for LuminanceFaceDetector {
    fn detect(&mut self, frame: &VideoFrame) -> Result<Option<FaceObservation>, PresenceError> {
        let region = frame
            .center_third()
            .ok_or_else(|| PresenceError::Detection("frame too small".into()))?;

        let gray = region.to_grayscale();
        if gray.is_empty() {
            return Err(PresenceError::Detection("empty frame region".into()));
        }

        let mean = gray.iter().map(|&v| v as f32).sum::<f32>() / gray.len() as f32;
        let variance = gray
            .iter()
            .map(|&v| {
                let d = v as f32 - mean;
                d * d
            })
            .sum::<f32>()
            / gray.len() as f32;

        if variance >= self.variance_threshold {
            Ok(Some(FaceObservation {
                x: (frame.width / 3) as f32,
                y: (frame.height / 3) as f32,
                width: (frame.width / 3) as f32,
                height: (frame.height / 3) as f32,
                confidence: (variance / (variance + self.variance_threshold)).min(1.0),
            }))
        } else {
            Ok(None)
        }
    }
}
