//! Detection plus encoding behind one seam, so check-in logic can run
//! against the ONNX models or a stand-in.

use crate::detector::{DetectorError, FaceDetector};
use crate::recognizer::{FaceRecognizer, RecognizerError};
use crate::types::{BoundingBox, Embedding};
use image::RgbImage;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const SCRFD_MODEL_FILE: &str = "det_10g.onnx";
pub const ARCFACE_MODEL_FILE: &str = "w600k_r50.onnx";

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("detector error: {0}")]
    Detector(#[from] DetectorError),
    #[error("recognizer error: {0}")]
    Recognizer(#[from] RecognizerError),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Face inference used by the check-in operations.
pub trait FaceEngine {
    /// Face boxes in the photo, most confident first.
    fn locate(&mut self, image: &RgbImage) -> Result<Vec<BoundingBox>, EngineError>;

    /// One encoding per face found in the photo.
    fn encode(&mut self, image: &RgbImage) -> Result<Vec<Embedding>, EngineError>;
}

/// SCRFD + ArcFace running in ONNX Runtime.
pub struct OnnxEngine {
    detector: FaceDetector,
    recognizer: FaceRecognizer,
}

impl OnnxEngine {
    /// Load both models from `model_dir`. Fails fast if either is missing.
    pub fn load(model_dir: &Path) -> Result<Self, EngineError> {
        let detector = FaceDetector::load(&model_dir.join(SCRFD_MODEL_FILE))?;
        let recognizer = FaceRecognizer::load(&model_dir.join(ARCFACE_MODEL_FILE))?;
        tracing::info!(dir = %model_dir.display(), "face engine ready");
        Ok(Self {
            detector,
            recognizer,
        })
    }
}

impl FaceEngine for OnnxEngine {
    fn locate(&mut self, image: &RgbImage) -> Result<Vec<BoundingBox>, EngineError> {
        Ok(self.detector.detect(image)?)
    }

    fn encode(&mut self, image: &RgbImage) -> Result<Vec<Embedding>, EngineError> {
        let faces = self.detector.detect(image)?;
        let mut embeddings = Vec::with_capacity(faces.len());
        for face in &faces {
            embeddings.push(self.recognizer.extract(image, face)?);
        }
        Ok(embeddings)
    }
}

/// `$XDG_DATA_HOME/sobat/models`, falling back to `~/.local/share/sobat/models`.
pub fn default_model_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local/share")
        })
        .join("sobat")
        .join("models")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_models_reports_detector() {
        let result = OnnxEngine::load(Path::new("/nonexistent/sobat-models"));
        assert!(matches!(
            result,
            Err(EngineError::Detector(DetectorError::ModelNotFound(_)))
        ));
    }

    #[test]
    fn test_default_model_dir_suffix() {
        assert!(default_model_dir().ends_with("sobat/models"));
    }
}
