//! sobat-face — Face detection and comparison for attendance check-in.
//!
//! Detection (SCRFD) and encoding (ArcFace) run inside ONNX Runtime; this
//! crate prepares inputs, decodes outputs and turns results into the JSON
//! documents returned to the check-in API.

pub mod alignment;
pub mod checkin;
pub mod detector;
pub mod engine;
pub mod recognizer;
mod session;
pub mod types;

pub use checkin::{CompareResponse, DetectResponse, DEFAULT_TOLERANCE};
pub use detector::FaceDetector;
pub use engine::{default_model_dir, EngineError, FaceEngine, OnnxEngine};
pub use recognizer::FaceRecognizer;
pub use types::{BoundingBox, Embedding};
