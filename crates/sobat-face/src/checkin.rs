//! Check-in protocol: the JSON documents the API reads back from the
//! `detect-face` and `compare-faces` subprocesses.

use crate::engine::{EngineError, FaceEngine};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Euclidean distance cutoff for unit-length ArcFace encodings.
pub const DEFAULT_TOLERANCE: f32 = 1.10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DetectResponse {
    Success { face_count: usize, message: String },
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CompareResponse {
    Success {
        #[serde(rename = "match")]
        matched: bool,
        distance: f64,
    },
    Error {
        message: String,
    },
}

impl DetectResponse {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

impl CompareResponse {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

fn load_rgb(path: &Path) -> Result<RgbImage, EngineError> {
    Ok(image::open(path)?.to_rgb8())
}

/// Count faces in a photo. A photo without faces is still a success.
pub fn detect(engine: &mut dyn FaceEngine, image_path: &Path) -> DetectResponse {
    if !image_path.exists() {
        return DetectResponse::error(format!("File not found at {}", image_path.display()));
    }

    let faces = match load_rgb(image_path).and_then(|image| engine.locate(&image)) {
        Ok(faces) => faces,
        Err(e) => {
            tracing::warn!(path = %image_path.display(), error = %e, "detect failed");
            return DetectResponse::error(e.to_string());
        }
    };

    let face_count = faces.len();
    tracing::info!(path = %image_path.display(), face_count, "detect");
    DetectResponse::Success {
        face_count,
        message: format!("Detected {face_count} face(s)."),
    }
}

/// Compare the enrolled photo against a check-in photo.
///
/// The most confident face of `known` is the reference; `unknown` must
/// contain exactly one face.
pub fn compare(
    engine: &mut dyn FaceEngine,
    known: &Path,
    unknown: &Path,
    tolerance: f32,
) -> CompareResponse {
    match try_compare(engine, known, unknown, tolerance) {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(error = %e, "compare failed");
            CompareResponse::error(e.to_string())
        }
    }
}

fn try_compare(
    engine: &mut dyn FaceEngine,
    known: &Path,
    unknown: &Path,
    tolerance: f32,
) -> Result<CompareResponse, EngineError> {
    let known_encodings = engine.encode(&load_rgb(known)?)?;
    let Some(reference) = known_encodings.first() else {
        return Ok(CompareResponse::error("No face found in known image"));
    };

    let unknown_encodings = engine.encode(&load_rgb(unknown)?)?;
    let candidate = match unknown_encodings.as_slice() {
        [] => return Ok(CompareResponse::error("No face found in check-in image")),
        [one] => one,
        _ => {
            return Ok(CompareResponse::error(
                "Multiple faces detected in check-in image",
            ))
        }
    };

    let distance = reference.distance(candidate);
    let matched = distance <= tolerance;
    tracing::info!(distance, tolerance, matched, "compare");
    Ok(CompareResponse::Success {
        matched,
        distance: f64::from(distance),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BoundingBox, Embedding};
    use std::collections::HashMap;
    use std::path::PathBuf;

    /// Answers by image width, so each test photo picks its own faces.
    struct StubEngine {
        faces: HashMap<u32, Vec<Embedding>>,
    }

    impl StubEngine {
        fn new(entries: &[(u32, Vec<Vec<f32>>)]) -> Self {
            let faces = entries
                .iter()
                .map(|(width, encodings)| {
                    let encodings = encodings
                        .iter()
                        .map(|v| Embedding::new(v.clone()).normalized())
                        .collect();
                    (*width, encodings)
                })
                .collect();
            Self { faces }
        }

        fn lookup(&self, image: &RgbImage) -> Vec<Embedding> {
            self.faces.get(&image.width()).cloned().unwrap_or_default()
        }
    }

    impl FaceEngine for StubEngine {
        fn locate(&mut self, image: &RgbImage) -> Result<Vec<BoundingBox>, EngineError> {
            Ok(self
                .lookup(image)
                .iter()
                .enumerate()
                .map(|(i, _)| BoundingBox {
                    x: i as f32 * 10.0,
                    y: 0.0,
                    width: 8.0,
                    height: 8.0,
                    confidence: 0.9,
                    landmarks: None,
                })
                .collect())
        }

        fn encode(&mut self, image: &RgbImage) -> Result<Vec<Embedding>, EngineError> {
            Ok(self.lookup(image))
        }
    }

    struct TempImage(PathBuf);

    impl TempImage {
        fn new(width: u32) -> Self {
            let path =
                std::env::temp_dir().join(format!("sobat-face-{}.png", uuid::Uuid::new_v4()));
            RgbImage::new(width, 4).save(&path).unwrap();
            Self(path)
        }
    }

    impl Drop for TempImage {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    const ALICE: [f32; 3] = [1.0, 0.0, 0.0];
    const ALICE_AGAIN: [f32; 3] = [0.95, 0.1, 0.0];
    const BOB: [f32; 3] = [0.0, 0.0, 1.0];

    fn engine() -> StubEngine {
        StubEngine::new(&[
            (10, vec![]),
            (11, vec![ALICE.to_vec()]),
            (12, vec![ALICE_AGAIN.to_vec()]),
            (13, vec![BOB.to_vec()]),
            (14, vec![ALICE_AGAIN.to_vec(), BOB.to_vec()]),
            (15, vec![ALICE.to_vec(), BOB.to_vec(), BOB.to_vec()]),
        ])
    }

    #[test]
    fn test_detect_zero_faces_is_success() {
        let img = TempImage::new(10);
        let response = detect(&mut engine(), &img.0);
        assert_eq!(
            response,
            DetectResponse::Success {
                face_count: 0,
                message: "Detected 0 face(s).".into()
            }
        );
    }

    #[test]
    fn test_detect_counts_faces() {
        let img = TempImage::new(15);
        match detect(&mut engine(), &img.0) {
            DetectResponse::Success { face_count, message } => {
                assert_eq!(face_count, 3);
                assert_eq!(message, "Detected 3 face(s).");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_detect_missing_file() {
        let path = Path::new("/nonexistent/photo.jpg");
        assert_eq!(
            detect(&mut engine(), path),
            DetectResponse::error("File not found at /nonexistent/photo.jpg")
        );
    }

    #[test]
    fn test_detect_undecodable_file_is_error() {
        let path = std::env::temp_dir().join(format!("sobat-face-{}.png", uuid::Uuid::new_v4()));
        std::fs::write(&path, b"not an image").unwrap();
        let response = detect(&mut engine(), &path);
        let _ = std::fs::remove_file(&path);
        assert!(matches!(response, DetectResponse::Error { .. }));
    }

    #[test]
    fn test_compare_same_subject_matches() {
        let (known, unknown) = (TempImage::new(11), TempImage::new(12));
        match compare(&mut engine(), &known.0, &unknown.0, DEFAULT_TOLERANCE) {
            CompareResponse::Success { matched, distance } => {
                assert!(matched);
                assert!(distance < 0.2, "distance {distance}");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_compare_different_subject_does_not_match() {
        let (known, unknown) = (TempImage::new(11), TempImage::new(13));
        match compare(&mut engine(), &known.0, &unknown.0, DEFAULT_TOLERANCE) {
            CompareResponse::Success { matched, distance } => {
                assert!(!matched);
                assert!((distance - 2f64.sqrt()).abs() < 1e-5);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_compare_no_face_in_known() {
        let (known, unknown) = (TempImage::new(10), TempImage::new(12));
        assert_eq!(
            compare(&mut engine(), &known.0, &unknown.0, DEFAULT_TOLERANCE),
            CompareResponse::error("No face found in known image")
        );
    }

    #[test]
    fn test_compare_no_face_in_checkin() {
        let (known, unknown) = (TempImage::new(11), TempImage::new(10));
        assert_eq!(
            compare(&mut engine(), &known.0, &unknown.0, DEFAULT_TOLERANCE),
            CompareResponse::error("No face found in check-in image")
        );
    }

    #[test]
    fn test_compare_multiple_faces_rejected_even_with_matching_subject() {
        let (known, unknown) = (TempImage::new(11), TempImage::new(14));
        assert_eq!(
            compare(&mut engine(), &known.0, &unknown.0, DEFAULT_TOLERANCE),
            CompareResponse::error("Multiple faces detected in check-in image")
        );
    }

    #[test]
    fn test_compare_uses_first_known_face() {
        let (known, unknown) = (TempImage::new(15), TempImage::new(12));
        assert!(matches!(
            compare(&mut engine(), &known.0, &unknown.0, DEFAULT_TOLERANCE),
            CompareResponse::Success { matched: true, .. }
        ));
    }

    #[test]
    fn test_compare_tolerance_is_inclusive() {
        let (known, unknown) = (TempImage::new(11), TempImage::new(13));
        let tolerance = 2f32.sqrt();
        assert!(matches!(
            compare(&mut engine(), &known.0, &unknown.0, tolerance),
            CompareResponse::Success { matched: true, .. }
        ));
    }

    #[test]
    fn test_compare_missing_file_is_error() {
        let known = TempImage::new(11);
        let response = compare(
            &mut engine(),
            &known.0,
            Path::new("/nonexistent/checkin.jpg"),
            DEFAULT_TOLERANCE,
        );
        assert!(matches!(response, CompareResponse::Error { .. }));
    }

    #[test]
    fn test_response_json_shape() {
        let detect = serde_json::to_value(DetectResponse::Success {
            face_count: 1,
            message: "Detected 1 face(s).".into(),
        })
        .unwrap();
        assert_eq!(
            detect,
            serde_json::json!({
                "status": "success",
                "face_count": 1,
                "message": "Detected 1 face(s)."
            })
        );

        let compare = serde_json::to_value(CompareResponse::Success {
            matched: false,
            distance: 1.5,
        })
        .unwrap();
        assert_eq!(
            compare,
            serde_json::json!({"status": "success", "match": false, "distance": 1.5})
        );

        let error = serde_json::to_value(CompareResponse::error("Missing arguments")).unwrap();
        assert_eq!(
            error,
            serde_json::json!({"status": "error", "message": "Missing arguments"})
        );
    }
}
