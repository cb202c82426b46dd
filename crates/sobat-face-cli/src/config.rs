use sobat_face::{default_model_dir, DEFAULT_TOLERANCE};
use std::path::PathBuf;

/// Face binary configuration, loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceConfig {
    /// Directory containing `det_10g.onnx` and `w600k_r50.onnx`.
    pub model_dir: PathBuf,
    /// Largest encoding distance still accepted as the same person.
    pub tolerance: f32,
}

impl FaceConfig {
    /// Load configuration from `SOBAT_FACE_*` environment variables with defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let model_dir = lookup("SOBAT_FACE_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_model_dir);

        let tolerance = match lookup("SOBAT_FACE_TOLERANCE") {
            Some(raw) => parse_tolerance(&raw).unwrap_or_else(|| {
                tracing::warn!(value = %raw, "ignoring invalid SOBAT_FACE_TOLERANCE");
                DEFAULT_TOLERANCE
            }),
            None => DEFAULT_TOLERANCE,
        };

        Self {
            model_dir,
            tolerance,
        }
    }

    /// Apply command-line flags on top of the environment.
    pub fn with_overrides(mut self, model_dir: Option<PathBuf>, tolerance: Option<f32>) -> Self {
        if let Some(dir) = model_dir {
            self.model_dir = dir;
        }
        if let Some(t) = tolerance {
            self.tolerance = t;
        }
        self
    }
}

/// Accepts finite, positive distances only.
pub fn parse_tolerance(raw: &str) -> Option<f32> {
    raw.trim()
        .parse::<f32>()
        .ok()
        .filter(|t| t.is_finite() && *t > 0.0)
}

/// clap value parser for `--tolerance`.
pub fn tolerance_arg(raw: &str) -> Result<f32, String> {
    parse_tolerance(raw).ok_or_else(|| format!("{raw} is not a positive distance"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> FaceConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        FaceConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[]);
        assert_eq!(cfg.model_dir, default_model_dir());
        assert_eq!(cfg.tolerance, DEFAULT_TOLERANCE);
    }

    #[test]
    fn test_env_values() {
        let cfg = config(&[
            ("SOBAT_FACE_MODEL_DIR", "/opt/models"),
            ("SOBAT_FACE_TOLERANCE", "0.9"),
        ]);
        assert_eq!(cfg.model_dir, PathBuf::from("/opt/models"));
        assert_eq!(cfg.tolerance, 0.9);
    }

    #[test]
    fn test_invalid_tolerance_falls_back() {
        for raw in ["abc", "-1", "0", "NaN", "inf"] {
            let cfg = config(&[("SOBAT_FACE_TOLERANCE", raw)]);
            assert_eq!(cfg.tolerance, DEFAULT_TOLERANCE, "raw = {raw}");
        }
    }

    #[test]
    fn test_tolerance_arg() {
        assert_eq!(tolerance_arg("0.6"), Ok(0.6));
        assert!(tolerance_arg("-0.6").is_err());
    }

    #[test]
    fn test_flags_override_env() {
        let cfg = config(&[("SOBAT_FACE_TOLERANCE", "0.9")])
            .with_overrides(Some(PathBuf::from("/srv/models")), Some(0.7));
        assert_eq!(cfg.model_dir, PathBuf::from("/srv/models"));
        assert_eq!(cfg.tolerance, 0.7);

        let unchanged = config(&[("SOBAT_FACE_TOLERANCE", "0.9")]).with_overrides(None, None);
        assert_eq!(unchanged.tolerance, 0.9);
    }
}
