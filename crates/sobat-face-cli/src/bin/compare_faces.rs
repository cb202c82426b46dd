use clap::Parser;
use sobat_face::checkin::{self, CompareResponse};
use sobat_face::OnnxEngine;
use sobat_face_cli::config::tolerance_arg;
use sobat_face_cli::{output, FaceConfig};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "compare-faces",
    version,
    about = "Compare an enrolled photo with a check-in photo, answer in JSON"
)]
struct Args {
    /// Enrolled reference photo
    known: PathBuf,
    /// Check-in photo; must show exactly one face
    unknown: PathBuf,
    /// Directory holding the ONNX models (overrides SOBAT_FACE_MODEL_DIR)
    #[arg(long)]
    model_dir: Option<PathBuf>,
    /// Largest accepted encoding distance (overrides SOBAT_FACE_TOLERANCE)
    #[arg(long, value_parser = tolerance_arg)]
    tolerance: Option<f32>,
}

fn main() -> ExitCode {
    output::init_logging();
    output::install_panic_hook();

    let args = match output::parse_args::<Args>() {
        Ok(args) => args,
        Err(code) => return code,
    };
    let config = FaceConfig::from_env().with_overrides(args.model_dir, args.tolerance);

    let response = match OnnxEngine::load(&config.model_dir) {
        Ok(mut engine) => {
            checkin::compare(&mut engine, &args.known, &args.unknown, config.tolerance)
        }
        Err(e) => {
            tracing::error!(
                error = %e,
                dir = %config.model_dir.display(),
                "face engine unavailable"
            );
            CompareResponse::error(e.to_string())
        }
    };
    output::finish(&response)
}
