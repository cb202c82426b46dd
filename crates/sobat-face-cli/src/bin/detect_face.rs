use clap::Parser;
use sobat_face::checkin::{self, DetectResponse};
use sobat_face::OnnxEngine;
use sobat_face_cli::{output, FaceConfig};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "detect-face", version, about = "Count faces in a photo, answer in JSON")]
struct Args {
    /// Photo to scan
    image: PathBuf,
    /// Directory holding the ONNX models (overrides SOBAT_FACE_MODEL_DIR)
    #[arg(long)]
    model_dir: Option<PathBuf>,
}

fn main() -> ExitCode {
    output::init_logging();
    output::install_panic_hook();

    let args = match output::parse_args::<Args>() {
        Ok(args) => args,
        Err(code) => return code,
    };
    let config = FaceConfig::from_env().with_overrides(args.model_dir, None);

    let response = match OnnxEngine::load(&config.model_dir) {
        Ok(mut engine) => checkin::detect(&mut engine, &args.image),
        Err(e) => {
            tracing::error!(
                error = %e,
                dir = %config.model_dir.display(),
                "face engine unavailable"
            );
            DetectResponse::error(e.to_string())
        }
    };
    output::finish(&response)
}
