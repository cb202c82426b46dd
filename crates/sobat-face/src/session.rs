use ort::session::Session;
use std::path::Path;

/// ONNX Runtime threads per model; two models share the CPU.
const INTRA_THREADS: usize = 2;

/// Build an inference session for a model file already known to exist.
pub(crate) fn open(model_path: &Path) -> ort::Result<Session> {
    let session = Session::builder()?
        .with_intra_threads(INTRA_THREADS)?
        .commit_from_file(model_path)?;
    tracing::debug!(
        path = %model_path.display(),
        inputs = ?session.inputs().iter().map(|i| i.name()).collect::<Vec<_>>(),
        "onnx session ready"
    );
    Ok(session)
}
