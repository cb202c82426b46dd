//! The stdout contract: one JSON line per run, whatever happens.

use clap::error::ErrorKind;
use clap::Parser;
use serde::Serialize;
use std::io::Write;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Logs go to stderr so stdout stays machine-readable.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    status: &'static str,
    message: &'a str,
}

/// Render an error payload in the same shape as the check-in responses.
pub fn error_line(message: &str) -> String {
    let body = ErrorBody {
        status: "error",
        message,
    };
    serde_json::to_string(&body)
        .unwrap_or_else(|_| r#"{"status":"error","message":"internal error"}"#.to_string())
}

/// Report panics as a JSON error instead of a backtrace on stdout.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let detail = info
            .payload()
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        tracing::error!(%detail, location = ?info.location(), "panic");
        println!("{}", error_line(&format!("Internal error: {detail}")));
    }));
}

/// Print `value` as a single JSON line.
pub fn emit<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let line = serde_json::to_string(value)?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{line}")?;
    stdout.flush()?;
    Ok(())
}

/// Emit the response and exit 0; the caller reads status from the JSON.
pub fn finish<T: Serialize>(value: &T) -> ExitCode {
    match emit(value) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "failed to write response");
            ExitCode::FAILURE
        }
    }
}

/// Message reported for a command line clap rejected.
pub fn usage_message(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::MissingRequiredArgument | ErrorKind::MissingSubcommand => "Missing arguments",
        _ => "Invalid arguments",
    }
}

/// Parse arguments; usage errors become a JSON error with exit code 1.
pub fn parse_args<P: Parser>() -> Result<P, ExitCode> {
    P::try_parse().map_err(|e| match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            let _ = e.print();
            ExitCode::SUCCESS
        }
        kind => {
            tracing::debug!(error = %e, "argument parsing failed");
            println!("{}", error_line(usage_message(kind)));
            ExitCode::FAILURE
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[derive(Parser, Debug)]
    struct Args {
        known: PathBuf,
        unknown: PathBuf,
        #[arg(long)]
        tolerance: Option<f32>,
    }

    #[test]
    fn test_error_line_shape() {
        let value: serde_json::Value =
            serde_json::from_str(&error_line("Missing arguments")).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"status": "error", "message": "Missing arguments"})
        );
    }

    #[test]
    fn test_error_line_escapes_quotes() {
        let line = error_line(r#"bad "path""#);
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["message"], r#"bad "path""#);
    }

    #[test]
    fn test_missing_positional_maps_to_missing_arguments() {
        let err = Args::try_parse_from(["compare-faces", "known.jpg"]).unwrap_err();
        assert_eq!(usage_message(err.kind()), "Missing arguments");
    }

    #[test]
    fn test_bad_flag_value_maps_to_invalid_arguments() {
        let err = Args::try_parse_from(["compare-faces", "a.jpg", "b.jpg", "--tolerance", "x"])
            .unwrap_err();
        assert_eq!(usage_message(err.kind()), "Invalid arguments");
    }
}
