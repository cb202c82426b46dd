//! Shared plumbing for the `detect-face` and `compare-faces` binaries.
//!
//! Both are invoked by the check-in API as subprocesses: stdout carries
//! exactly one JSON document, everything else goes to stderr.

pub mod config;
pub mod output;

pub use config::FaceConfig;
