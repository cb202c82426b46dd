use anyhow::{Context, Result};
use serde::Deserialize;
use sobat_payroll::PayPolicy;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// CLI configuration: optional TOML file, then `SOBAT_*` environment
/// overrides, then command-line flags.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory generated workbooks are written to.
    pub output_dir: PathBuf,
    pub roster_file: String,
    pub payroll_file: String,
    pub invite_file: String,
    /// Division stamped on generated employees.
    pub division: String,
    /// Size of a generated roster, and of the placeholder roster used
    /// when the roster file cannot be read.
    pub employee_count: u32,
    /// Generator seed; a fresh one is drawn and logged when unset.
    pub seed: Option<u64>,
    pub policy: PayPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            roster_file: "dummy_employees_wrapping.xlsx".to_string(),
            payroll_file: "dummy_payroll_wrapping_generated.xlsx".to_string(),
            invite_file: "dummy_invite_employees.xlsx".to_string(),
            division: "Wrapping".to_string(),
            employee_count: 50,
            seed: None,
            policy: PayPolicy::default(),
        }
    }
}

impl Config {
    /// Load the TOML file at `path` (if any) and apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                let config: Config = toml::from_str(&text)
                    .with_context(|| format!("parsing config {}", path.display()))?;
                tracing::debug!(path = %path.display(), "config file loaded");
                config
            }
            None => Config::default(),
        };
        Ok(config.with_env(|key| std::env::var(key).ok()))
    }

    fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(dir) = lookup("SOBAT_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(division) = lookup("SOBAT_DIVISION") {
            self.division = division;
        }
        if let Some(count) = env_parse(&lookup, "SOBAT_EMPLOYEE_COUNT") {
            self.employee_count = count;
        }
        if let Some(seed) = env_parse(&lookup, "SOBAT_SEED") {
            self.seed = Some(seed);
        }
        if let Some(length) = env_parse(&lookup, "SOBAT_PERIOD_LENGTH") {
            self.policy.period_length = length;
        }
        self
    }

    pub fn roster_path(&self) -> PathBuf {
        self.output_dir.join(&self.roster_file)
    }

    pub fn payroll_path(&self) -> PathBuf {
        self.output_dir.join(&self.payroll_file)
    }

    pub fn invite_path(&self) -> PathBuf {
        self.output_dir.join(&self.invite_file)
    }
}

fn env_parse<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparsable environment override");
            None
        }
    }
}
