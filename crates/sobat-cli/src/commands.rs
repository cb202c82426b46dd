use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use sobat_payroll::schema::{self, InspectionReport};
use sobat_payroll::{generate, workbook, PayrollBuilder, Period};
use std::path::{Path, PathBuf};

use crate::config::Config;

/// Pick the generator seed: flag, then config, then a fresh random one.
pub fn resolve_seed(flag: Option<u64>, config: &Config) -> u64 {
    match flag.or(config.seed) {
        Some(seed) => seed,
        None => {
            let seed = rand::random();
            tracing::info!(seed, "no seed configured; drew a fresh one");
            seed
        }
    }
}

fn prepare_output(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating output directory {}", dir.display()))?;
    }
    Ok(())
}

pub fn generate_employees(
    config: &Config,
    count: Option<u32>,
    seed: u64,
    out: Option<PathBuf>,
) -> Result<PathBuf> {
    let path = out.unwrap_or_else(|| config.roster_path());
    let count = count.unwrap_or(config.employee_count);
    let mut rng = StdRng::seed_from_u64(seed);

    let roster = generate::roster(&mut rng, count, &config.division);
    prepare_output(&path)?;
    workbook::write_roster(&path, &roster)
        .with_context(|| format!("writing roster {}", path.display()))?;

    tracing::info!(path = %path.display(), count, seed, "roster generated");
    Ok(path)
}

pub fn generate_payroll(
    config: &Config,
    roster: Option<PathBuf>,
    period: Period,
    seed: u64,
    out: Option<PathBuf>,
) -> Result<PathBuf> {
    let roster_path = roster.unwrap_or_else(|| config.roster_path());
    let path = out.unwrap_or_else(|| config.payroll_path());
    let mut rng = StdRng::seed_from_u64(seed);

    let roster = workbook::load_roster_or_placeholder(&roster_path, config.employee_count);
    let builder = PayrollBuilder::new(config.policy.clone());
    let records = generate::payroll(&mut rng, &builder, &roster, period)
        .context("building payroll records")?;

    prepare_output(&path)?;
    workbook::write_payroll(&path, &records)
        .with_context(|| format!("writing payroll {}", path.display()))?;

    tracing::info!(
        path = %path.display(),
        records = records.len(),
        %period,
        seed,
        "payroll generated"
    );
    Ok(path)
}

pub fn generate_invites(config: &Config, out: Option<PathBuf>) -> Result<PathBuf> {
    let path = out.unwrap_or_else(|| config.invite_path());
    let invites = generate::invites();
    prepare_output(&path)?;
    workbook::write_invites(&path, &invites)
        .with_context(|| format!("writing invites {}", path.display()))?;

    tracing::info!(path = %path.display(), count = invites.len(), "invites generated");
    Ok(path)
}

pub fn inspect(config: &Config, path: &Path, schema_id: &str) -> Result<InspectionReport> {
    let schema = schema::find(schema_id).with_context(|| {
        let known: Vec<_> = schema::all().iter().map(|s| s.id).collect();
        format!("unknown schema {schema_id:?} (known: {})", known.join(", "))
    })?;
    schema::inspect(path, schema, &config.policy)
        .with_context(|| format!("inspecting {}", path.display()))
}
