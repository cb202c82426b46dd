use anyhow::Result;
use clap::{Parser, Subcommand};
use sobat_payroll::{schema, Period};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "sobat", version, about = "Sobat payroll workbook tooling")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate dummy workbooks
    Generate {
        #[command(subcommand)]
        target: GenerateTarget,
    },
    /// Check a workbook against a declared sheet schema
    Inspect {
        /// Workbook to inspect
        path: PathBuf,
        /// Schema id, optionally with a version (e.g. "payroll-wrapping@1")
        #[arg(long)]
        schema: String,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the built-in sheet schemas
    Schemas {
        /// Print the schemas as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum GenerateTarget {
    /// Dummy employee roster
    Employees {
        /// Number of employees (default from config)
        #[arg(long)]
        count: Option<u32>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Payroll workbook in the fixed 39-column layout
    Payroll {
        /// Roster workbook; placeholder employees are used if unreadable
        #[arg(long)]
        roster: Option<PathBuf>,
        /// Pay period as YYYY-MM (default: current month)
        #[arg(long, value_parser = parse_period)]
        period: Option<Period>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Fixed invitation list
    Invites {
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn parse_period(raw: &str) -> Result<Period, String> {
    Period::parse(raw).map_err(|e| e.to_string())
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Generate { target } => {
            let path = match target {
                GenerateTarget::Employees { count, seed, out } => {
                    let seed = commands::resolve_seed(seed, &config);
                    commands::generate_employees(&config, count, seed, out)?
                }
                GenerateTarget::Payroll {
                    roster,
                    period,
                    seed,
                    out,
                } => {
                    let seed = commands::resolve_seed(seed, &config);
                    let period = period
                        .unwrap_or_else(|| Period::containing(chrono::Local::now().date_naive()));
                    commands::generate_payroll(&config, roster, period, seed, out)?
                }
                GenerateTarget::Invites { out } => commands::generate_invites(&config, out)?,
            };
            println!("Wrote {}", path.display());
        }
        Commands::Inspect { path, schema, json } => {
            let report = commands::inspect(&config, &path, &schema)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{report}");
            }
            if !report.is_valid() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Schemas { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(schema::all())?);
            } else {
                for s in schema::all() {
                    println!("{}@{}", s.id, s.version);
                    for header in schema::declared_headers(s) {
                        if !header.is_empty() {
                            println!("  {header}");
                        }
                    }
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
