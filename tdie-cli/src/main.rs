//! TDIE CLI — score dataset payloads and gate training runs from the
//! terminal.
//!
//! Thin I/O glue: reads a JSON payload file, invokes the core pipeline, and
//! prints the JSON report. All scoring logic lives in tdie-core.

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use std::path::PathBuf;
use std::process::ExitCode;
use tdie_core::engines::gate::GuardrailLevel;
use tdie_core::{IntegrityPipeline, TdieConfig, TdieError};
use tracing_subscriber::EnvFilter;

/// Training Data Integrity Engine
#[derive(Parser, Debug)]
#[command(name = "tdie", version, about, long_about = None)]
struct Cli {
    /// Configuration file path (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Validate schema compliance and report data quality
    Validate {
        /// Dataset payload file (JSON)
        payload: PathBuf,
    },
    /// Fingerprint a dataset and check for tampering
    Fingerprint {
        payload: PathBuf,
    },
    /// Run poisoning-risk heuristics
    Poison {
        payload: PathBuf,
    },
    /// Run fairness integrity checks
    Bias {
        payload: PathBuf,
    },
    /// Run the full integrity stack and compute the composite score
    Score {
        payload: PathBuf,
    },
    /// Apply the training guardrail to a composite score
    Gate {
        /// Composite TDIE score
        #[arg(long)]
        score: f64,
        /// Guardrail level: strict, moderate, or permissive
        #[arg(long, default_value = "strict")]
        level: String,
        /// Score threshold (defaults to the configured value)
        #[arg(long)]
        threshold: Option<f64>,
        /// Write an evidence bundle to this path
        #[arg(long)]
        evidence: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            if let Some(TdieError::Input(message)) = error.downcast_ref::<TdieError>() {
                eprintln!("invalid input: {message}");
            } else {
                eprintln!("error: {error:#}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => TdieConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => TdieConfig::default(),
    };
    let pipeline = IntegrityPipeline::new(config);

    match cli.command {
        Commands::Validate { payload } => {
            let report = pipeline.validate(&read_payload(&payload)?)?;
            print_json(&report)
        }
        Commands::Fingerprint { payload } => {
            let report = pipeline.fingerprint(&read_payload(&payload)?)?;
            print_json(&report)
        }
        Commands::Poison { payload } => {
            let report = pipeline.poison(&read_payload(&payload)?)?;
            print_json(&report)
        }
        Commands::Bias { payload } => {
            let report = pipeline.bias(&read_payload(&payload)?)?;
            print_json(&report)
        }
        Commands::Score { payload } => {
            let assessment = pipeline.evaluate(&read_payload(&payload)?)?;
            print_json(&assessment)
        }
        Commands::Gate {
            score,
            level,
            threshold,
            evidence,
        } => {
            let level: GuardrailLevel = level
                .parse()
                .map_err(|message: String| anyhow::anyhow!(message))?;
            let decision = pipeline.gate(score, level, threshold);
            if let Some(path) = evidence {
                let written = pipeline.export_evidence(score, &decision, &path)?;
                tracing::info!(path = %written.display(), "evidence bundle exported");
            }
            print_json(&decision)
        }
    }
}

fn read_payload(path: &PathBuf) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading payload from {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("parsing payload from {}", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
