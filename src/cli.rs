//! CLI command handlers
//!
//! Thin wrappers over the library: ingest a file and print its report,
//! train a tenant's model, score a batch, or list committed models.
//! Output is JSON on stdout; diagnostics go to tracing on stderr.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::config::EngineConfig;
use crate::ingest::Ingestor;
use crate::registry::{FsStore, ModelRegistry};
use crate::scoring;

#[derive(Debug, Parser)]
#[command(name = "calificar", about = "Multi-tenant lead scoring", version)]
pub struct Cli {
    /// Verbose diagnostics (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Model artifact directory (overrides config)
    #[arg(long, global = true)]
    pub model_dir: Option<PathBuf>,

    /// Engine config file (JSON or YAML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Ingest a file and print its validation report
    Ingest(IngestArgs),
    /// Train a tenant's lead scoring model from a labeled file
    Train(TrainArgs),
    /// Score a batch of leads with a tenant's model
    Predict(PredictArgs),
    /// List committed models in the artifact directory
    Models,
}

#[derive(Debug, Args)]
pub struct IngestArgs {
    /// CSV, TSV or Excel file
    pub path: PathBuf,
}

#[derive(Debug, Args)]
pub struct TrainArgs {
    /// Labeled training file
    pub path: PathBuf,
    /// Tenant the model belongs to
    #[arg(long)]
    pub tenant: String,
    /// Binary label column
    #[arg(long, default_value = "converted")]
    pub label: String,
}

#[derive(Debug, Args)]
pub struct PredictArgs {
    /// File of leads to score
    pub path: PathBuf,
    /// Tenant whose model to use
    #[arg(long)]
    pub tenant: String,
}

/// Execute a parsed CLI invocation.
pub fn run_command(cli: Cli) -> Result<(), String> {
    init_logging(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_file(path).map_err(|e| e.to_string())?,
        None => EngineConfig::default(),
    };
    if let Some(dir) = cli.model_dir {
        config.model_dir = dir;
    }
    let registry = ModelRegistry::new(FsStore::new(config.model_dir.clone()));

    match cli.command {
        Command::Ingest(args) => {
            let report = Ingestor::new()
                .ingest_path(&args.path)
                .map_err(|e| e.to_string())?;
            print_json(&report)
        }
        Command::Train(args) => {
            let ingested = Ingestor::new()
                .ingest_path(&args.path)
                .map_err(|e| e.to_string())?;
            let report =
                scoring::train(&registry, &config, &args.tenant, &ingested.frame, &args.label);
            print_json(&report)
        }
        Command::Predict(args) => {
            let ingested = Ingestor::new()
                .ingest_path(&args.path)
                .map_err(|e| e.to_string())?;
            let predictions = scoring::predict(&registry, &config, &args.tenant, &ingested.frame);
            print_json(&predictions)
        }
        Command::Models => {
            let keys = registry.load_all().map_err(|e| e.to_string())?;
            let tenants: Vec<String> = keys
                .iter()
                .map(|k| format!("{}:{}", k.kind, k.tenant))
                .collect();
            print_json(&tenants)
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{text}");
    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // Ignore the error if a subscriber is already installed (tests).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
