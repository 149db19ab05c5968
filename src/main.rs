//! Calificar CLI
//!
//! Multi-tenant lead scoring from tabular files.
//!
//! # Usage
//!
//! ```bash
//! # Inspect a file
//! calificar ingest leads.csv
//!
//! # Train a tenant's model
//! calificar train leads.csv --tenant acme --label converted
//!
//! # Score a batch
//! calificar predict new_leads.csv --tenant acme
//!
//! # List committed models
//! calificar models
//! ```

use calificar::cli::{run_command, Cli};
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
