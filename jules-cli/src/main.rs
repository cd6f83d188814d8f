//! jules — run one stage across many projects at once.
//!
//! # Usage
//!
//! ```text
//! jules [--config jules.yaml] [--plain] <stage> [project...]
//! jules lint [--config jules.yaml] [--json]
//! jules help
//! ```

mod commands;

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{lint::LintArgs, run::RunArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "jules",
    version,
    about = "Run a build stage across many projects concurrently",
    long_about = None,
    args_conflicts_with_subcommands = true,
)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    run: RunArgs,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check the configuration for missing templates, directories and typos.
    Lint(LintArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<ExitCode> {
    init_tracing();
    jules_runner::install_worker_panic_hook();
    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Lint(args)) => args.run(),
        None => cli.run.run(),
    }
}

/// Diagnostics go to stderr so they never tear the status board on stdout.
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
