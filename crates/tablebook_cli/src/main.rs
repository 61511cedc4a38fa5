//! `tablebook` command-line entry point.
//!
//! Logging goes through `tracing`; set `RUST_LOG=debug` for per-sheet detail.

mod args;

use std::process::ExitCode;

use clap::Parser;
use tablebook_export::{export_workbooks, render_export_config};
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::args::Cli;

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .without_time()
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = cli.resolve_config()?;
    if cli.print_config {
        print!("{}", render_export_config(&config)?);
        return Ok(());
    }

    export_workbooks(&config)?;
    Ok(())
}
