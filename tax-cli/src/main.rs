use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use tax_cli::app::{self, Outcome};
use tax_cli::cli::Cli;

// ─── tracing ─────────────────────────────────────────────────────────────────

/// Initialise the tracing subscriber.
///
/// * Honours `RUST_LOG` when set.
/// * Falls back to `info` so normal runs are quiet.
/// * Strips timestamps and target names to keep CLI output clean.
/// * Writes to stderr so reports and JSON on stdout stay machine-readable.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::from("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .init();
}

// ─── entry point ─────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<ExitCode> {
    init_tracing();

    let cli = Cli::parse();
    debug!(?cli, "parsed arguments");

    let rules = app::select_rules(cli.rules.as_deref(), cli.rules_dir.as_deref(), cli.date)?;
    let outcome = app::run(&cli.command, &rules, cli.locale, cli.json)
        .context("calculation failed")?;

    match outcome {
        Outcome::Success(text) => {
            println!("{}", text.trim_end());
            Ok(ExitCode::SUCCESS)
        }
        Outcome::Rejected(message) => {
            eprintln!("{}", message.trim_end());
            Ok(ExitCode::FAILURE)
        }
    }
}
