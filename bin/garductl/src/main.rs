//! ---
//! gardu_section: "05-operator-interface"
//! gardu_subsection: "binary"
//! gardu_type: "source"
//! gardu_scope: "code"
//! gardu_description: "Operator CLI for monitoring and editing gardu telemetry."
//! gardu_version: "v0.1.0"
//! gardu_owner: "tbd"
//! ---
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::{ArgAction, Parser};
use gardu_common::config::AppConfig;
use gardu_common::logging::init_tracing;
use gardu_core::Dashboard;
use tokio::runtime::Runtime;

mod commands;
mod render;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Gardu Monitor operator console",
    long_about = None
)]
struct Cli {
    /// Configuration file; `GARDU_CONFIG` takes precedence when set.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Print the Prometheus exposition to stderr after the command.
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    dump_metrics: bool,
    #[command(subcommand)]
    command: commands::Command,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", render::user_message(&err));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            gardu_logging::init();
            return Err(err);
        }
    };
    if config.logging.enabled {
        init_tracing("garductl", &config.logging)?;
    } else {
        gardu_logging::init();
    }

    let dashboard = Dashboard::from_config(&config)?;
    let runtime = Runtime::new()?;
    let (date, time) = dashboard.banner();
    render::banner(&date, &time);

    let outcome = commands::execute(&runtime, &dashboard, cli.command);
    if cli.dump_metrics {
        if let Some(text) = dashboard.metrics_text()? {
            eprintln!("{text}");
        }
    }
    outcome
}

fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    let mut candidates = Vec::new();
    if let Some(path) = explicit {
        candidates.push(path.to_path_buf());
    }
    candidates.push(PathBuf::from("configs/gardu.toml"));
    candidates.push(PathBuf::from("configs/gardu.example.toml"));
    AppConfig::load(&candidates)
}
