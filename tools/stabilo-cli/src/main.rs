//! Stabilo CLI: trajectory analysis from recorded motion logs.
//!
//! Usage:
//!   stabilo correct <LOG>      Compute per-frame corrections from a motion log
//!   stabilo validate <LOG>     Check a motion log and summarise it
//!   stabilo config             Show or initialise the configuration file

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use stabilo_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "stabilo",
    about = "Video stabilization by trajectory smoothing",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute smoothed trajectory and per-frame corrections
    Correct {
        /// Motion log (JSON lines, one record per frame pair)
        log: PathBuf,

        /// Smoothing radius in frames; out-of-range values are clamped
        #[arg(short, long, allow_hyphen_values = true)]
        radius: Option<i64>,

        /// Write the correction report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a motion log
    Validate {
        /// Motion log (JSON lines, one record per frame pair)
        log: PathBuf,

        /// Radius to check against the log length
        #[arg(short, long, allow_hyphen_values = true)]
        radius: Option<i64>,
    },

    /// Show the effective configuration
    Config {
        /// Write a default configuration file if none exists
        #[arg(long)]
        init: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load();

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    stabilo_common::logging::init_logging(&logging);

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {e}"))?;

    match cli.command {
        Commands::Correct {
            log,
            radius,
            output,
        } => commands::correct::run(
            log,
            radius.unwrap_or(config.stabilization.smoothing_radius),
            output,
        ),
        Commands::Validate { log, radius } => commands::validate::run(
            log,
            radius.unwrap_or(config.stabilization.smoothing_radius),
        ),
        Commands::Config { init } => commands::config::run(&config, init),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_negative_radius_is_accepted() {
        let cli = Cli::try_parse_from(["stabilo", "correct", "motion.jsonl", "--radius", "-3"])
            .unwrap();
        match cli.command {
            Commands::Correct { radius, .. } => assert_eq!(radius, Some(-3)),
            _ => panic!("expected correct"),
        }
    }
}
