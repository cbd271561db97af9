//! CLI argument parsing with clap
//!
//! This module defines the command-line interface structure using clap,
//! including all commands, arguments, and their documentation.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use super::validation::UidList;

/// Watches Bilibili uploaders and announces their new videos
#[derive(Parser, Debug)]
#[command(name = "bili-up-watch")]
#[command(about = "Watches Bilibili uploaders and announces their new videos")]
#[command(long_about = "
bili-up-watch polls the recent uploads of a list of Bilibili authors, remembers
which videos it has already seen, and sends a notification for every new one.

EXAMPLES:
    # One pass over the configured authors (default command)
    bili-up-watch

    # One pass over an explicit author list
    bili-up-watch check --uids 946974,9617619

    # Keep running, checking every ten minutes
    bili-up-watch watch --cron '0 */10 * * * *' --run-now

    # Validate configuration and show the effective settings
    bili-up-watch --config ./bili.toml config --show
")]
#[command(version = crate::clap_long_version())]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file path
    ///
    /// Load settings from this single TOML file instead of the layered
    /// config/ directory. Environment variables still apply on top.
    #[arg(short, long, value_name = "FILE", value_parser = super::validation::validate_config_file_path)]
    pub config: Option<PathBuf>,

    /// Override environment detection
    ///
    /// Selects which config/{environment}.toml layer is loaded.
    #[arg(short, long, value_enum)]
    pub env: Option<Environment>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run one pass over every tracked author (default)
    Check {
        /// Comma-separated author ids, replacing the configured list
        #[arg(long, value_name = "UIDS", value_parser = super::validation::validate_uid_list)]
        uids: Option<UidList>,
    },
    /// Keep checking on a cron schedule until interrupted
    ///
    /// Examples:
    ///   bili-up-watch watch                            # Use schedule.cron
    ///   bili-up-watch watch --cron '0 0 * * * *'       # Hourly
    ///   bili-up-watch watch --run-now                  # Check once before the first tick
    Watch {
        /// Six-field cron expression (seconds first)
        #[arg(long, value_name = "EXPR", value_parser = super::validation::validate_cron_expression)]
        cron: Option<String>,

        /// Run a pass immediately instead of waiting for the first tick
        #[arg(long)]
        run_now: bool,

        /// Comma-separated author ids, replacing the configured list
        #[arg(long, value_name = "UIDS", value_parser = super::validation::validate_uid_list)]
        uids: Option<UidList>,
    },
    /// Validate configuration and report the selected notifier
    Config {
        /// Print effective settings as JSON with secrets masked
        #[arg(long)]
        show: bool,
    },
}

/// Environment options
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    #[value(name = "development", alias = "dev")]
    Development,
    #[value(name = "production", alias = "prod")]
    Production,
}

impl Cli {
    /// Cross-argument checks clap cannot express
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use --verbose and --quiet together".to_string());
        }
        Ok(())
    }
}

impl From<Environment> for crate::config::Environment {
    fn from(env: Environment) -> Self {
        match env {
            Environment::Development => crate::config::Environment::Development,
            Environment::Production => crate::config::Environment::Production,
        }
    }
}
