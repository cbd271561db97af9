//! Command-line interface
//!
//! - Argument parsing with clap
//! - Configuration merging (CLI args + config files + environment)
//! - Command dispatch to the check, watch and config handlers

pub mod config_merger;
pub mod executor;
pub mod handlers;
pub mod parser;
pub mod validation;

pub use config_merger::ConfigurationMerger;
pub use executor::execute_command;
pub use parser::{Cli, Commands, Environment};

use crate::config::Settings;
use crate::logger::init_logger;

/// Load settings from files and environment, then apply CLI overrides
pub fn load_and_merge_config(cli: &Cli) -> anyhow::Result<Settings> {
    let merger = ConfigurationMerger::from_sources(cli.config.as_deref(), cli.env)?;
    Ok(merger.merge_cli_args(cli)?)
}

/// Initialize logging from the `[logger]` section
pub fn init_logger_from_settings(settings: &Settings) -> anyhow::Result<()> {
    let logger_config = settings.logger.clone().into_logger_config()?;
    init_logger(logger_config)
}
