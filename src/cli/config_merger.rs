//! Configuration merger for CLI arguments and config files
//!
//! CLI arguments sit on top of every other configuration layer.

use std::path::Path;

use super::parser::{Cli, Commands, Environment};
use super::validation::UidList;
use crate::config::error::ConfigError;
use crate::config::{ConfigLoader, Settings};

/// Applies CLI overrides to file and environment based settings
pub struct ConfigurationMerger {
    base_config: Settings,
}

impl ConfigurationMerger {
    pub fn new(base_config: Settings) -> Self {
        Self { base_config }
    }

    /// Load the base settings the way the CLI asked for.
    ///
    /// `--config` selects single-file mode; otherwise the layered loader
    /// reads the config directory. `--env` picks the environment layer.
    pub fn from_sources(
        config_path: Option<&Path>,
        environment: Option<Environment>,
    ) -> Result<Self, ConfigError> {
        let loader = match config_path {
            Some(path) => ConfigLoader::from_file(path),
            None => ConfigLoader::new()?,
        };
        let loader = match environment {
            Some(env) => loader.with_environment(env.into()),
            None => loader,
        };

        tracing::debug!(environment = %loader.environment(), "Loading configuration");
        Ok(Self::new(loader.load()?))
    }

    /// Merge CLI arguments with the base configuration and validate the result
    pub fn merge_cli_args(&self, cli: &Cli) -> Result<Settings, ConfigError> {
        let mut config = self.base_config.clone();

        if cli.verbose {
            config.logger.level = "debug".to_string();
        } else if cli.quiet {
            config.logger.level = "error".to_string();
        }

        if let Some(command) = &cli.command {
            Self::apply_command_overrides(&mut config, command);
        }

        config.validate()?;
        Ok(config)
    }

    fn apply_command_overrides(config: &mut Settings, command: &Commands) {
        match command {
            Commands::Check { uids } => Self::override_uids(config, uids.as_ref()),
            Commands::Watch { cron, run_now, uids } => {
                Self::override_uids(config, uids.as_ref());
                if let Some(expression) = cron {
                    config.schedule.cron = expression.clone();
                }
                if *run_now {
                    config.schedule.run_on_start = true;
                }
            }
            Commands::Config { .. } => {}
        }
    }

    fn override_uids(config: &mut Settings, uids: Option<&UidList>) {
        if let Some(UidList(uids)) = uids {
            config.monitor.uids = uids.clone();
        }
    }

    pub fn config(&self) -> &Settings {
        &self.base_config
    }
}
