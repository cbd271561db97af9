//! Command executor for dispatching CLI commands
//!
//! Entry point for running a parsed command once settings are merged.

use super::handlers::{CheckCommandHandler, ConfigCommandHandler, WatchCommandHandler};
use super::parser::{Cli, Commands};
use crate::config::Settings;
use crate::error::{AppError, AppResult};

/// Execute a CLI command with the given settings
///
/// No subcommand means `check`.
pub async fn execute_command(cli: &Cli, settings: Settings) -> AppResult<()> {
    cli.validate().map_err(|reason| AppError::Validation {
        field: "cli_arguments".to_string(),
        reason,
    })?;

    match &cli.command {
        Some(Commands::Check { .. }) | None => {
            CheckCommandHandler::new(settings).execute().await?;
            Ok(())
        }
        Some(Commands::Watch { .. }) => WatchCommandHandler::new(settings).execute().await,
        Some(Commands::Config { show }) => ConfigCommandHandler::new(settings).execute(*show).await,
    }
}
