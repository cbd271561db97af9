//! Config command handler: validation dry run and settings dump.

use crate::config::Settings;
use crate::error::{AppError, AppResult};
use crate::monitor::Monitor;

pub struct ConfigCommandHandler {
    config: Settings,
}

impl ConfigCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    pub async fn execute(&self, show: bool) -> AppResult<()> {
        println!("{}", self.render(show).await?);
        Ok(())
    }

    /// Human-readable validation summary, followed by the masked settings
    /// as JSON when `show` is set.
    pub async fn render(&self, show: bool) -> AppResult<String> {
        self.config.validate()?;
        let monitor = Monitor::from_settings(&self.config)?;
        monitor.validate_notifier().await?;

        let mut lines = vec![
            "✓ Configuration is valid".to_string(),
            format!("✓ Tracking {} author(s)", monitor.uids().len()),
            format!("✓ Notifications go through: {}", monitor.provider_name()),
            format!("✓ Ledger file: {}", self.config.monitor.ledger_path),
            format!("✓ Watch schedule: {}", self.config.schedule.cron),
        ];

        if show {
            let json = serde_json::to_string_pretty(&self.config.redacted()).map_err(|e| {
                AppError::Internal {
                    source: anyhow::Error::new(e),
                }
            })?;
            lines.push(json);
        }

        Ok(lines.join("\n"))
    }
}
