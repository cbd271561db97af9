//! Check command handler: a single pass over every tracked author.

use crate::config::Settings;
use crate::error::AppResult;
use crate::monitor::{CheckReport, Monitor};

pub struct CheckCommandHandler {
    config: Settings,
}

impl CheckCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    pub async fn execute(&self) -> AppResult<CheckReport> {
        let monitor = Monitor::from_settings(&self.config)?;
        monitor.validate_notifier().await?;

        if monitor.uids().is_empty() {
            tracing::warn!("No authors configured, nothing to check");
        }

        Ok(monitor.check_updates().await)
    }
}
