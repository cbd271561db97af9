//! Watch command handler: cron-scheduled passes until a shutdown signal.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::Settings;
use crate::error::AppResult;
use crate::jobs::{CheckRunner, JobScheduler, shutdown_signal};
use crate::monitor::Monitor;

pub struct WatchCommandHandler {
    config: Settings,
}

impl WatchCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Run until Ctrl+C or SIGTERM
    pub async fn execute(&self) -> AppResult<()> {
        let cancel = CancellationToken::new();
        let signal_cancel = cancel.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            signal_cancel.cancel();
        });

        self.run(cancel).await
    }

    /// Run until `cancel` fires
    pub async fn run(&self, cancel: CancellationToken) -> AppResult<()> {
        let monitor = Monitor::from_settings(&self.config)?;
        monitor.validate_notifier().await?;
        tracing::info!(
            authors = monitor.uids().len(),
            provider = monitor.provider_name(),
            cron = %self.config.schedule.cron,
            "Starting watcher"
        );

        let scheduler = JobScheduler::new(CheckRunner::new(Arc::new(monitor))).await?;
        scheduler.schedule(&self.config.schedule.cron).await?;
        scheduler
            .run_until(cancel, self.config.schedule.run_on_start)
            .await?;
        Ok(())
    }
}
