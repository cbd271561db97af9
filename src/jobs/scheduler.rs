use std::sync::Arc;

use tokio::signal;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler as TokioCronScheduler};
use tokio_util::sync::CancellationToken;

use crate::jobs::error::{JobError, JobResult};
use crate::monitor::{CheckReport, Monitor};

/// Runs monitor passes one at a time; a pass requested while another is in
/// flight is dropped instead of queued.
#[derive(Clone)]
pub struct CheckRunner {
    monitor: Arc<Monitor>,
    in_flight: Arc<Mutex<()>>,
}

impl CheckRunner {
    pub fn new(monitor: Arc<Monitor>) -> Self {
        Self {
            monitor,
            in_flight: Arc::new(Mutex::new(())),
        }
    }

    /// Returns `None` when the previous pass has not finished yet.
    pub async fn run_once(&self) -> Option<CheckReport> {
        let Ok(_running) = self.in_flight.try_lock() else {
            tracing::warn!("Previous check is still running, skipping this tick");
            return None;
        };
        Some(self.monitor.check_updates().await)
    }
}

/// Wrapper around tokio-cron-scheduler driving a single [`CheckRunner`]
pub struct JobScheduler {
    scheduler: Arc<Mutex<TokioCronScheduler>>,
    runner: CheckRunner,
}

impl JobScheduler {
    pub async fn new(runner: CheckRunner) -> JobResult<Self> {
        let scheduler = TokioCronScheduler::new()
            .await
            .map_err(|e| JobError::Scheduler(e.to_string()))?;

        Ok(Self {
            scheduler: Arc::new(Mutex::new(scheduler)),
            runner,
        })
    }

    /// Register the monitor pass under a six-field cron expression
    pub async fn schedule(&self, expression: &str) -> JobResult<()> {
        let runner = self.runner.clone();

        let cron_job = Job::new_async(expression, move |_uuid, _lock| {
            let runner = runner.clone();
            Box::pin(async move {
                if let Some(report) = runner.run_once().await {
                    tracing::debug!(new_items = report.new_items, "Scheduled check finished");
                }
            })
        })
        .map_err(|e| JobError::InvalidCronExpression {
            expression: expression.to_string(),
            message: e.to_string(),
        })?;

        self.scheduler
            .lock()
            .await
            .add(cron_job)
            .await
            .map_err(|e| JobError::Scheduler(e.to_string()))?;

        tracing::info!(cron = %expression, "Check scheduled");
        Ok(())
    }

    pub async fn start(&self) -> JobResult<()> {
        self.scheduler
            .lock()
            .await
            .start()
            .await
            .map_err(|e| JobError::Scheduler(e.to_string()))
    }

    /// Stop the scheduler gracefully
    pub async fn stop(&self) -> JobResult<()> {
        self.scheduler
            .lock()
            .await
            .shutdown()
            .await
            .map_err(|e| JobError::Scheduler(e.to_string()))
    }

    /// Start ticking and keep going until `cancel` fires.
    ///
    /// With `run_on_start` a pass runs right away; cancellation interrupts it
    /// between awaits, and the ledger keeps whatever authors were already
    /// saved.
    pub async fn run_until(&self, cancel: CancellationToken, run_on_start: bool) -> JobResult<()> {
        self.start().await?;
        tracing::info!(run_on_start, "Watcher started");

        if run_on_start {
            tokio::select! {
                _ = self.runner.run_once() => {}
                _ = cancel.cancelled() => {}
            }
        }

        cancel.cancelled().await;
        tracing::info!("Stopping watcher");
        self.stop().await?;
        tracing::info!("Watcher stopped");
        Ok(())
    }
}

/// Waits for Ctrl+C or SIGTERM.
///
/// If a handler cannot be installed that branch never completes, leaving the
/// other signal in charge.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        }
    }
}
