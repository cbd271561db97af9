//! Notification through the host automation platform.
//!
//! Panels such as QingLong ship a `notify.py` exposing `send(title, content)`
//! that fans out to every channel configured on the host. This provider runs
//! a configured program with the title and body appended as the last two
//! arguments, from the directory holding the host's scripts.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;

use super::provider::{NotificationMessage, NotificationProvider, NotificationResult};
use crate::config::HostNotifyConfig;
use crate::error::{AppError, AppResult};

const SEND_TIMEOUT: Duration = Duration::from_secs(60);

pub struct HostCommandProvider {
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
}

impl HostCommandProvider {
    pub fn new(program: impl Into<String>, args: Vec<String>, working_dir: Option<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args,
            working_dir,
        }
    }

    /// Build from settings; `marker_root` is the value of the marker variable.
    pub fn from_config(config: &HostNotifyConfig, marker_root: &Path) -> Self {
        let working_dir = config
            .scripts_dir
            .as_ref()
            .map(PathBuf::from)
            .or_else(|| scripts_dir_under(marker_root));
        Self::new(config.program.clone(), config.args.clone(), working_dir)
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    fn failure(&self, message: impl Into<String>) -> AppError {
        AppError::Notification {
            provider: self.name().to_string(),
            message: message.into(),
        }
    }
}

/// `data/scripts` on current QingLong layouts, `scripts` on older ones
fn scripts_dir_under(root: &Path) -> Option<PathBuf> {
    [root.join("data").join("scripts"), root.join("scripts")]
        .into_iter()
        .find(|dir| dir.is_dir())
}

#[async_trait]
impl NotificationProvider for HostCommandProvider {
    async fn send(&self, message: &NotificationMessage) -> AppResult<NotificationResult> {
        let start = Instant::now();

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(&message.title)
            .arg(&message.body)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let output = tokio::time::timeout(SEND_TIMEOUT, command.output())
            .await
            .map_err(|_| self.failure(format!("{} timed out after {SEND_TIMEOUT:?}", self.program)))?
            .map_err(|e| self.failure(format!("failed to run {}: {e}", self.program)))?;

        let mut response = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            if !response.is_empty() {
                response.push('\n');
            }
            response.push_str(stderr.trim());
        }

        Ok(NotificationResult {
            success: output.status.success(),
            status_code: output.status.code(),
            response: (!response.is_empty()).then_some(response),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn name(&self) -> &'static str {
        "host"
    }

    async fn validate_config(&self) -> AppResult<()> {
        if self.program.trim().is_empty() {
            return Err(AppError::Validation {
                field: "notify.host.program".to_string(),
                reason: "Program cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}
