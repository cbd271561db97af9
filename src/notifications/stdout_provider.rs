use std::io::Write;
use std::time::Instant;

use async_trait::async_trait;

use super::provider::{NotificationMessage, NotificationProvider, NotificationResult};
use crate::error::{AppError, AppResult};

/// Last-resort provider printing announcements to standard output
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutProvider;

impl StdoutProvider {
    fn render(message: &NotificationMessage) -> String {
        format!("==== {} ====\n{}\n", message.title, message.body)
    }
}

#[async_trait]
impl NotificationProvider for StdoutProvider {
    async fn send(&self, message: &NotificationMessage) -> AppResult<NotificationResult> {
        let start = Instant::now();

        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(Self::render(message).as_bytes())
            .and_then(|_| stdout.flush())
            .map_err(|e| AppError::Notification {
                provider: self.name().to_string(),
                message: e.to_string(),
            })?;

        Ok(NotificationResult {
            success: true,
            status_code: None,
            response: None,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn name(&self) -> &'static str {
        "stdout"
    }
}
