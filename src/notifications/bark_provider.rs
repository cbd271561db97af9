//! Bark notification provider implementation.
//!
//! Sends push notifications to iOS devices via the Bark server `/push` API.
//!
//! Bark API Reference: https://github.com/Finb/Bark

use std::time::Instant;

use async_trait::async_trait;
use serde_json::json;

use super::provider::{NotificationMessage, NotificationProvider, NotificationResult};
use crate::config::BarkConfig;
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct BarkProvider {
    client: reqwest::Client,
    config: BarkConfig,
}

impl BarkProvider {
    pub fn new(client: reqwest::Client, config: BarkConfig) -> Self {
        Self { client, config }
    }

    /// JSON body for `POST {server}/push`
    fn build_request_body(&self, message: &NotificationMessage) -> serde_json::Value {
        let mut body = json!({
            "device_key": self.config.device_key,
            "title": message.title,
            "body": message.body,
        });

        for (key, value) in [
            ("group", &self.config.group),
            ("sound", &self.config.sound),
            ("icon", &self.config.icon),
            ("level", &self.config.level),
        ] {
            if let Some(value) = value {
                body[key] = json!(value);
            }
        }

        body
    }
}

#[async_trait]
impl NotificationProvider for BarkProvider {
    async fn send(&self, message: &NotificationMessage) -> AppResult<NotificationResult> {
        let start = Instant::now();

        let response = self
            .client
            .post(self.config.build_api_url())
            .json(&self.build_request_body(message))
            .send()
            .await;

        let duration_ms = start.elapsed().as_millis() as u64;

        match response {
            Ok(resp) => {
                let status = resp.status();
                let response_text = resp.text().await.ok();

                Ok(NotificationResult {
                    success: status.is_success(),
                    status_code: Some(i32::from(status.as_u16())),
                    response: response_text,
                    duration_ms,
                })
            }
            Err(e) => Ok(NotificationResult {
                success: false,
                status_code: None,
                response: Some(e.to_string()),
                duration_ms,
            }),
        }
    }

    fn name(&self) -> &'static str {
        "bark"
    }

    async fn validate_config(&self) -> AppResult<()> {
        if !self.config.is_configured() {
            return Err(AppError::Validation {
                field: "notify.bark.device_key".to_string(),
                reason: "Device key cannot be empty".to_string(),
            });
        }

        self.config.validate().map_err(AppError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(config: BarkConfig) -> BarkProvider {
        BarkProvider::new(reqwest::Client::new(), config)
    }

    #[test]
    fn test_build_request_body_minimal() {
        let provider = provider(BarkConfig {
            device_key: "test_key".to_string(),
            ..Default::default()
        });

        let body = provider.build_request_body(&NotificationMessage::new("Title", "Body"));
        assert_eq!(body["device_key"], "test_key");
        assert_eq!(body["title"], "Title");
        assert_eq!(body["body"], "Body");
        assert!(body.get("icon").is_none());
        assert!(body.get("sound").is_none());
    }

    #[test]
    fn test_build_request_body_full() {
        let provider = provider(BarkConfig {
            server_url: "https://bark.example.com".to_string(),
            device_key: "test_key".to_string(),
            group: Some("bilibili".to_string()),
            sound: Some("minuet".to_string()),
            icon: Some("https://example.com/icon.png".to_string()),
            level: Some("timeSensitive".to_string()),
        });

        let body = provider.build_request_body(&NotificationMessage::new("Title", "Body"));
        assert_eq!(body["group"], "bilibili");
        assert_eq!(body["sound"], "minuet");
        assert_eq!(body["icon"], "https://example.com/icon.png");
        assert_eq!(body["level"], "timeSensitive");
    }

    #[tokio::test]
    async fn test_validate_config_requires_device_key() {
        let err = provider(BarkConfig::default()).validate_config().await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_validate_config_rejects_bad_level() {
        let provider = provider(BarkConfig {
            device_key: "k".to_string(),
            level: Some("urgent".to_string()),
            ..Default::default()
        });
        assert!(provider.validate_config().await.is_err());
    }

    #[tokio::test]
    async fn test_unreachable_server_reports_failure() {
        let provider = BarkProvider::new(
            reqwest::Client::builder().no_proxy().build().unwrap(),
            BarkConfig {
                server_url: "http://127.0.0.1:9".to_string(),
                device_key: "k".to_string(),
                ..Default::default()
            },
        );

        let result = provider.send(&NotificationMessage::new("t", "b")).await.unwrap();
        assert!(!result.success);
        assert!(result.status_code.is_none());
    }
}
