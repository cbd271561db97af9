//! Configuration validation logic
//!
//! This module provides validation methods for all configuration structures
//! to ensure configuration values are within acceptable ranges and formats.

use reqwest::Url;

use crate::config::error::ConfigError;
use crate::config::settings::{
    BarkConfig, FetchConfig, HttpConfig, LoggerSettings, MonitorConfig, ScheduleConfig, Settings,
};

/// Valid log levels
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid log formats
const VALID_LOG_FORMATS: &[&str] = &["full", "compact", "json"];

/// Valid Bark interruption levels
const VALID_BARK_LEVELS: &[&str] = &["active", "timeSensitive", "passive"];

/// Upper bound accepted by the listing endpoint for `ps`
const MAX_PAGE_SIZE: u32 = 50;

impl MonitorConfig {
    /// # Validation Rules
    /// - Page size must be between 1 and 50
    /// - Ledger path must not be empty
    /// - Author ids must be numeric
    /// - Time zone, if set, must be a known IANA name
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::validation(
                "monitor.page_size",
                format!("Page size must be between 1 and {MAX_PAGE_SIZE}, got {}.", self.page_size),
            ));
        }

        if self.ledger_path.trim().is_empty() {
            return Err(ConfigError::validation(
                "monitor.ledger_path",
                "Ledger path cannot be empty.",
            ));
        }

        if let Some(bad) = self
            .tracked_uids()
            .into_iter()
            .find(|uid| !uid.chars().all(|c| c.is_ascii_digit()))
        {
            return Err(ConfigError::validation(
                "monitor.uids",
                format!("Author id '{bad}' is not numeric."),
            ));
        }

        if let Some(tz) = &self.timezone
            && jiff::tz::TimeZone::get(tz).is_err()
        {
            return Err(ConfigError::validation(
                "monitor.timezone",
                format!("Unknown time zone '{tz}'."),
            ));
        }

        Ok(())
    }
}

impl FetchConfig {
    /// # Validation Rules
    /// - At least one attempt
    /// - Delays must be finite and non-negative
    /// - Jitter bounds must be ordered
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_retries == 0 {
            return Err(ConfigError::validation(
                "fetch.max_retries",
                "At least one attempt is required.",
            ));
        }

        for (field, value) in [
            ("fetch.request_delay_secs", self.request_delay_secs),
            ("fetch.jitter_min_secs", self.jitter_min_secs),
            ("fetch.jitter_max_secs", self.jitter_max_secs),
            ("fetch.retry_delay_secs", self.retry_delay_secs),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::validation(
                    field,
                    format!("Delay must be a non-negative number of seconds, got {value}."),
                ));
            }
        }

        if self.jitter_min_secs > self.jitter_max_secs {
            return Err(ConfigError::validation(
                "fetch.jitter_min_secs",
                format!(
                    "Jitter minimum ({}) cannot exceed jitter maximum ({}).",
                    self.jitter_min_secs, self.jitter_max_secs
                ),
            ));
        }

        Ok(())
    }
}

impl HttpConfig {
    /// # Validation Rules
    /// - Timeouts must be greater than 0
    /// - Proxy, if set, must be an http, https or socks5 URL
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::validation(
                "http.timeout_secs",
                "Request timeout must be greater than 0 seconds.",
            ));
        }

        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::validation(
                "http.connect_timeout_secs",
                "Connect timeout must be greater than 0 seconds.",
            ));
        }

        if let Some(proxy) = self.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
            let url = Url::parse(proxy).map_err(|e| {
                ConfigError::validation("http.proxy", format!("Invalid proxy URL '{proxy}': {e}"))
            })?;
            if !matches!(url.scheme(), "http" | "https" | "socks5" | "socks5h") {
                return Err(ConfigError::validation(
                    "http.proxy",
                    format!("Unsupported proxy scheme '{}'.", url.scheme()),
                ));
            }
        }

        Ok(())
    }
}

impl BarkConfig {
    /// Only checked when a device key is configured
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.is_configured() {
            return Ok(());
        }

        let url = Url::parse(&self.server_url).map_err(|_| {
            ConfigError::validation("notify.bark.server_url", "Invalid URL format.")
        })?;

        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(ConfigError::validation(
                "notify.bark.server_url",
                "URL must use http or https protocol.",
            ));
        }

        if let Some(level) = &self.level
            && !VALID_BARK_LEVELS.contains(&level.as_str())
        {
            return Err(ConfigError::validation(
                "notify.bark.level",
                format!("Level must be one of: {}", VALID_BARK_LEVELS.join(", ")),
            ));
        }

        Ok(())
    }
}

impl ScheduleConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = self.cron.split_whitespace().count();
        if !(5..=7).contains(&fields) {
            return Err(ConfigError::validation(
                "schedule.cron",
                format!(
                    "Cron expression '{}' must have 5 to 7 fields, got {fields}.",
                    self.cron
                ),
            ));
        }
        Ok(())
    }
}

impl LoggerSettings {
    /// # Validation Rules
    /// - Log level must be one of: trace, debug, info, warn, error
    /// - If file logging is enabled, path must not be empty
    /// - Log format must be one of: full, compact, json
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_LOG_LEVELS.contains(&self.level.to_lowercase().as_str()) {
            return Err(ConfigError::validation(
                "logger.level",
                format!(
                    "Invalid log level '{}'. Valid levels are: {}",
                    self.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            ));
        }

        if self.file.enabled && self.file.path.trim().is_empty() {
            return Err(ConfigError::validation(
                "logger.file.path",
                "File path is required when file logging is enabled.",
            ));
        }

        if !VALID_LOG_FORMATS.contains(&self.file.format.to_lowercase().as_str()) {
            return Err(ConfigError::validation(
                "logger.file.format",
                format!(
                    "Invalid log format '{}'. Valid formats are: {}",
                    self.file.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            ));
        }

        if self.file.rotation.max_size == 0 || self.file.rotation.max_files == 0 {
            return Err(ConfigError::validation(
                "logger.file.rotation",
                "Rotation max_size and max_files must be greater than 0.",
            ));
        }

        Ok(())
    }
}

impl Settings {
    /// Validate all configuration settings
    ///
    /// Returns the first validation error encountered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.monitor.validate()?;
        self.fetch.validate()?;
        self.http.validate()?;
        self.notify.bark.validate()?;
        self.schedule.validate()?;
        self.logger.validate()?;
        Ok(())
    }
}
