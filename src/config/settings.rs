//! Configuration settings structures for bili-up-watch
//!
//! This module defines all configuration structures that can be loaded from
//! TOML files and environment variables.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::config::error::ConfigError;
use crate::logger::{ConsoleConfig, FileConfig, LogFormat, LoggerConfig, RotationConfig};

const REDACTED: &str = "***";

// ============================================================================
// Default value functions
// ============================================================================

fn default_app_name() -> String {
    "bili-up-watch".to_string()
}

fn default_app_version() -> String {
    crate::pkg_version().to_string()
}

fn default_ledger_path() -> String {
    "video_history.json".to_string()
}

fn default_page_size() -> u32 {
    5
}

fn default_request_delay() -> f64 {
    3.0
}

fn default_jitter_min() -> f64 {
    1.0
}

fn default_jitter_max() -> f64 {
    3.0
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay() -> f64 {
    5.0
}

fn default_http_timeout() -> u64 {
    10
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_marker_env() -> String {
    "QL_DIR".to_string()
}

fn default_host_program() -> String {
    "python3".to_string()
}

fn default_host_args() -> Vec<String> {
    vec![
        "-c".to_string(),
        "import sys; from notify import send; send(sys.argv[1], sys.argv[2])".to_string(),
    ]
}

fn default_bark_server() -> String {
    "https://api.day.app".to_string()
}

fn default_cron() -> String {
    "0 */10 * * * *".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_path() -> String {
    "logs/bili-up-watch.log".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_max_size() -> u64 {
    10 * 1024 * 1024 // 10MB
}

fn default_max_files() -> usize {
    5
}

// ============================================================================
// Application Configuration
// ============================================================================

/// Application basic information configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Application name
    #[serde(default = "default_app_name")]
    pub name: String,

    /// Application version
    #[serde(default = "default_app_version")]
    pub version: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            version: default_app_version(),
        }
    }
}

// ============================================================================
// Monitor Configuration
// ============================================================================

/// Which authors to poll and where the seen-ledger lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Tracked author ids (`mid`). Accepts a list or a comma-separated string.
    #[serde(default, deserialize_with = "deserialize_uid_list")]
    pub uids: Vec<String>,

    /// Path of the JSON seen-ledger
    #[serde(default = "default_ledger_path")]
    pub ledger_path: String,

    /// Number of most recent videos requested per author
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// IANA time zone used when formatting publish times; system zone if unset
    #[serde(default)]
    pub timezone: Option<String>,
}

impl MonitorConfig {
    /// Author ids with surrounding whitespace removed and blank entries dropped
    pub fn tracked_uids(&self) -> Vec<String> {
        self.uids
            .iter()
            .map(|uid| uid.trim())
            .filter(|uid| !uid.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn ledger_path(&self) -> PathBuf {
        PathBuf::from(&self.ledger_path)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            uids: Vec::new(),
            ledger_path: default_ledger_path(),
            page_size: default_page_size(),
            timezone: None,
        }
    }
}

/// Parses a comma-separated string into author ids
pub fn split_uid_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|uid| uid.trim())
        .filter(|uid| !uid.is_empty())
        .map(str::to_string)
        .collect()
}

fn deserialize_uid_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct UidListVisitor;

    impl<'de> Visitor<'de> for UidListVisitor {
        type Value = Vec<String>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a list of author ids or a comma-separated string")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(split_uid_list(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(vec![v.to_string()])
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(vec![v.to_string()])
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut uids = Vec::new();
            while let Some(entry) = seq.next_element::<UidEntry>()? {
                uids.push(entry.0);
            }
            Ok(uids)
        }
    }

    deserializer.deserialize_any(UidListVisitor)
}

/// A single list entry; TOML and env parsing may hand over numbers
struct UidEntry(String);

impl<'de> Deserialize<'de> for UidEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntryVisitor;

        impl Visitor<'_> for EntryVisitor {
            type Value = UidEntry;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an author id")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(UidEntry(v.trim().to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(UidEntry(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(UidEntry(v.to_string()))
            }
        }

        deserializer.deserialize_any(EntryVisitor)
    }
}

// ============================================================================
// Fetch Policy Configuration
// ============================================================================

/// Pacing and retry policy for listing requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Fixed delay before every request, in seconds
    #[serde(default = "default_request_delay")]
    pub request_delay_secs: f64,

    /// Lower bound of the random jitter added to the delay, in seconds
    #[serde(default = "default_jitter_min")]
    pub jitter_min_secs: f64,

    /// Upper bound of the random jitter added to the delay, in seconds
    #[serde(default = "default_jitter_max")]
    pub jitter_max_secs: f64,

    /// Total number of attempts for rate-limited or failed requests
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff unit; attempt `n` waits `retry_delay_secs * n`
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: f64,

    /// Sign listing requests with WBI parameters
    #[serde(default = "default_true")]
    pub sign_requests: bool,
}

impl FetchConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_secs_f64(self.request_delay_secs.max(0.0))
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs_f64(self.retry_delay_secs.max(0.0))
    }

    /// Fetch policy without any waiting, used by tests and dry runs
    pub fn immediate() -> Self {
        Self {
            request_delay_secs: 0.0,
            jitter_min_secs: 0.0,
            jitter_max_secs: 0.0,
            retry_delay_secs: 0.0,
            ..Self::default()
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            request_delay_secs: default_request_delay(),
            jitter_min_secs: default_jitter_min(),
            jitter_max_secs: default_jitter_max(),
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay(),
            sign_requests: true,
        }
    }
}

// ============================================================================
// HTTP Configuration
// ============================================================================

/// Outbound HTTP client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,

    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Outbound proxy URL (http, https or socks5)
    #[serde(default)]
    pub proxy: Option<String>,

    /// Session cookie string sent with listing requests
    #[serde(default)]
    pub cookie: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_http_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            proxy: None,
            cookie: None,
        }
    }
}

// ============================================================================
// Notification Configuration
// ============================================================================

/// Host automation panel notification settings
///
/// When the marker variable is present the process is assumed to run inside a
/// scheduler panel that ships its own `notify` helper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostNotifyConfig {
    /// Whether host delegation is considered at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Environment variable whose presence marks the host environment
    #[serde(default = "default_marker_env")]
    pub marker_env: String,

    /// Program invoked to send a notification
    #[serde(default = "default_host_program")]
    pub program: String,

    /// Arguments placed before the title and body
    #[serde(default = "default_host_args")]
    pub args: Vec<String>,

    /// Working directory for the program; derived from the marker when unset
    #[serde(default)]
    pub scripts_dir: Option<String>,
}

impl Default for HostNotifyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            marker_env: default_marker_env(),
            program: default_host_program(),
            args: default_host_args(),
            scripts_dir: None,
        }
    }
}

/// Bark push configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarkConfig {
    /// Bark server base URL
    #[serde(default = "default_bark_server")]
    pub server_url: String,

    /// Device key; the push channel is disabled while this is empty
    #[serde(default)]
    pub device_key: String,

    #[serde(default)]
    pub group: Option<String>,

    #[serde(default)]
    pub sound: Option<String>,

    #[serde(default)]
    pub icon: Option<String>,

    /// One of `active`, `timeSensitive`, `passive`
    #[serde(default)]
    pub level: Option<String>,
}

impl BarkConfig {
    pub fn is_configured(&self) -> bool {
        !self.device_key.trim().is_empty()
    }

    /// Push endpoint; the device key travels in the JSON body
    pub fn build_api_url(&self) -> String {
        format!("{}/push", self.server_url.trim_end_matches('/'))
    }
}

impl Default for BarkConfig {
    fn default() -> Self {
        Self {
            server_url: default_bark_server(),
            device_key: String::new(),
            group: None,
            sound: None,
            icon: None,
            level: None,
        }
    }
}

/// Notification channel settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NotifyConfig {
    #[serde(default)]
    pub host: HostNotifyConfig,

    #[serde(default)]
    pub bark: BarkConfig,
}

// ============================================================================
// Schedule Configuration
// ============================================================================

/// Cron schedule used by `watch` mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Six-field cron expression (with seconds)
    #[serde(default = "default_cron")]
    pub cron: String,

    /// Run one pass immediately when the watcher starts
    #[serde(default = "default_true")]
    pub run_on_start: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            cron: default_cron(),
            run_on_start: true,
        }
    }
}

// ============================================================================
// Logger Settings
// ============================================================================

/// Console output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_true")]
    pub colored: bool,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            colored: true,
        }
    }
}

/// Size-based rotation settings for file logging
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationSettings {
    /// Maximum file size in bytes before rotation
    #[serde(default = "default_max_size")]
    pub max_size: u64,

    /// Maximum number of rotated files to keep
    #[serde(default = "default_max_files")]
    pub max_files: usize,

    /// Gzip rotated files
    #[serde(default)]
    pub compress: bool,
}

impl Default for RotationSettings {
    fn default() -> Self {
        Self {
            max_size: default_max_size(),
            max_files: default_max_files(),
            compress: false,
        }
    }
}

/// File output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSettings {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_log_path")]
    pub path: String,

    #[serde(default = "default_true")]
    pub append: bool,

    /// Log format: "full", "compact", or "json"
    #[serde(default = "default_log_format")]
    pub format: String,

    #[serde(default)]
    pub rotation: RotationSettings,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_log_path(),
            append: true,
            format: default_log_format(),
            rotation: RotationSettings::default(),
        }
    }
}

/// Logger configuration settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerSettings {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub console: ConsoleSettings,

    #[serde(default)]
    pub file: FileSettings,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            console: ConsoleSettings::default(),
            file: FileSettings::default(),
        }
    }
}

impl LoggerSettings {
    /// Convert the file representation into the runtime logger configuration
    pub fn into_logger_config(self) -> Result<LoggerConfig, ConfigError> {
        let format = self
            .file
            .format
            .parse::<LogFormat>()
            .map_err(|e| ConfigError::validation("logger.file.format", &e.to_string()))?;

        let rotation = RotationConfig {
            max_size: self.file.rotation.max_size,
            max_files: self.file.rotation.max_files,
            compress: self.file.rotation.compress,
        };

        let config = LoggerConfig {
            level: self.level,
            console: ConsoleConfig {
                enabled: self.console.enabled,
                colored: self.console.colored,
            },
            file: FileConfig {
                enabled: self.file.enabled,
                path: PathBuf::from(self.file.path),
                append: self.file.append,
                format,
                rotation,
            },
        };

        config
            .validate()
            .map_err(|e| ConfigError::validation("logger", &e.to_string()))?;

        Ok(config)
    }
}

// ============================================================================
// Main Settings Structure
// ============================================================================

/// Complete application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub application: ApplicationConfig,

    #[serde(default)]
    pub monitor: MonitorConfig,

    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub notify: NotifyConfig,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub logger: LoggerSettings,
}

impl Settings {
    /// Copy of the settings with credentials masked, safe to print
    pub fn redacted(&self) -> Settings {
        let mut copy = self.clone();
        if copy.http.cookie.is_some() {
            copy.http.cookie = Some(REDACTED.to_string());
        }
        if copy.notify.bark.is_configured() {
            copy.notify.bark.device_key = REDACTED.to_string();
        }
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Wrapper {
        #[serde(default, deserialize_with = "deserialize_uid_list")]
        uids: Vec<String>,
    }

    #[test]
    fn test_uids_from_comma_string() {
        let parsed: Wrapper = toml::from_str(r#"uids = "123, 456,,789 ""#).unwrap();
        assert_eq!(parsed.uids, vec!["123", "456", "789"]);
    }

    #[test]
    fn test_uids_from_mixed_array() {
        let parsed: Wrapper = toml::from_str(r#"uids = [123, "456"]"#).unwrap();
        assert_eq!(parsed.uids, vec!["123", "456"]);
    }

    #[test]
    fn test_uids_from_single_number() {
        let value = serde_json::json!({ "uids": 9617619 });
        let parsed: Wrapper = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.uids, vec!["9617619"]);
    }

    #[test]
    fn test_tracked_uids_skip_blank_entries() {
        let monitor = MonitorConfig {
            uids: vec!["  1 ".into(), "".into(), "   ".into(), "2".into()],
            ..Default::default()
        };
        assert_eq!(monitor.tracked_uids(), vec!["1", "2"]);
    }

    #[test]
    fn test_defaults_match_original_pacing() {
        let fetch = FetchConfig::default();
        assert_eq!(fetch.max_retries, 3);
        assert_eq!(fetch.request_delay(), Duration::from_secs(3));
        assert_eq!(fetch.retry_delay(), Duration::from_secs(5));
        assert_eq!(MonitorConfig::default().page_size, 5);
        assert_eq!(HttpConfig::default().timeout_secs, 10);
    }

    #[test]
    fn test_bark_api_url_trailing_slash() {
        let bark = BarkConfig {
            server_url: "https://bark.example.com/".to_string(),
            device_key: "key".to_string(),
            ..Default::default()
        };
        assert_eq!(bark.build_api_url(), "https://bark.example.com/push");
        assert!(bark.is_configured());
        assert!(!BarkConfig::default().is_configured());
    }

    #[test]
    fn test_redacted_masks_secrets() {
        let mut settings = Settings::default();
        settings.http.cookie = Some("SESSDATA=abc".to_string());
        settings.notify.bark.device_key = "device".to_string();

        let redacted = settings.redacted();
        assert_eq!(redacted.http.cookie.as_deref(), Some("***"));
        assert_eq!(redacted.notify.bark.device_key, "***");
        assert_eq!(settings.http.cookie.as_deref(), Some("SESSDATA=abc"));
    }

    #[test]
    fn test_settings_toml_defaults() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_logger_settings_conversion() {
        let settings = LoggerSettings {
            level: "debug".to_string(),
            file: FileSettings {
                format: "compact".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        let config = settings.into_logger_config().unwrap();
        assert_eq!(config.level, "debug");
        assert_eq!(config.file.format, LogFormat::Compact);
    }

    #[test]
    fn test_logger_settings_invalid_format() {
        let settings = LoggerSettings {
            file: FileSettings {
                format: "xml".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(settings.into_logger_config().is_err());
    }
}
