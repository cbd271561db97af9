//! Configuration management module for bili-up-watch
//!
//! This module provides layered configuration loading with support for:
//! - TOML configuration files
//! - Environment variable overrides
//! - Multiple environment configurations (development, production)
//!
//! # Configuration Priority (lowest to highest)
//! 1. `default.toml` - Base default configuration
//! 2. `{environment}.toml` - Environment-specific configuration
//! 3. `local.toml` - Local overrides (not committed to version control)
//! 4. `BILIWATCH_*` environment variables
//! 5. Flat variables kept from the original scripts (`BILIBILI_UP_UIDS`, `BILIBILI_PROXY`, ...)

pub mod environment;
pub mod error;
pub mod loader;
pub mod settings;
pub mod validation;

pub use environment::Environment;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use settings::{
    ApplicationConfig, BarkConfig, FetchConfig, HostNotifyConfig, HttpConfig, LoggerSettings,
    MonitorConfig, NotifyConfig, ScheduleConfig, Settings, split_uid_list,
};
