//! Configuration loader for bili-up-watch
//!
//! This module provides the `ConfigLoader` struct that handles loading
//! configuration from multiple sources with proper precedence.

use std::path::{Path, PathBuf};

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};

use crate::config::environment::Environment as AppEnvironment;
use crate::config::error::ConfigError;
use crate::config::settings::Settings;

/// Environment variable for configuration directory
const CONFIG_DIR_ENV: &str = "BILIWATCH_CONFIG_DIR";

/// Environment variable for specific configuration file
const CONFIG_FILE_ENV: &str = "BILIWATCH_CONFIG_FILE";

/// Default configuration directory
const DEFAULT_CONFIG_DIR: &str = "config";

/// Environment variable prefix for configuration overrides
const ENV_PREFIX: &str = "BILIWATCH";

/// Separator for nested configuration keys in environment variables
const ENV_SEPARATOR: &str = "__";

/// Flat variable names understood by the original monitor scripts.
///
/// Each entry maps a settings key to the variables checked for it, first
/// non-empty wins.
const LEGACY_ENV: &[(&str, &[&str])] = &[
    ("monitor.uids", &["BILIBILI_UP_UIDS", "BILI_UP_IDS"]),
    ("http.proxy", &["BILIBILI_PROXY"]),
    ("http.cookie", &["BILIBILI_COOKIE"]),
    ("notify.bark.device_key", &["BARK_KEY", "PUSH_KEY"]),
];

/// Configuration loader that handles layered configuration loading
///
/// Sources, lowest priority first:
/// 1. `default.toml`
/// 2. `{environment}.toml`
/// 3. `local.toml`
/// 4. `BILIWATCH_*` environment variables
/// 5. Legacy flat variables (`BILIBILI_UP_UIDS`, `BILIBILI_PROXY`, ...)
///
/// All files are optional; every setting has a default.
#[derive(Debug)]
pub struct ConfigLoader {
    config_dir: PathBuf,
    /// Specific configuration file path (if set, skips layered loading)
    config_file: Option<PathBuf>,
    environment: AppEnvironment,
}

impl ConfigLoader {
    /// Create a loader from `BILIWATCH_CONFIG_DIR`, `BILIWATCH_CONFIG_FILE`
    /// and `BILIWATCH_APP_ENV`.
    ///
    /// # Errors
    ///
    /// Returns an error if both the directory and the file variable are set.
    pub fn new() -> Result<Self, ConfigError> {
        let dir_override = std::env::var(CONFIG_DIR_ENV).ok();
        let config_file = std::env::var(CONFIG_FILE_ENV).ok().map(PathBuf::from);

        if config_file.is_some() && dir_override.is_some() {
            return Err(ConfigError::mutual_exclusivity(
                "BILIWATCH_CONFIG_DIR and BILIWATCH_CONFIG_FILE cannot both be set. \
                 Use BILIWATCH_CONFIG_DIR for layered configuration or \
                 BILIWATCH_CONFIG_FILE for a single configuration file.",
            ));
        }

        Ok(Self {
            config_dir: dir_override
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR)),
            config_file,
            environment: AppEnvironment::from_env(),
        })
    }

    /// Loader for a single explicit file, as given by `--config`
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
            config_file: Some(path.into()),
            environment: AppEnvironment::from_env(),
        }
    }

    /// Override the environment used to pick `{environment}.toml`
    pub fn with_environment(mut self, environment: AppEnvironment) -> Self {
        self.environment = environment;
        self
    }

    pub fn environment(&self) -> AppEnvironment {
        self.environment
    }

    /// Load and validate configuration from all sources
    pub fn load(&self) -> Result<Settings, ConfigError> {
        let config = self.build_config()?;
        let settings: Settings = config.try_deserialize().map_err(|e| {
            ConfigError::ParseError(format!("Failed to deserialize configuration: {}", e))
        })?;

        settings.validate()?;

        Ok(settings)
    }

    fn build_config(&self) -> Result<Config, ConfigError> {
        let builder = Config::builder();

        let builder = match &self.config_file {
            Some(config_file) => Self::add_file_source(builder, config_file, true)?,
            None => self.build_layered_config(builder)?,
        };

        // BILIWATCH_FETCH__MAX_RETRIES -> fetch.max_retries
        let builder = Self::add_env_source(builder);
        let builder = Self::add_legacy_env_overrides(builder)?;

        builder.build().map_err(ConfigError::from)
    }

    fn build_layered_config(
        &self,
        builder: ConfigBuilder<DefaultState>,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let builder = Self::add_file_source(builder, &self.config_dir.join("default.toml"), false)?;

        let env_path = self
            .config_dir
            .join(self.environment.overlay_file());
        let builder = Self::add_file_source(builder, &env_path, false)?;

        Self::add_file_source(builder, &self.config_dir.join("local.toml"), false)
    }

    fn add_file_source(
        builder: ConfigBuilder<DefaultState>,
        path: &Path,
        required: bool,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        if required && !path.exists() {
            return Err(ConfigError::file_not_found(format!(
                "Required configuration file not found: {}",
                path.display()
            )));
        }

        Ok(builder.add_source(File::from(path).format(FileFormat::Toml).required(required)))
    }

    fn add_env_source(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
        builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator(ENV_SEPARATOR)
                .ignore_empty(true)
                .try_parsing(true),
        )
    }

    fn add_legacy_env_overrides(
        mut builder: ConfigBuilder<DefaultState>,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        for (key, names) in LEGACY_ENV {
            let value = names.iter().find_map(|name| {
                std::env::var(name)
                    .ok()
                    .filter(|value| !value.trim().is_empty())
            });
            builder = builder.set_override_option(*key, value)?;
        }
        Ok(builder)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new().unwrap_or_else(|_| Self {
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
            config_file: None,
            environment: AppEnvironment::default(),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Serializes every test that touches process environment variables
    pub(crate) static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const MANAGED_VARS: &[&str] = &[
        "BILIWATCH_CONFIG_DIR",
        "BILIWATCH_CONFIG_FILE",
        "BILIWATCH_APP_ENV",
        "BILIWATCH_MONITOR__UIDS",
        "BILIWATCH_FETCH__MAX_RETRIES",
        "BILIBILI_UP_UIDS",
        "BILI_UP_IDS",
        "BILIBILI_PROXY",
        "BILIBILI_COOKIE",
        "BARK_KEY",
        "PUSH_KEY",
    ];

    fn setup_config_dir(files: &[(&str, &str)]) -> TempDir {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        for (name, content) in files {
            fs::write(temp_dir.path().join(name), content).expect("Failed to write config file");
        }
        temp_dir
    }

    /// Restores touched variables on drop
    pub(crate) struct EnvGuard {
        vars_to_restore: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        /// Starts from a clean slate for every variable the loader reads
        pub(crate) fn clean() -> Self {
            let mut guard = Self {
                vars_to_restore: Vec::new(),
            };
            for name in MANAGED_VARS {
                guard.remove(name);
            }
            guard
        }

        pub(crate) fn set(&mut self, key: &str, value: &str) {
            self.vars_to_restore
                .push((key.to_string(), std::env::var(key).ok()));
            unsafe {
                std::env::set_var(key, value);
            }
        }

        pub(crate) fn remove(&mut self, key: &str) {
            self.vars_to_restore
                .push((key.to_string(), std::env::var(key).ok()));
            unsafe {
                std::env::remove_var(key);
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, original_value) in self.vars_to_restore.iter().rev() {
                unsafe {
                    match original_value {
                        Some(value) => std::env::set_var(key, value),
                        None => std::env::remove_var(key),
                    }
                }
            }
        }
    }

    #[test]
    fn test_config_loader_new_default() {
        let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let _env = EnvGuard::clean();

        let loader = ConfigLoader::new().expect("Should create loader");
        assert_eq!(loader.config_dir, PathBuf::from("config"));
        assert!(loader.config_file.is_none());
        assert_eq!(loader.environment, AppEnvironment::Development);
    }

    #[test]
    fn test_config_loader_mutual_exclusivity_error() {
        let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let mut env = EnvGuard::clean();
        env.set("BILIWATCH_CONFIG_DIR", "/custom/config");
        env.set("BILIWATCH_CONFIG_FILE", "/path/to/config.toml");

        match ConfigLoader::new() {
            Err(ConfigError::MutualExclusivityError(msg)) => {
                assert!(msg.contains("BILIWATCH_CONFIG_DIR"));
                assert!(msg.contains("BILIWATCH_CONFIG_FILE"));
            }
            other => panic!("Expected MutualExclusivityError, got {other:?}"),
        }
    }

    #[test]
    fn test_load_without_any_files_uses_defaults() {
        let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let mut env = EnvGuard::clean();
        let temp_dir = setup_config_dir(&[]);
        env.set("BILIWATCH_CONFIG_DIR", temp_dir.path().to_str().unwrap());

        let settings = ConfigLoader::new().unwrap().load().expect("Should load defaults");
        assert!(settings.monitor.uids.is_empty());
        assert_eq!(settings.monitor.ledger_path, "video_history.json");
        assert_eq!(settings.fetch.max_retries, 3);
    }

    #[test]
    fn test_layered_files_and_environment_override() {
        let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let mut env = EnvGuard::clean();

        let default_config = r#"
[monitor]
uids = ["1", "2"]
page_size = 5

[fetch]
max_retries = 3
retry_delay_secs = 5
"#;
        let production_config = r#"
[monitor]
page_size = 10
"#;
        let local_config = r#"
[fetch]
retry_delay_secs = 1.5
"#;

        let temp_dir = setup_config_dir(&[
            ("default.toml", default_config),
            ("production.toml", production_config),
            ("local.toml", local_config),
        ]);
        env.set("BILIWATCH_CONFIG_DIR", temp_dir.path().to_str().unwrap());
        env.set("BILIWATCH_APP_ENV", "production");
        env.set("BILIWATCH_FETCH__MAX_RETRIES", "5");

        let settings = ConfigLoader::new().unwrap().load().expect("Should load settings");

        assert_eq!(settings.monitor.uids, vec!["1", "2"]);
        assert_eq!(settings.monitor.page_size, 10);
        assert_eq!(settings.fetch.retry_delay_secs, 1.5);
        assert_eq!(settings.fetch.max_retries, 5);
    }

    #[test]
    fn test_structured_env_uid_list() {
        let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let mut env = EnvGuard::clean();
        let temp_dir = setup_config_dir(&[]);
        env.set("BILIWATCH_CONFIG_DIR", temp_dir.path().to_str().unwrap());
        env.set("BILIWATCH_MONITOR__UIDS", "111,222");

        let settings = ConfigLoader::new().unwrap().load().unwrap();
        assert_eq!(settings.monitor.uids, vec!["111", "222"]);
    }

    #[test]
    fn test_legacy_env_names_override_files() {
        let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let mut env = EnvGuard::clean();

        let temp_dir = setup_config_dir(&[(
            "default.toml",
            "[monitor]\nuids = \"1\"\n[http]\nproxy = \"http://file-proxy:8080\"\n",
        )]);
        env.set("BILIWATCH_CONFIG_DIR", temp_dir.path().to_str().unwrap());
        env.set("BILIBILI_UP_UIDS", "9617619, 2");
        env.set("BILIBILI_PROXY", "http://127.0.0.1:7890");
        env.set("BILIBILI_COOKIE", "SESSDATA=abc");
        env.set("PUSH_KEY", "device-key");

        let settings = ConfigLoader::new().unwrap().load().unwrap();
        assert_eq!(settings.monitor.uids, vec!["9617619", "2"]);
        assert_eq!(settings.http.proxy.as_deref(), Some("http://127.0.0.1:7890"));
        assert_eq!(settings.http.cookie.as_deref(), Some("SESSDATA=abc"));
        assert_eq!(settings.notify.bark.device_key, "device-key");
    }

    #[test]
    fn test_js_script_uid_alias() {
        let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let mut env = EnvGuard::clean();
        let temp_dir = setup_config_dir(&[]);
        env.set("BILIWATCH_CONFIG_DIR", temp_dir.path().to_str().unwrap());
        env.set("BILI_UP_IDS", "42");

        let settings = ConfigLoader::new().unwrap().load().unwrap();
        assert_eq!(settings.monitor.uids, vec!["42"]);
    }

    #[test]
    fn test_single_file_mode_requires_file() {
        let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let _env = EnvGuard::clean();

        let result = ConfigLoader::from_file("/definitely/missing/bili.toml").load();
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_single_file_mode_from_serialized_settings() {
        let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let _env = EnvGuard::clean();

        let mut expected = Settings::default();
        expected.monitor.uids = vec!["7".into()];
        expected.monitor.page_size = 3;
        expected.notify.host.enabled = false;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bili.toml");
        fs::write(&path, toml::to_string(&expected).unwrap()).unwrap();

        let settings = ConfigLoader::from_file(&path).load().unwrap();
        assert_eq!(settings, expected);
    }

    #[test]
    fn test_invalid_values_fail_validation() {
        let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let _env = EnvGuard::clean();

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bili.toml");
        fs::write(&path, "[fetch]\nmax_retries = 0\n").unwrap();

        let result = ConfigLoader::from_file(&path).load();
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }
}
