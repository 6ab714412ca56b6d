use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use ormlog::LoggerSettings;
use ormlog_sqlite::SqliteConfig;
use serde::{Deserialize, Serialize};

/// Database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// SQLite file, `<work dir>/logs.sqlite` when unset
    pub path: Option<PathBuf>,
    pub max_connections: usize,
    pub timeout_ms: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: None,
            max_connections: 10,
            timeout_ms: 5_000,
        }
    }
}

impl DatabaseSettings {
    pub fn sqlite_config(&self, work_dir: &Path) -> SqliteConfig {
        let path = self
            .path
            .clone()
            .unwrap_or_else(|| work_dir.join("logs.sqlite"));

        SqliteConfig::file(path)
            .with_max_size(self.max_connections)
            .with_timeout(Duration::from_millis(self.timeout_ms))
    }
}

/// ormlog-cli settings, derived from `config.toml` and `ORMLOG_` environment variables
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub logging: LoggerSettings,
    pub database: DatabaseSettings,
}

impl Settings {
    /// Loads the settings, falling back to defaults when the file cannot be read
    ///
    /// Runs before the subscriber is installed, so problems go to stderr.
    #[must_use]
    pub fn new<P>(config_file_name: P) -> Self
    where
        P: Into<PathBuf>,
    {
        let default_settings = Self::default();
        // attempt to construct settings with file
        match Self::new_from_default(&default_settings, config_file_name) {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("Error reading config file, falling back to defaults. Error: {e:?}");
                default_settings
            }
        }
    }

    fn new_from_default<P>(default: &Settings, config_file_name: P) -> Result<Self, ConfigError>
    where
        P: Into<PathBuf>,
    {
        let config_file_name = config_file_name.into();

        let config: Config = Config::builder()
            // use defaults
            .add_source(Config::try_from(default)?)
            // override with file contents
            .add_source(File::from(config_file_name).required(false))
            // and with the environment
            .add_source(Environment::with_prefix("ORMLOG").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
