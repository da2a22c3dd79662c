use std::env;
use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Environment variable that overrides the database location
pub const DB_PATH_ENV: &str = "NOTIFICATION_HUB_DB";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database file
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
    /// Maximum pooled connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// How long a writer waits on a locked database, in milliseconds
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

/// `<home>/.notification-hub/notification_hub.db`
pub fn default_database_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".notification-hub")
        .join("notification_hub.db")
}

fn default_max_connections() -> u32 {
    4
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        Self::load(env::var(DB_PATH_ENV).ok())
    }

    /// Build settings with an explicit database path override.
    ///
    /// Sources, lowest priority first: defaults, `config/default`,
    /// `config/{RUN_MODE}`, `HUB__*` environment variables, `db_path`.
    pub fn load(db_path: Option<String>) -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .set_default(
                "database.path",
                default_database_path().to_string_lossy().into_owned(),
            )?
            .set_default("database.max_connections", default_max_connections() as i64)?
            .set_default("database.busy_timeout_ms", default_busy_timeout_ms() as i64)?
            .set_default("logging.level", default_log_level())?
            .set_default("logging.json", false)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // HUB__DATABASE__PATH, HUB__LOGGING__LEVEL, etc.
            .add_source(
                Environment::with_prefix("HUB")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("database.path", db_path)?;

        builder.build()?.try_deserialize()
    }

    /// Replace the database location (CLI `--db`)
    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database.path = path.into();
        self
    }
}

impl DatabaseConfig {
    /// Config for a database at `path` with default pool settings
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let db = DatabaseConfig::default();
        assert_eq!(db.max_connections, 4);
        assert_eq!(db.busy_timeout_ms, 5_000);
        assert!(db.path.ends_with(".notification-hub/notification_hub.db"));

        let logging = LoggingConfig::default();
        assert_eq!(logging.level, "warn");
        assert!(!logging.json);
    }

    #[test]
    fn test_path_override_wins() {
        let settings = Settings::load(Some("/tmp/hub-override.db".to_string())).unwrap();
        assert_eq!(settings.database.path, PathBuf::from("/tmp/hub-override.db"));
    }

    #[test]
    fn test_cli_path_replaces_loaded_path() {
        let settings = Settings::load(None)
            .unwrap()
            .with_database_path("/tmp/from-cli.db");
        assert_eq!(settings.database.path, PathBuf::from("/tmp/from-cli.db"));
    }
}
