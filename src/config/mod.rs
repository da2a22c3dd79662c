mod settings;

pub use settings::{default_database_path, DatabaseConfig, LoggingConfig, Settings, DB_PATH_ENV};
