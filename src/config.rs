use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "medrec";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Special database name that keeps everything in memory.
pub const MEMORY_DATABASE: &str = ":memory:";

/// Log filter used when neither `RUST_LOG` nor the config file set one.
pub fn default_log_filter() -> &'static str {
    "medrec=info,medrec_lib=info"
}

/// Get the application data directory (`<data dir>/medrec`).
///
/// Falls back to the working directory when the platform reports no data dir.
pub fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default location of the TOML config file (`<config dir>/medrec/config.toml`).
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
        .join("config.toml")
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Connection parameters for the record store.
///
/// `host`, `port` and `user` are recognized so that one config file can
/// describe the store for every adapter; the embedded engine only reads
/// `database`, `password` (SQLCipher key) and the tuning knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    /// How long a statement waits on a locked database file before failing.
    pub busy_timeout_ms: u64,
    /// Create the four record tables on open if they are missing.
    pub bootstrap_schema: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 5432,
            user: "postgres".into(),
            password: String::new(),
            database: "medical_history".into(),
            busy_timeout_ms: 5_000,
            bootstrap_schema: true,
        }
    }
}

impl DatabaseConfig {
    /// Config for a private in-memory store (tests, dry runs).
    pub fn in_memory() -> Self {
        Self {
            database: MEMORY_DATABASE.into(),
            ..Self::default()
        }
    }

    /// Config for a database file at an explicit path.
    pub fn at_path(path: &Path) -> Self {
        Self {
            database: path.display().to_string(),
            ..Self::default()
        }
    }

    pub fn is_memory(&self) -> bool {
        self.database == MEMORY_DATABASE
    }

    /// Resolve `database` to the file that will be opened.
    ///
    /// Names containing a path separator or ending in `.db` are paths; bare
    /// names live under [`app_data_dir`].
    pub fn database_path(&self) -> PathBuf {
        let db = self.database.as_str();
        if db == MEMORY_DATABASE || db.contains(['/', '\\']) || db.ends_with(".db") {
            PathBuf::from(db)
        } else {
            app_data_dir().join(format!("{db}.db"))
        }
    }

    /// Human-readable connection target for logs. Never includes the password.
    pub fn target(&self) -> String {
        format!(
            "{}@{}:{}/{}",
            self.user,
            self.host,
            self.port,
            self.database_path().display()
        )
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// `tracing_subscriber::EnvFilter` directive, e.g. `"medrec_lib=debug"`.
    pub log_filter: Option<String>,
    pub database: DatabaseConfig,
}

impl AppConfig {
    /// Load the config at `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(default_log_filter())
    }
}
