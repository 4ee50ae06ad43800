use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct NomadishConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    /// `"file"` or `"sqlite"`.
    pub backend: String,
    pub cache_path: String,
    pub db_path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".into(),
            timeout_secs: 15,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let dir = default_nomadish_dir();
        Self {
            backend: "file".into(),
            cache_path: dir
                .join(format!("{}.json", crate::cache::CACHE_KEY))
                .to_string_lossy()
                .into_owned(),
            db_path: dir.join("cache.db").to_string_lossy().into_owned(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
        }
    }
}

/// Returns `~/.nomadish/`, or `./.nomadish/` when no home directory is known.
pub fn default_nomadish_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".nomadish")
}

/// Returns the default config file path: `~/.nomadish/config.toml`
pub fn default_config_path() -> PathBuf {
    default_nomadish_dir().join("config.toml")
}

impl NomadishConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            NomadishConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (NOMADISH_SERVER_URL, NOMADISH_BACKEND,
    /// NOMADISH_CACHE, NOMADISH_DB, NOMADISH_LOG_LEVEL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("NOMADISH_SERVER_URL") {
            self.server.base_url = val;
        }
        if let Ok(val) = std::env::var("NOMADISH_BACKEND") {
            self.storage.backend = val;
        }
        if let Ok(val) = std::env::var("NOMADISH_CACHE") {
            self.storage.cache_path = val;
        }
        if let Ok(val) = std::env::var("NOMADISH_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("NOMADISH_LOG_LEVEL") {
            self.logging.log_level = val;
        }
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
