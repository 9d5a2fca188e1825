use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LorebookConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub provider: ProviderConfig,
    pub client: ClientConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

/// Upstream text/vision model provider settings for the inference proxy.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

/// Client-side settings: where the backend lives and where the device
/// identity and cache files are kept.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ClientConfig {
    pub api_base: String,
    pub data_dir: String,
}

impl Default for LorebookConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            provider: ProviderConfig::default(),
            client: ClientConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8787,
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_lorebook_dir()
            .join("data.sqlite")
            .to_string_lossy()
            .into_owned();
        Self { db_path }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
            api_key: String::new(),
            model: "gpt-4.1-mini".into(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        let data_dir = default_lorebook_dir().to_string_lossy().into_owned();
        Self {
            api_base: String::new(),
            data_dir,
        }
    }
}

/// Returns `~/.lorebook/`
pub fn default_lorebook_dir() -> PathBuf {
    dirs::home_dir()
        .expect("home directory must exist")
        .join(".lorebook")
}

/// Returns the default config file path: `~/.lorebook/config.toml`
pub fn default_config_path() -> PathBuf {
    default_lorebook_dir().join("config.toml")
}

impl LorebookConfig {
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
            LorebookConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (LOREBOOK_DB, LOREBOOK_PORT,
    /// LOREBOOK_API_KEY, LOREBOOK_MODEL, LOREBOOK_LOG_LEVEL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("LOREBOOK_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("LOREBOOK_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("LOREBOOK_API_KEY") {
            self.provider.api_key = val;
        }
        if let Ok(val) = std::env::var("LOREBOOK_MODEL") {
            self.provider.model = val;
        }
        if let Ok(val) = std::env::var("LOREBOOK_LOG_LEVEL") {
            self.server.log_level = val;
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }

    /// Resolve the client data directory, expanding `~` if needed.
    pub fn resolved_data_dir(&self) -> PathBuf {
        expand_tilde(&self.client.data_dir)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .expect("home directory must exist")
            .join(rest)
    } else {
        PathBuf::from(path)
    }
}
