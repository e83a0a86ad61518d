//! Server configuration.

use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;
use waypost_core::ResolutionCache;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Root of the module tree served by filesystem-backed sources.
    #[serde(default = "default_routes_dir")]
    pub routes_dir: PathBuf,
    /// Resolution cache capacity; 0 disables caching.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    /// File extensions recognized as modules when walking `routes_dir`.
    #[serde(default = "default_module_extensions")]
    pub module_extensions: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_routes_dir() -> PathBuf {
    PathBuf::from("./routes")
}

fn default_cache_capacity() -> usize {
    ResolutionCache::DEFAULT_CAPACITY
}

fn default_module_extensions() -> Vec<String> {
    vec!["handler".to_string()]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            routes_dir: default_routes_dir(),
            cache_capacity: default_cache_capacity(),
            module_extensions: default_module_extensions(),
        }
    }
}

impl Config {
    /// Load config from a specific file path.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load config from the default location (config/default.toml) or fall
    /// back to defaults.
    pub fn load() -> Result<Self> {
        let config_path = PathBuf::from("config/default.toml");
        if config_path.exists() {
            return Self::load_from(&config_path);
        }

        Ok(Config::default())
    }
}
