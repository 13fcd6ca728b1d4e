use anyhow::Context;
use serde::Deserialize;
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// Environment variable naming the default music directory.
pub const MUSIC_DIR_ENV: &str = "OPUSTAG_MUSIC_DIR";
const FALLBACK_MUSIC_DIR: &str = "/music";

#[derive(Debug, Deserialize)]
pub struct Config {
    pub version: u32,
    #[serde(default)]
    pub library: LibraryConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: 1,
            library: LibraryConfig::default(),
            http: HttpConfig::default(),
            fetch: FetchConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&contents).with_context(|| "Failed to parse config TOML")
    }

    /// Defaults when the file does not exist, errors when it is unreadable or invalid.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Config> {
        if path.exists() {
            Self::load(path)
        } else {
            log::info!("config {} not found, using defaults", path.display());
            Ok(Config::default())
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HttpConfig {
    pub bind_addr: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct LibraryConfig {
    pub music_dir: Option<PathBuf>,
    pub follow_symlinks: bool,
}

impl LibraryConfig {
    /// Root to scan when the caller names none: config, then environment, then `/music`.
    pub fn default_root(&self) -> PathBuf {
        self.music_dir
            .clone()
            .or_else(|| std::env::var_os(MUSIC_DIR_ENV).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(FALLBACK_MUSIC_DIR))
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
