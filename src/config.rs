use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Server configuration, loaded from a YAML file.
///
/// Every section and field has a default, so a missing file or an empty
/// document both yield a runnable configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub static_files: StaticFilesConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address, host:port
    pub listen_addr: String,
    /// Listen backlog for pending connections
    pub backlog: i32,
    /// Per-read chunk size for request reads
    pub recv_buffer_size: usize,
    /// Upper bound on a whole request; larger requests are answered 400
    pub max_request_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// Document root for static assets
    pub root: PathBuf,
    /// Asset served for `/`
    pub index: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path of the persisted resource store document
    pub path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            backlog: 10,
            recv_buffer_size: 4096,
            max_request_size: 64 * 1024,
        }
    }
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("data/static"),
            index: "index.html".to_string(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/users.json"),
        }
    }
}

impl Config {
    /// Loads the configuration file named by `HEARTH_CONFIG` (default
    /// `hearth.yaml`); a missing file yields the defaults.
    pub fn load() -> Result<Self> {
        let path = std::env::var("HEARTH_CONFIG").unwrap_or_else(|_| "hearth.yaml".to_string());
        let path = Path::new(&path);

        if path.exists() {
            Self::from_path(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parses an explicit configuration file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_yaml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
    }
}
