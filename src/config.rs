use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::KindredError;

fn default_clusters() -> usize {
    4
}

fn default_kmeans_seed() -> u64 {
    42
}

/// Startup configuration. The interest schema is configuration data, not
/// something the core hardcodes.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub db_path: PathBuf,
    pub interests: Vec<String>,
    #[serde(default = "default_clusters")]
    pub clusters: usize,
    #[serde(default = "default_kmeans_seed")]
    pub kmeans_seed: u64,
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, KindredError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, KindredError> {
        let config: Config = toml::from_str(raw)?;
        Ok(config)
    }
}
