//! Top-level visualizer configuration and TOML loading.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use super::TerrainParams;

/// Configuration loading and validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid parameter: {0}")]
    Invalid(String),
}

/// Noise algorithm backing the terrain field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum NoiseKind {
    #[default]
    OpenSimplex,
    Perlin,
    Simplex,
}

/// Noise field selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    pub kind: NoiseKind,

    /// Seed for the noise permutation table
    pub seed: u32,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            kind: NoiseKind::OpenSimplex,
            seed: 42,
        }
    }
}

/// Everything a config file can set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizerConfig {
    pub terrain: TerrainParams,
    pub noise: NoiseConfig,
}

impl VisualizerConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: VisualizerConfig = toml::from_str(text)?;
        config.terrain.validate()?;
        Ok(config)
    }
}

/// Load a configuration file; missing fields take their defaults
pub fn load_config(path: &Path) -> Result<VisualizerConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    VisualizerConfig::from_toml_str(&text)
}
