//! Service configuration, loaded from an optional TOML file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub attributes: AttributeConfig,
    pub preload: PreloadConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,
    /// Largest accepted upload, in megabytes
    pub max_upload_mb: usize,
    /// Feature cap for the GeoJSON export when the caller gives none
    pub export_limit: usize,
    pub default_radius_meters: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8000".to_string(),
            max_upload_mb: 256,
            export_limit: 1000,
            default_radius_meters: 1000.0,
        }
    }
}

impl ServerConfig {
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Attribute names the aggregator and filters rely on
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AttributeConfig {
    pub neighborhood: String,
    pub terrain_area: String,
    pub total_price: String,
    pub private_area: String,
    pub bedrooms: String,
}

impl Default for AttributeConfig {
    fn default() -> Self {
        Self {
            neighborhood: "bairro".to_string(),
            terrain_area: "area_terreno".to_string(),
            total_price: "preco_total".to_string(),
            private_area: "metragem_privativa".to_string(),
            bedrooms: "dormitorios".to_string(),
        }
    }
}

/// Datasets to load at startup
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct PreloadConfig {
    pub lotes: Option<PathBuf>,
    pub imoveis: Option<PathBuf>,
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }
}
