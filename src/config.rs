use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::catalog::{DEFAULT_EXTENSION, DEFAULT_LAYERS_DIR};
use crate::evaluator::Evaluator;

pub const DEFAULT_LISTEN: &str = "0.0.0.0:8000";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub layers: LayersConfig,
    pub evaluation: EvaluationConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,
    /// tracing level name: "error" .. "trace"
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LayersConfig {
    pub dir: PathBuf,
    pub extension: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EvaluationConfig {
    pub parallel: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN.to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for LayersConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_LAYERS_DIR),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self { parallel: true }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Load from `path` when given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from_file(p),
            None => Ok(Self::default()),
        }
    }

    pub fn evaluator(&self) -> Evaluator {
        Evaluator::new(&self.layers.dir)
            .with_extension(&self.layers.extension)
            .with_parallel(self.evaluation.parallel)
    }
}
