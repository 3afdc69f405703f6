//! Run configuration: where the series live, which symbols to rank, how
//! many workers to use, and the embedded engine settings.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use trendscout_core::{EngineConfig, Symbol};

use crate::data_loader::ColumnMap;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read run config '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse run config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("engine config: {0}")]
    Engine(#[from] trendscout_core::ConfigError),
}

/// Batch run settings, loaded from TOML.
///
/// ```toml
/// data_dir = "data/daily"
/// output_dir = "reports"
/// threads = 4
/// symbols = ["600519", "000858"]
///
/// [engine.strategy]
/// min_score = 70
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Directory holding one `<symbol>.csv` or `<symbol>.json` per symbol.
    pub data_dir: PathBuf,
    /// Optional allow-list; every file in `data_dir` when absent.
    pub symbols: Option<Vec<Symbol>>,
    /// Worker threads for the per-symbol fan-out (0 = rayon default).
    pub threads: usize,
    pub output_dir: PathBuf,
    pub columns: ColumnMap,
    pub engine: EngineConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            symbols: None,
            threads: 0,
            output_dir: PathBuf::from("reports"),
            columns: ColumnMap::default(),
            engine: EngineConfig::default(),
        }
    }
}

impl RunConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.engine.validate()?;
        Ok(config)
    }
}
