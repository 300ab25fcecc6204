//! Aggregated configuration, loadable from a partial JSON file.

use crate::cache::CachePolicy;
use crate::layout::{GraphLayoutConfig, OverviewConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisConfig {
    pub graph: GraphLayoutConfig,
    pub overview: OverviewConfig,
    pub cache: CachePolicy,
    /// Activities drawn with an end marker in process graphs
    pub end_activities: Vec<String>,
}

impl Default for VisConfig {
    fn default() -> Self {
        Self {
            graph: GraphLayoutConfig::default(),
            overview: OverviewConfig::default(),
            cache: CachePolicy::default(),
            end_activities: vec!["PAYMENT_HANDLED".to_string(), "Pay invoice".to_string()],
        }
    }
}

impl VisConfig {
    pub fn from_json(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_json(&source)
    }
}
