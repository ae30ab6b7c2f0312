//! Engine configuration: weighting coefficients and aggregation switches.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::weighting::WeightingTable;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub weighting: WeightingTable,
    /// Open deals older than this many days are stalled.
    pub stale_after_days: i64,
    /// Count Lost/NotRelevant deals in raw "created pipe" volume.
    /// They are never weighted either way.
    pub created_pipe_includes_lost: bool,
    pub hot_deal_limit: usize,
    /// Hot leads must have been discovered within this many days.
    pub hot_lead_window_days: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            weighting: WeightingTable::default(),
            stale_after_days: 90,
            created_pipe_includes_lost: true,
            hot_deal_limit: 10,
            hot_lead_window_days: 30,
        }
    }
}

/// Load engine config from a JSON file. Missing fields take defaults.
pub fn load_engine_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: EngineConfig = serde_json::from_str(&content)?;
    validate_engine_config(&config)?;
    log::info!("Loaded engine config from {}", path.display());
    Ok(config)
}

/// Validate coefficient ranges and window sizes.
pub fn validate_engine_config(config: &EngineConfig) -> Result<(), ConfigError> {
    config.weighting.validate().map_err(ConfigError::Invalid)?;
    if config.stale_after_days <= 0 {
        return Err(ConfigError::Invalid("staleAfterDays must be positive".into()));
    }
    if config.hot_lead_window_days <= 0 {
        return Err(ConfigError::Invalid("hotLeadWindowDays must be positive".into()));
    }
    if config.hot_deal_limit == 0 {
        return Err(ConfigError::Invalid("hotDealLimit must be at least 1".into()));
    }
    Ok(())
}
