//! Engine configuration.
//!
//! Every section defaults to the product constants, so an empty JSON object
//! (or no file at all) yields the stock behaviour. Override files only need
//! the keys they change:
//!
//! ```json
//! { "scoring": { "path": { "diagonal": "allow_one_blocked_corner" } },
//!   "simulation": { "max_days": 14 } }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::scoring::ScoringConfig;
use crate::simulation::SimulationConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub scoring: ScoringConfig,
    pub simulation: SimulationConfig,
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json_str(&text)?;
        log::info!("Loaded engine config from {}", path.display());
        Ok(config)
    }
}
