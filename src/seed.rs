use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Error raised while loading an initial-conditions record.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse seed record: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Macro starting point for an episode, normally supplied by an external
/// statistical feed as a JSON record.
///
/// Initialization never fails: whatever cannot be obtained keeps its
/// baked-in baseline value.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct InitialConditions {
    pub initial_gdp: f64,
    pub inflation_target: f64,
    pub base_interest_rate: f64,
    pub base_unemployment: f64,
}

impl Default for InitialConditions {
    fn default() -> Self {
        InitialConditions {
            initial_gdp: 10_000.0,
            inflation_target: 0.05,
            base_interest_rate: 0.05,
            base_unemployment: 0.08,
        }
    }
}

impl InitialConditions {
    /// Parse a JSON seed record from a file.
    pub fn from_path(path: &Path) -> Result<InitialConditions, SeedError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Load a seed record, degrading to the baseline constants on any
    /// failure.  Failures are logged, never propagated.
    pub fn load_or_baseline(path: Option<&Path>) -> InitialConditions {
        match path {
            None => InitialConditions::default(),
            Some(p) => match InitialConditions::from_path(p) {
                Ok(seed) => seed,
                Err(err) => {
                    warn!(path = %p.display(), %err, "seed load failed, using baseline");
                    InitialConditions::default()
                }
            },
        }
    }
}
