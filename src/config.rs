use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::shocks::ShockKind;

/// Error raised while loading a configuration file.
///
/// Callers are expected to degrade to [`SimConfig::default`] rather than
/// abort; see [`SimConfig::load_or_default`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Configuration parameters for the economy simulation.
///
/// Every field has a documented default and can be overridden individually
/// from a TOML file; fields missing from the file keep their defaults.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    // Populations
    pub num_households: usize,
    pub num_firms: usize,

    // Episode
    pub max_steps: u64,

    // Labour / goods markets
    pub base_wage: f64,
    pub wage_adjustment: f64,
    pub price_adjustment: f64,

    // Credit market
    pub max_leverage: f64,

    // Social network
    pub avg_degree: usize,
    pub influence_strength: f64,
    pub unrest_decay: f64,
    pub social_noise: f64,

    // Stochastic shock triggering (per-tick probability per kind)
    pub shock_probs: BTreeMap<ShockKind, f64>,

    // Government policy lever bounds
    pub min_interest: f64,
    pub max_interest: f64,
    pub min_tax: f64,
    pub max_tax: f64,
    pub min_welfare: f64,
    pub max_welfare: f64,
    pub min_controls: f64,
    pub max_controls: f64,

    // Published metrics
    pub history_capacity: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        let mut shock_probs = BTreeMap::new();
        shock_probs.insert(ShockKind::Pandemic, 0.01);
        shock_probs.insert(ShockKind::FinancialCrash, 0.02);
        shock_probs.insert(ShockKind::SupplyChainCollapse, 0.05);

        SimConfig {
            num_households: 200,
            num_firms: 50,

            max_steps: 500,

            base_wage: 50.0,
            wage_adjustment: 0.1,
            price_adjustment: 0.1,

            max_leverage: 3.0,

            avg_degree: 3,
            influence_strength: 0.3,
            unrest_decay: 0.05,
            social_noise: 0.02,

            shock_probs,

            min_interest: 0.0,
            max_interest: 0.2,
            min_tax: 0.0,
            max_tax: 0.6,
            min_welfare: 0.0,
            max_welfare: 0.5,
            min_controls: 0.0,
            max_controls: 1.0,

            history_capacity: 50,
        }
    }
}

impl SimConfig {
    /// Parse a configuration from a TOML file.
    pub fn from_path(path: &Path) -> Result<SimConfig, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// Load a configuration, falling back to the defaults on any failure.
    ///
    /// A missing path means "no overrides requested" and is not logged.
    pub fn load_or_default(path: Option<&Path>) -> SimConfig {
        match path {
            None => SimConfig::default(),
            Some(p) => match SimConfig::from_path(p) {
                Ok(cfg) => cfg,
                Err(err) => {
                    warn!(path = %p.display(), %err, "config load failed, using defaults");
                    SimConfig::default()
                }
            },
        }
    }
}
