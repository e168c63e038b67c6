//! Configuration for pvalue-stats
//!
//! Tunable defaults for curve extension, Monte Carlo simulation and the
//! Good-method stability warning.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Toolkit-wide configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolkitConfig {
    /// Observed / analytic EDF settings
    pub edf: EdfConfig,
    /// Monte Carlo uniform EDF settings
    pub monte_carlo: MonteCarloConfig,
    /// Good-method settings
    pub good: GoodConfig,
}

/// EDF curve configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdfConfig {
    /// Extra points appended to the analytic uniform curve
    pub extra_leg: usize,
    /// x-offset of the synthetic trailing point
    pub synthetic_offset: f64,
}

impl Default for EdfConfig {
    fn default() -> Self {
        Self {
            extra_leg: 1000,
            synthetic_offset: 1e-6,
        }
    }
}

/// Monte Carlo configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloConfig {
    /// Number of simulated samples
    pub n_sim: usize,
    /// Fixed seed; `None` draws from OS entropy
    pub seed: Option<u64>,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            n_sim: 10_000,
            seed: None,
        }
    }
}

/// Good-method configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoodConfig {
    /// Largest number of p-values combined without a stability warning
    pub max_stable_size: usize,
}

impl Default for GoodConfig {
    fn default() -> Self {
        Self { max_stable_size: 5 }
    }
}

impl ToolkitConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML string
    #[cfg(feature = "toml-config")]
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML
    #[cfg(feature = "toml-config")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json_str: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json_str).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.edf.extra_leg == 0 {
            return Err(ConfigError::OutOfRange(
                "edf.extra_leg must be at least 1".to_string(),
            ));
        }

        if !self.edf.synthetic_offset.is_finite() || self.edf.synthetic_offset <= 0.0 {
            return Err(ConfigError::OutOfRange(
                "edf.synthetic_offset must be positive and finite".to_string(),
            ));
        }

        if self.monte_carlo.n_sim == 0 {
            return Err(ConfigError::OutOfRange(
                "monte_carlo.n_sim must be at least 1".to_string(),
            ));
        }

        if self.good.max_stable_size == 0 {
            return Err(ConfigError::OutOfRange(
                "good.max_stable_size must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// Configuration validation error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Value is out of valid range
    #[error("Value out of range: {0}")]
    OutOfRange(String),
    /// Source text could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),
}
