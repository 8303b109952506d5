//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::error::DrvError;
use crate::PROB_TOLERANCE;

/// Tunables for the numeric side of the engine.
///
/// Only infinite probability spaces consult these; finite spaces are always
/// enumerated exactly.
///
/// # Example
///
/// ```rust
/// use drv::EngineConfig;
///
/// let config = EngineConfig::from_json(r#"{ "max_terms": 5000 }"#).unwrap();
/// assert_eq!(config.max_terms, 5000);
/// assert_eq!(config.convergence_window, EngineConfig::default().convergence_window);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Relative size below which a window of series terms counts as converged.
    pub tolerance: f64,
    /// Give up (undetermined) after this many terms.
    pub max_terms: u64,
    /// Number of consecutive terms inspected per convergence check.
    pub convergence_window: u64,
    /// Consecutive quiet windows required before a series counts as converged.
    pub quiet_windows: u64,
    /// How many leading terms of an infinite mass function are checked for negativity.
    pub nonnegativity_probe: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tolerance: PROB_TOLERANCE * 1e-4,
            max_terms: 1_000_000,
            convergence_window: 64,
            quiet_windows: 8,
            nonnegativity_probe: 1_000,
        }
    }
}

impl EngineConfig {
    /// Read a configuration from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, DrvError> {
        let config: EngineConfig = serde_json::from_str(json).map_err(|e| DrvError::Config {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check the values are usable.
    pub fn validate(&self) -> Result<(), DrvError> {
        if !(self.tolerance > 0.0 && self.tolerance.is_finite()) {
            return Err(DrvError::Config {
                reason: format!("tolerance must be positive, got {}", self.tolerance),
            });
        }
        if self.convergence_window == 0 || self.max_terms < self.convergence_window {
            return Err(DrvError::Config {
                reason: format!(
                    "convergence_window ({}) must be in 1..=max_terms ({})",
                    self.convergence_window, self.max_terms
                ),
            });
        }
        if self.quiet_windows == 0 {
            return Err(DrvError::Config {
                reason: "quiet_windows must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
