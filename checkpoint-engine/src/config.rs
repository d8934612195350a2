//! Scenario-level tuning for the adjudication engine.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::biometrics::BiometricPolicy;
use crate::consequence::{PenaltyTable, PenaltyTableError};
use crate::constants::{DEFAULT_EQUIPMENT_RELIABILITY, RELIABILITY_MAX};

/// Errors raised when engine configuration invariants are violated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("equipment reliability must be between 0 and 100 (got {0})")]
    ReliabilityOutOfRange(u8),
    #[error("penalty table invalid: {0}")]
    Penalties(#[from] PenaltyTableError),
    #[error("engine config is not valid JSON: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "EngineConfig::default_reliability")]
    pub equipment_reliability: u8,
    #[serde(default)]
    pub biometric_policy: BiometricPolicy,
    #[serde(default)]
    pub penalties: PenaltyTable,
}

impl EngineConfig {
    const fn default_reliability() -> u8 {
        DEFAULT_EQUIPMENT_RELIABILITY
    }

    /// Parse and validate a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or fails validation.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self =
            serde_json::from_str(json).map_err(|err| ConfigError::Parse(err.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.equipment_reliability > RELIABILITY_MAX {
            return Err(ConfigError::ReliabilityOutOfRange(self.equipment_reliability));
        }
        self.penalties.validate()?;
        Ok(())
    }

    #[must_use]
    pub const fn with_reliability(mut self, equipment_reliability: u8) -> Self {
        self.equipment_reliability = equipment_reliability;
        self
    }

    #[must_use]
    pub const fn with_policy(mut self, biometric_policy: BiometricPolicy) -> Self {
        self.biometric_policy = biometric_policy;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            equipment_reliability: Self::default_reliability(),
            biometric_policy: BiometricPolicy::default(),
            penalties: PenaltyTable::default(),
        }
    }
}
