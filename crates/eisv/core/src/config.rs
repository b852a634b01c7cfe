//! Layered governance configuration.
//!
//! Every section has serde defaults, so a TOML file only needs the values it
//! changes:
//!
//! ```toml
//! profile = "conservative"
//!
//! [governor]
//! flip_threshold = 4
//!
//! [dialectic]
//! max_synthesis_rounds = 3
//! ```

use std::path::Path;

use eisv_dialectic::DialecticConfig;
use eisv_dynamics::{DynamicsParams, Theta};
use eisv_governor::GovernorConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;

/// Cross-agent resonance settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResonanceConfig {
    /// Signals the in-process bus retains.
    pub bus_capacity: usize,
    /// Similarity assumed between any two distinct agents when no oracle
    /// is supplied.
    pub default_similarity: f64,
}

impl Default for ResonanceConfig {
    fn default() -> Self {
        Self {
            bus_capacity: 256,
            default_similarity: 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceConfig {
    /// Named dynamics profile: default, conservative or exploratory.
    pub profile: String,
    /// Full parameter table; takes precedence over `profile` when present.
    pub dynamics: Option<DynamicsParams>,
    pub theta: Theta,
    pub governor: GovernorConfig,
    pub dialectic: DialecticConfig,
    pub resonance: ResonanceConfig,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            profile: "default".to_string(),
            dynamics: None,
            theta: Theta::default(),
            governor: GovernorConfig::default(),
            dialectic: DialecticConfig::default(),
            resonance: ResonanceConfig::default(),
        }
    }
}

impl GovernanceConfig {
    /// Load from a TOML file; a missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        debug!(path = %path.display(), profile = %config.profile, "Config loaded");
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Dynamics parameters in effect: the explicit table, else the profile.
    pub fn dynamics_params(&self) -> Result<DynamicsParams, ConfigError> {
        match &self.dynamics {
            Some(params) => Ok(params.clone()),
            None => Ok(DynamicsParams::profile(&self.profile)?),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.dynamics_params()?;
        self.governor.validate()?;
        if self.resonance.bus_capacity == 0 {
            return Err(ConfigError::Invalid(
                "resonance.bus_capacity must be > 0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.resonance.default_similarity) {
            return Err(ConfigError::Invalid(format!(
                "resonance.default_similarity must be in [0, 1], got {}",
                self.resonance.default_similarity
            )));
        }
        if self.dialectic.max_synthesis_rounds == 0 {
            return Err(ConfigError::Invalid(
                "dialectic.max_synthesis_rounds must be > 0".into(),
            ));
        }
        Ok(())
    }
}
