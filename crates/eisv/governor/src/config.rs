use serde::{Deserialize, Serialize};

use crate::error::GovernorError;
use crate::types::Phase;

/// Immutable per-governor defaults and hard bounds.
///
/// Adaptation moves tau and beta around, but never outside
/// `[tau_floor, tau_ceiling]` and `[beta_floor, beta_ceiling]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernorConfig {
    /// Static coherence threshold the governor relaxes back toward.
    pub tau_default: f64,
    /// Static risk threshold the governor relaxes back toward.
    pub beta_default: f64,
    pub tau_floor: f64,
    pub tau_ceiling: f64,
    pub beta_floor: f64,
    pub beta_ceiling: f64,
    /// Margin below beta that separates `safe` from `caution`.
    pub safe_offset: f64,

    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    /// Anti-windup cap on the absolute integral term.
    pub integral_max: f64,

    pub tau_ref_exploration: f64,
    pub tau_ref_integration: f64,
    pub beta_ref_exploration: f64,
    pub beta_ref_integration: f64,
    /// Derivative damping while exploring (weaker than integration).
    pub damping_exploration: f64,
    pub damping_integration: f64,

    /// Fraction of the distance to the defaults recovered per stable cycle.
    pub decay_rate: f64,
    /// Oscillation index below which a cycle counts as stable.
    pub decay_threshold: f64,

    /// Smoothing factor of the sign-transition EMAs.
    pub ema_alpha: f64,
    /// Oscillation index above which the agent is resonant.
    pub oscillation_threshold: f64,
    /// Verdict flips within the window above which the agent is resonant.
    pub flip_threshold: usize,
    /// Length of the sign and verdict windows.
    pub window_size: usize,
    /// Length of the EISV history handed to the phase classifier.
    pub history_size: usize,

    /// Pressure added per peer alert, scaled by similarity.
    pub pressure_step: f64,
    pub pressure_max: f64,
    /// Multiplier applied when a pressuring peer reports stability.
    pub pressure_decay: f64,
    /// Minimum similarity for a peer alert to count.
    pub similarity_gate: f64,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            tau_default: 0.40,
            beta_default: 0.60,
            tau_floor: 0.25,
            tau_ceiling: 0.75,
            beta_floor: 0.20,
            beta_ceiling: 0.70,
            safe_offset: 0.10,
            kp: 0.05,
            ki: 0.01,
            kd: 0.02,
            integral_max: 0.5,
            tau_ref_exploration: 0.35,
            tau_ref_integration: 0.45,
            beta_ref_exploration: 0.65,
            beta_ref_integration: 0.55,
            damping_exploration: 0.5,
            damping_integration: 1.0,
            decay_rate: 0.05,
            decay_threshold: 0.1,
            ema_alpha: 0.1,
            oscillation_threshold: 1.0,
            flip_threshold: 4,
            window_size: 10,
            history_size: 50,
            pressure_step: 0.02,
            pressure_max: 0.1,
            pressure_decay: 0.5,
            similarity_gate: 0.5,
        }
    }
}

/// PID gains in effect for one cycle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub integral_max: f64,
}

impl GovernorConfig {
    /// Reference points `(tau_ref, beta_ref)` for a phase.
    pub fn references(&self, phase: Phase) -> (f64, f64) {
        match phase {
            Phase::Exploration => (self.tau_ref_exploration, self.beta_ref_exploration),
            Phase::Integration => (self.tau_ref_integration, self.beta_ref_integration),
        }
    }

    pub fn derivative_damping(&self, phase: Phase) -> f64 {
        match phase {
            Phase::Exploration => self.damping_exploration,
            Phase::Integration => self.damping_integration,
        }
    }

    pub fn gains(&self) -> PidGains {
        PidGains {
            kp: self.kp,
            ki: self.ki,
            kd: self.kd,
            integral_max: self.integral_max,
        }
    }

    pub fn clamp_tau(&self, tau: f64) -> f64 {
        tau.clamp(self.tau_floor, self.tau_ceiling)
    }

    pub fn clamp_beta(&self, beta: f64) -> f64 {
        beta.clamp(self.beta_floor, self.beta_ceiling)
    }

    /// Check the ordering of bounds and the ranges of the tuning values.
    pub fn validate(&self) -> Result<(), GovernorError> {
        check_bounds("tau", self.tau_floor, self.tau_default, self.tau_ceiling)?;
        check_bounds("beta", self.beta_floor, self.beta_default, self.beta_ceiling)?;

        if self.kp < 0.0 || self.ki < 0.0 || self.kd < 0.0 {
            return Err(GovernorError::InvalidConfig("PID gains must be non-negative".into()));
        }
        if self.integral_max < 0.0 {
            return Err(GovernorError::InvalidConfig("integral_max must be non-negative".into()));
        }
        if !(self.ema_alpha > 0.0 && self.ema_alpha <= 1.0) {
            return Err(GovernorError::InvalidConfig(format!(
                "ema_alpha must be in (0, 1], got {}",
                self.ema_alpha
            )));
        }
        if !(0.0..=1.0).contains(&self.decay_rate) {
            return Err(GovernorError::InvalidConfig(format!(
                "decay_rate must be in [0, 1], got {}",
                self.decay_rate
            )));
        }
        if self.window_size < 2 {
            return Err(GovernorError::InvalidConfig("window_size must be >= 2".into()));
        }
        if self.history_size == 0 {
            return Err(GovernorError::InvalidConfig("history_size must be >= 1".into()));
        }
        if self.pressure_max < 0.0 || self.pressure_step < 0.0 {
            return Err(GovernorError::InvalidConfig("neighbor pressure must be non-negative".into()));
        }
        Ok(())
    }
}

fn check_bounds(name: &str, floor: f64, default: f64, ceiling: f64) -> Result<(), GovernorError> {
    if floor <= default && default <= ceiling {
        Ok(())
    } else {
        Err(GovernorError::InvalidBounds {
            name: name.to_string(),
            floor,
            default,
            ceiling,
        })
    }
}
