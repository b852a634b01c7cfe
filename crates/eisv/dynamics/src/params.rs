use serde::{Deserialize, Serialize};

use crate::error::DynamicsError;

/// How the integrity channel damps itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DampingMode {
    /// `gamma_i * I`: single stable fixed point.
    Linear,
    /// `gamma_i * I * (1 - I)`: bistable, with a high and a low basin.
    Saturating,
}

impl std::fmt::Display for DampingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Linear => write!(f, "linear"),
            Self::Saturating => write!(f, "saturating"),
        }
    }
}

/// Coefficients and bounds of the EISV model.
///
/// One instance per governance profile. Treated as immutable once an
/// engine is running; clone and modify to derive a new profile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamicsParams {
    /// Energy relaxation rate toward integrity.
    pub alpha: f64,
    /// Energy drain from semantic uncertainty.
    pub beta_e: f64,
    /// Energy gain from drift magnitude.
    pub gamma_e: f64,
    /// Integrity loss from semantic uncertainty.
    pub k: f64,
    /// Integrity gain from coherence.
    pub beta_i: f64,
    /// Integrity damping coefficient.
    pub gamma_i: f64,
    /// Uncertainty decay rate.
    pub mu: f64,
    /// Base drift sensitivity of uncertainty, scaled by `Theta::eta1`.
    pub lambda1_base: f64,
    pub lambda1_min: f64,
    pub lambda1_max: f64,
    /// Uncertainty suppression by coherence.
    pub lambda2: f64,
    /// Uncertainty injected per unit of task complexity.
    pub beta_complexity: f64,
    /// Void accumulation rate of the energy/integrity imbalance.
    pub kappa: f64,
    /// Void decay rate.
    pub delta: f64,
    /// Upper bound of coherence.
    pub c_max: f64,
    pub damping: DampingMode,

    pub e_min: f64,
    pub e_max: f64,
    pub i_min: f64,
    pub i_max: f64,
    pub s_min: f64,
    pub s_max: f64,
    pub v_min: f64,
    pub v_max: f64,

    /// Integrity value separating the high and low basins.
    pub basin_midpoint: f64,
    /// Half-width of the boundary band around `basin_midpoint`.
    pub basin_margin: f64,
}

impl Default for DynamicsParams {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            beta_e: 0.1,
            gamma_e: 0.05,
            k: 0.1,
            beta_i: 0.1,
            gamma_i: 0.5,
            mu: 0.8,
            lambda1_base: 0.3,
            lambda1_min: 0.05,
            lambda1_max: 0.6,
            lambda2: 0.05,
            beta_complexity: 0.15,
            kappa: 0.3,
            delta: 0.4,
            c_max: 1.0,
            damping: DampingMode::Saturating,
            e_min: 0.0,
            e_max: 1.0,
            i_min: 0.0,
            i_max: 1.0,
            s_min: 0.0,
            s_max: 2.0,
            v_min: -2.0,
            v_max: 2.0,
            basin_midpoint: 0.5,
            basin_margin: 0.05,
        }
    }
}

impl DynamicsParams {
    /// Stronger void decay and integrity damping; slower to react to drift.
    pub fn conservative() -> Self {
        Self {
            delta: 0.6,
            lambda1_base: 0.2,
            beta_complexity: 0.1,
            basin_margin: 0.08,
            ..Self::default()
        }
    }

    /// Weaker damping; uncertainty responds more strongly to drift.
    pub fn exploratory() -> Self {
        Self {
            mu: 0.6,
            lambda1_base: 0.4,
            delta: 0.3,
            basin_margin: 0.03,
            ..Self::default()
        }
    }

    /// Look up a named governance profile.
    pub fn profile(name: &str) -> Result<Self, DynamicsError> {
        match name {
            "default" => Ok(Self::default()),
            "conservative" => Ok(Self::conservative()),
            "exploratory" => Ok(Self::exploratory()),
            other => Err(DynamicsError::UnknownProfile(other.to_string())),
        }
    }

    /// Effective drift sensitivity for the given control parameters.
    pub fn lambda1(&self, theta: &Theta) -> f64 {
        (self.lambda1_base * theta.eta1).clamp(self.lambda1_min, self.lambda1_max)
    }
}

/// Externally tunable control parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theta {
    /// Sigmoid steepness of the coherence function.
    pub c1: f64,
    /// Drift sensitivity multiplier.
    pub eta1: f64,
}

impl Theta {
    pub const C1_MIN: f64 = 0.1;
    pub const C1_MAX: f64 = 10.0;
    pub const ETA1_MIN: f64 = 0.05;
    pub const ETA1_MAX: f64 = 2.0;

    pub fn new(c1: f64, eta1: f64) -> Self {
        Self { c1, eta1 }
    }

    /// Theta with both parameters pulled into their documented ranges.
    pub fn clamped(self) -> Self {
        Self {
            c1: self.c1.clamp(Self::C1_MIN, Self::C1_MAX),
            eta1: self.eta1.clamp(Self::ETA1_MIN, Self::ETA1_MAX),
        }
    }
}

impl Default for Theta {
    fn default() -> Self {
        Self { c1: 1.0, eta1: 1.0 }
    }
}
