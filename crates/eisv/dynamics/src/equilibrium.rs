//! Fixed-point and basin analysis used for drift-from-equilibrium diagnostics.

use serde::{Deserialize, Serialize};

use crate::engine::coherence;
use crate::params::{DampingMode, DynamicsParams, Theta};
use crate::state::State;

/// Which integrity basin a state currently sits in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Basin {
    /// Healthy regime above the bistability midpoint.
    High,
    /// Degraded regime below the bistability midpoint.
    Low,
    /// Inside the margin band around the midpoint.
    Boundary,
}

impl std::fmt::Display for Basin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Low => write!(f, "low"),
            Self::Boundary => write!(f, "boundary"),
        }
    }
}

/// High-basin fixed point of the model under zero drift, noise and complexity.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Equilibrium {
    pub state: State,
    pub coherence: f64,
    /// True when the integrity equation has no interior root and the
    /// channel saturates at its upper bound.
    pub saturated: bool,
}

/// Solve for the healthy fixed point.
///
/// With `V* = 0` the void equation forces `E* = I*` and `C* = c_max / 2`.
/// When the saturating integrity equation has two roots the larger one is
/// taken.
pub fn equilibrium(params: &DynamicsParams, theta: &Theta) -> Equilibrium {
    let c = coherence(0.0, theta, params);
    let s = if params.mu > 0.0 {
        (-params.lambda2 * c / params.mu).clamp(params.s_min, params.s_max)
    } else {
        params.s_min
    };
    let drive = params.beta_i * c - params.k * s;

    let (i, saturated) = if params.gamma_i <= 0.0 {
        (params.i_max, true)
    } else {
        match params.damping {
            DampingMode::Linear => {
                let raw = drive / params.gamma_i;
                (raw.clamp(params.i_min, params.i_max), raw > params.i_max)
            }
            DampingMode::Saturating => {
                let disc = 1.0 - 4.0 * drive / params.gamma_i;
                if disc < 0.0 {
                    (params.i_max, true)
                } else {
                    let high = 0.5 * (1.0 + disc.sqrt());
                    (high.clamp(params.i_min, params.i_max), high > params.i_max)
                }
            }
        }
    };

    let e = i.clamp(params.e_min, params.e_max);
    Equilibrium {
        state: State::new(e, i, s, 0.0),
        coherence: c,
        saturated,
    }
}

/// Euclidean distance in EISV space between `state` and the fixed point.
pub fn distance_from_equilibrium(state: &State, eq: &Equilibrium) -> f64 {
    state
        .as_array()
        .iter()
        .zip(eq.state.as_array())
        .map(|(a, b)| (a - b).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Classify the integrity channel against the bistability midpoint.
pub fn classify_basin(state: &State, params: &DynamicsParams) -> Basin {
    let margin = params.basin_margin.abs();
    if state.i > params.basin_midpoint + margin {
        Basin::High
    } else if state.i < params.basin_midpoint - margin {
        Basin::Low
    } else {
        Basin::Boundary
    }
}
