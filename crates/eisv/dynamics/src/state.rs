use serde::{Deserialize, Serialize};

use crate::params::DynamicsParams;

/// Four-dimensional operating state of a single agent.
///
/// - `e`: Energy, in [0, 1]
/// - `i`: Information integrity, in [0, 1]
/// - `s`: Semantic uncertainty, in [0, 2]
/// - `v`: Void (integrated energy/integrity imbalance), in [-2, 2]
///
/// Bounds come from [`DynamicsParams`]; every transition clamps into them.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub e: f64,
    pub i: f64,
    pub s: f64,
    pub v: f64,
}

impl State {
    pub fn new(e: f64, i: f64, s: f64, v: f64) -> Self {
        Self { e, i, s, v }
    }

    /// Clamp every component into the bounds declared by `params`.
    pub fn clamped(self, params: &DynamicsParams) -> Self {
        Self {
            e: self.e.clamp(params.e_min, params.e_max),
            i: self.i.clamp(params.i_min, params.i_max),
            s: self.s.clamp(params.s_min, params.s_max),
            v: self.v.clamp(params.v_min, params.v_max),
        }
    }

    /// True when every component lies within the bounds of `params`.
    pub fn within_bounds(&self, params: &DynamicsParams) -> bool {
        (params.e_min..=params.e_max).contains(&self.e)
            && (params.i_min..=params.i_max).contains(&self.i)
            && (params.s_min..=params.s_max).contains(&self.s)
            && (params.v_min..=params.v_max).contains(&self.v)
    }

    pub fn as_array(&self) -> [f64; 4] {
        [self.e, self.i, self.s, self.v]
    }
}

impl Default for State {
    /// A freshly registered agent starts energetic, coherent and calm.
    fn default() -> Self {
        Self {
            e: 0.8,
            i: 0.9,
            s: 0.2,
            v: 0.0,
        }
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "E={:.3} I={:.3} S={:.3} V={:.3}",
            self.e, self.i, self.s, self.v
        )
    }
}
