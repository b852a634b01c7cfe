//! Euler integration of the coupled EISV equations.
//!
//! ```text
//! dE = alpha (I - E) - beta_e E S + gamma_e E |drift|^2
//! dI = -k S + beta_i C(V) - gamma_i damp(I)
//! dS = -mu S + lambda1 |drift|^2 - lambda2 C(V) + beta_complexity complexity + noise
//! dV = kappa (E - I) - delta V
//! ```
//!
//! Every output is clamped into the bounds of [`DynamicsParams`]. NaN and
//! infinite inputs are caller errors and are not screened here.

use crate::params::{DampingMode, DynamicsParams, Theta};
use crate::state::State;

/// Time derivatives of the four state components.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Derivatives {
    pub de: f64,
    pub di: f64,
    pub ds: f64,
    pub dv: f64,
}

/// Coherence as a sigmoid of the void integral.
///
/// Ranges over [0, `c_max`], equals `c_max / 2` at `v = 0` and is
/// non-decreasing in `v`.
pub fn coherence(v: f64, theta: &Theta, params: &DynamicsParams) -> f64 {
    let theta = theta.clamped();
    let c = params.c_max * 0.5 * (1.0 + (theta.c1 * v).tanh());
    c.clamp(0.0, params.c_max)
}

fn integrity_damping(i: f64, mode: DampingMode) -> f64 {
    match mode {
        DampingMode::Linear => i,
        DampingMode::Saturating => i * (1.0 - i),
    }
}

/// Evaluate the right-hand side of the model at `state`.
pub fn derivatives(
    state: &State,
    drift: &[f64],
    theta: &Theta,
    params: &DynamicsParams,
    noise: f64,
    complexity: f64,
) -> Derivatives {
    let theta = theta.clamped();
    let complexity = complexity.clamp(0.0, 1.0);
    let drift_sq: f64 = drift.iter().map(|d| d * d).sum();
    let c = coherence(state.v, &theta, params);
    let State { e, i, s, v } = *state;

    Derivatives {
        de: params.alpha * (i - e) - params.beta_e * e * s + params.gamma_e * e * drift_sq,
        di: -params.k * s + params.beta_i * c - params.gamma_i * integrity_damping(i, params.damping),
        ds: -params.mu * s + params.lambda1(&theta) * drift_sq - params.lambda2 * c
            + params.beta_complexity * complexity
            + noise,
        dv: params.kappa * (e - i) - params.delta * v,
    }
}

/// Advance `state` by one Euler step of length `dt`.
///
/// `complexity` is clamped to [0, 1] and a negative `dt` is treated as zero.
/// The returned state always lies within the bounds of `params`.
pub fn step(
    state: &State,
    drift: &[f64],
    theta: &Theta,
    params: &DynamicsParams,
    dt: f64,
    noise: f64,
    complexity: f64,
) -> State {
    let dt = dt.max(0.0);
    let start = state.clamped(params);
    let d = derivatives(&start, drift, theta, params, noise, complexity);

    State {
        e: start.e + d.de * dt,
        i: start.i + d.di * dt,
        s: start.s + d.ds * dt,
        v: start.v + d.dv * dt,
    }
    .clamped(params)
}
