#![deny(unsafe_code)]
//! # eisv-dynamics
//!
//! Pure state-transition layer of the governance core.
//!
//! Each agent carries a bounded four-dimensional EISV state
//! (Energy, Information integrity, Semantic uncertainty, Void). This crate:
//! - integrates the coupled model one Euler step at a time ([`step`]),
//! - derives the coherence feedback signal from the void integral ([`coherence`]),
//! - solves the healthy fixed point and classifies integrity basins
//!   ([`equilibrium`], [`classify_basin`]).
//!
//! No I/O and no shared state. Out-of-range inputs are clamped, never rejected.

pub mod engine;
pub mod equilibrium;
pub mod error;
pub mod params;
pub mod state;

pub use engine::{coherence, derivatives, step, Derivatives};
pub use equilibrium::{classify_basin, distance_from_equilibrium, equilibrium, Basin, Equilibrium};
pub use error::DynamicsError;
pub use params::{DampingMode, DynamicsParams, Theta};
pub use state::State;
