#![deny(unsafe_code)]
//! # eisv-governor
//!
//! Adaptive per-agent thresholds over the coherence and risk signals.
//!
//! Every cycle the [`AdaptiveGovernor`]:
//! 1. records the EISV sample and asks a [`PhaseClassifier`] for the phase,
//! 2. moves tau and beta with one PID channel each, biased by neighbor pressure,
//! 3. tracks oscillation (transition EMAs plus verdict flips) and resonance,
//! 4. relaxes thresholds toward their defaults while the agent is stable,
//! 5. issues a [`Verdict`].
//!
//! Thresholds never leave their configured hard bounds, and the hard-block
//! verdict ignores adaptation entirely.

pub mod config;
pub mod error;
pub mod governor;
pub mod oscillation;
pub mod phase;
pub mod pid;
pub mod resonance;
pub mod state;
pub mod types;
pub mod verdict;

pub use config::{GovernorConfig, PidGains};
pub use error::GovernorError;
pub use governor::AdaptiveGovernor;
pub use oscillation::{OscillationReading, OscillationTracker};
pub use phase::{FixedPhase, HistorySample, PhaseClassifier, StateHistory, TrendPhaseClassifier};
pub use pid::PidChannel;
pub use resonance::{
    BusEnvelope, InMemoryResonanceBus, NeighborPressure, ResonanceBus, ResonanceSignal,
    SimilarityOracle, UniformSimilarity,
};
pub use state::GovernorState;
pub use types::{CycleOutcome, GovernorInput, Phase, Reconfiguration, ResonanceTrigger, Verdict};
pub use verdict::{verdict_for, VerdictThresholds};
