use eisv_dynamics::State;
use serde::{Deserialize, Serialize};

use crate::resonance::ResonanceSignal;

/// Per-cycle governance decision, ordered from least to most severe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Safe,
    Caution,
    HighRisk,
    HardBlock,
}

impl Verdict {
    /// A hard block pauses the agent and calls for a recovery session.
    pub fn is_blocking(self) -> bool {
        matches!(self, Self::HardBlock)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Safe => write!(f, "safe"),
            Self::Caution => write!(f, "caution"),
            Self::HighRisk => write!(f, "high_risk"),
            Self::HardBlock => write!(f, "hard_block"),
        }
    }
}

/// Behavioral phase reported by the phase classifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Uncertainty and complexity trending up relative to integrity.
    Exploration,
    /// Converging; integrity holding or rising.
    #[default]
    Integration,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exploration => write!(f, "exploration"),
            Self::Integration => write!(f, "integration"),
        }
    }
}

/// Which condition put the agent into resonance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResonanceTrigger {
    /// Oscillation index above threshold.
    Oscillation,
    /// Verdict flips within the window above threshold.
    Flips,
}

impl std::fmt::Display for ResonanceTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Oscillation => write!(f, "oscillation"),
            Self::Flips => write!(f, "flips"),
        }
    }
}

/// Measurements handed to the governor for one cycle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GovernorInput {
    pub coherence: f64,
    pub risk: f64,
    /// Current EISV state, recorded for phase classification.
    pub eisv: State,
    pub complexity: f64,
}

impl GovernorInput {
    pub fn new(coherence: f64, risk: f64) -> Self {
        Self {
            coherence,
            risk,
            eisv: State::default(),
            complexity: 0.0,
        }
    }

    pub fn with_state(mut self, eisv: State, complexity: f64) -> Self {
        self.eisv = eisv;
        self.complexity = complexity;
        self
    }
}

/// Everything the governor decided in one cycle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CycleOutcome {
    pub agent_id: String,
    pub verdict: Verdict,
    pub tau: f64,
    pub beta: f64,
    pub phase: Phase,
    pub oscillation_index: f64,
    pub flips: usize,
    pub resonant: bool,
    pub trigger: Option<ResonanceTrigger>,
    pub neighbor_pressure: f64,
    /// True when the thresholds relaxed toward their defaults this cycle.
    pub decayed: bool,
    /// Edge-triggered resonance signal to publish, if any.
    pub signal: Option<ResonanceSignal>,
}

/// Post-resolution reconfiguration of one agent's governor state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Reconfiguration {
    /// Explicit coherence threshold; `None` resets to the default.
    pub tau: Option<f64>,
    /// Explicit risk threshold; `None` resets to the default.
    pub beta: Option<f64>,
    /// Drop neighbor pressure accumulated from peers.
    pub reset_pressure: bool,
}
