use serde::{Deserialize, Serialize};

use crate::config::GovernorConfig;
use crate::oscillation::OscillationTracker;
use crate::phase::StateHistory;
use crate::pid::PidChannel;
use crate::resonance::NeighborPressure;
use crate::types::{Phase, ResonanceTrigger, Verdict};

/// Mutable per-agent governor state.
///
/// Created on first use of an agent id and kept across cycles.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GovernorState {
    pub agent_id: String,
    pub tau: f64,
    pub beta: f64,
    pub tau_pid: PidChannel,
    pub beta_pid: PidChannel,
    pub oscillation: OscillationTracker,
    pub oscillation_index: f64,
    pub flips: usize,
    pub resonant: bool,
    pub trigger: Option<ResonanceTrigger>,
    pub pressure: NeighborPressure,
    pub history: StateHistory,
    pub phase: Phase,
    pub last_verdict: Option<Verdict>,
    pub cycles: u64,
    /// Highest bus sequence number already absorbed.
    pub last_signal_seq: u64,
}

impl GovernorState {
    pub fn new(agent_id: impl Into<String>, config: &GovernorConfig) -> Self {
        Self {
            agent_id: agent_id.into(),
            tau: config.tau_default,
            beta: config.beta_default,
            tau_pid: PidChannel::default(),
            beta_pid: PidChannel::default(),
            oscillation: OscillationTracker::default(),
            oscillation_index: 0.0,
            flips: 0,
            resonant: false,
            trigger: None,
            pressure: NeighborPressure::default(),
            history: StateHistory::default(),
            phase: Phase::default(),
            last_verdict: None,
            cycles: 0,
            last_signal_seq: 0,
        }
    }

    /// Forget control and oscillation memory; keeps history and pressure.
    pub fn reset_control(&mut self) {
        self.tau_pid.reset();
        self.beta_pid.reset();
        self.oscillation.reset();
        self.oscillation_index = 0.0;
        self.flips = 0;
        self.resonant = false;
        self.trigger = None;
        self.last_verdict = None;
    }
}
