//! Phase classification over recent EISV history.
//!
//! The governor does not own a phase model; it asks an injected
//! [`PhaseClassifier`] each cycle. [`TrendPhaseClassifier`] is the default.

use std::collections::VecDeque;

use eisv_dynamics::State;
use serde::{Deserialize, Serialize};

use crate::types::Phase;

/// One recorded cycle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistorySample {
    pub state: State,
    pub complexity: f64,
}

/// Bounded rolling history of EISV samples for one agent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StateHistory {
    samples: VecDeque<HistorySample>,
}

impl StateHistory {
    pub fn push(&mut self, state: State, complexity: f64, capacity: usize) {
        self.samples.push_back(HistorySample { state, complexity });
        while self.samples.len() > capacity.max(1) {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> impl Iterator<Item = &HistorySample> {
        self.samples.iter()
    }

    /// The most recent `n` samples, oldest first.
    pub fn tail(&self, n: usize) -> impl Iterator<Item = &HistorySample> {
        self.samples.iter().skip(self.samples.len().saturating_sub(n))
    }

    pub fn energy(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.state.e).collect()
    }

    pub fn integrity(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.state.i).collect()
    }

    pub fn uncertainty(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.state.s).collect()
    }

    pub fn complexity(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.complexity).collect()
    }
}

/// Maps E/I/S/complexity history to a behavioral phase.
///
/// `current` is the phase reported on the previous cycle so implementations
/// can apply hysteresis.
pub trait PhaseClassifier: Send + Sync {
    fn classify(&self, history: &StateHistory, current: Phase) -> Phase;
}

/// Schmitt-trigger classifier over the mean per-cycle trend of
/// `S + complexity - I`.
///
/// Enters exploration when the trend rises above `enter`; returns to
/// integration only once it falls below `exit`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrendPhaseClassifier {
    pub lookback: usize,
    pub enter: f64,
    pub exit: f64,
}

impl Default for TrendPhaseClassifier {
    fn default() -> Self {
        Self {
            lookback: 5,
            enter: 0.02,
            exit: 0.0,
        }
    }
}

impl TrendPhaseClassifier {
    /// Mean per-cycle change of `S + complexity - I` over the lookback.
    pub fn trend(&self, history: &StateHistory) -> Option<f64> {
        let window: Vec<f64> = history
            .tail(self.lookback.max(2))
            .map(|h| h.state.s + h.complexity - h.state.i)
            .collect();
        if window.len() < 2 {
            return None;
        }
        let span = (window.len() - 1) as f64;
        Some((window[window.len() - 1] - window[0]) / span)
    }
}

impl PhaseClassifier for TrendPhaseClassifier {
    fn classify(&self, history: &StateHistory, current: Phase) -> Phase {
        let Some(trend) = self.trend(history) else {
            return current;
        };
        match current {
            Phase::Integration if trend > self.enter => Phase::Exploration,
            Phase::Exploration if trend < self.exit => Phase::Integration,
            _ => current,
        }
    }
}

/// Classifier that always reports the same phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedPhase(pub Phase);

impl PhaseClassifier for FixedPhase {
    fn classify(&self, _history: &StateHistory, _current: Phase) -> Phase {
        self.0
    }
}
