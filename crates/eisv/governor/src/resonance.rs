//! Cross-agent resonance signaling.
//!
//! Signals are edge-triggered and best-effort: a dropped signal only means a
//! peer never raises its pressure.

use std::collections::{BTreeSet, VecDeque};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::types::Phase;

/// Edge-triggered resonance signal published by a governor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResonanceSignal {
    /// Emitted once when an agent becomes resonant.
    ResonanceAlert {
        agent_id: String,
        oscillation_index: f64,
        phase: Phase,
        tau: f64,
        beta: f64,
        flips: usize,
    },
    /// Emitted once when an agent leaves resonance.
    StabilityRestored {
        agent_id: String,
        oscillation_index: f64,
        tau: f64,
        beta: f64,
    },
}

impl ResonanceSignal {
    pub fn agent_id(&self) -> &str {
        match self {
            Self::ResonanceAlert { agent_id, .. } | Self::StabilityRestored { agent_id, .. } => {
                agent_id
            }
        }
    }

    pub fn is_alert(&self) -> bool {
        matches!(self, Self::ResonanceAlert { .. })
    }
}

/// A signal with the bus sequence number it was published under.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BusEnvelope {
    pub seq: u64,
    pub signal: ResonanceSignal,
}

/// Transport for resonance signals between governors.
pub trait ResonanceBus: Send + Sync {
    /// Publish a signal. Fire-and-forget.
    fn emit(&self, signal: ResonanceSignal);

    /// Recent signals published by agents other than `agent_id`, oldest first.
    fn recent_peer_signals(&self, agent_id: &str) -> Vec<BusEnvelope>;
}

/// Externally supplied similarity score between two agents, in [0, 1].
pub trait SimilarityOracle: Send + Sync {
    fn similarity(&self, a: &str, b: &str) -> f64;
}

/// Every pair of distinct agents has the same similarity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UniformSimilarity(pub f64);

impl SimilarityOracle for UniformSimilarity {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        if a == b {
            1.0
        } else {
            self.0.clamp(0.0, 1.0)
        }
    }
}

struct BusInner {
    next_seq: u64,
    signals: VecDeque<BusEnvelope>,
}

/// In-process bus retaining the most recent `capacity` signals.
pub struct InMemoryResonanceBus {
    inner: Mutex<BusInner>,
    capacity: usize,
}

impl InMemoryResonanceBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(BusInner {
                next_seq: 1,
                signals: VecDeque::new(),
            }),
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BusInner> {
        // A poisoned bus still holds valid signals.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for InMemoryResonanceBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl ResonanceBus for InMemoryResonanceBus {
    fn emit(&self, signal: ResonanceSignal) {
        let mut inner = self.lock();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.signals.push_back(BusEnvelope { seq, signal });
        while inner.signals.len() > self.capacity {
            inner.signals.pop_front();
        }
    }

    fn recent_peer_signals(&self, agent_id: &str) -> Vec<BusEnvelope> {
        self.lock()
            .signals
            .iter()
            .filter(|env| env.signal.agent_id() != agent_id)
            .cloned()
            .collect()
    }
}

/// Conservative bias an agent carries while similar peers are unstable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NeighborPressure {
    pub value: f64,
    pub pressuring_peers: BTreeSet<String>,
}

impl NeighborPressure {
    /// Raise pressure for an alert from `peer`.
    pub fn raise(&mut self, peer: &str, similarity: f64, step: f64, cap: f64) {
        self.value = (self.value + step * similarity.clamp(0.0, 1.0)).min(cap);
        self.pressuring_peers.insert(peer.to_string());
    }

    /// Decay pressure when a pressuring peer reports stability.
    ///
    /// Returns false when `peer` was not pressuring this agent.
    pub fn relieve(&mut self, peer: &str, decay: f64) -> bool {
        if !self.pressuring_peers.remove(peer) {
            return false;
        }
        self.value *= decay.clamp(0.0, 1.0);
        if self.pressuring_peers.is_empty() && self.value < 1e-6 {
            self.value = 0.0;
        }
        true
    }

    pub fn clear(&mut self) {
        self.value = 0.0;
        self.pressuring_peers.clear();
    }
}
