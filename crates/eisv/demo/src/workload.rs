//! Simulated agent workloads for the EISV demo.
//!
//! Each [`WorkloadProfile`] produces a deterministic [`AgentCycle`] per cycle
//! number, plus a small seeded jitter, so the demo exercises safe operation,
//! verdict oscillation and a hard block without external services.

use eisv_core::AgentCycle;
use rand::Rng;

/// Behaviour of one simulated agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkloadProfile {
    /// Low risk, small drift.
    Steady,
    /// Risk alternates across the caution boundary every cycle.
    Oscillating,
    /// Risk and drift climb until the hard ceiling is crossed.
    RunawayRisk,
}

impl std::fmt::Display for WorkloadProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Steady => write!(f, "steady"),
            Self::Oscillating => write!(f, "oscillating"),
            Self::RunawayRisk => write!(f, "runaway-risk"),
        }
    }
}

/// Generates [`AgentCycle`] inputs for a profile.
pub struct SimulatedWorkload;

impl SimulatedWorkload {
    const JITTER: f64 = 0.02;

    pub fn cycle<R: Rng + ?Sized>(profile: WorkloadProfile, n: usize, rng: &mut R) -> AgentCycle {
        let jitter = rng.gen_range(-Self::JITTER..=Self::JITTER);
        let base = Self::baseline(profile, n);
        AgentCycle {
            risk: (base.risk + jitter).clamp(0.0, 1.0),
            ..base
        }
    }

    /// Jitter-free inputs for cycle `n`.
    pub fn baseline(profile: WorkloadProfile, n: usize) -> AgentCycle {
        match profile {
            WorkloadProfile::Steady => AgentCycle {
                drift: vec![0.05, 0.02],
                complexity: 0.2,
                risk: 0.15,
                ..AgentCycle::default()
            },
            WorkloadProfile::Oscillating => AgentCycle {
                drift: vec![0.1, 0.1],
                complexity: 0.4,
                risk: if n % 2 == 0 { 0.08 } else { 0.62 },
                ..AgentCycle::default()
            },
            WorkloadProfile::RunawayRisk => {
                let t = n as f64;
                AgentCycle {
                    drift: vec![0.05 + 0.03 * t, 0.02 * t],
                    complexity: (0.3 + 0.05 * t).min(1.0),
                    risk: (0.15 + 0.05 * t).min(0.99),
                    ..AgentCycle::default()
                }
            }
        }
    }
}
