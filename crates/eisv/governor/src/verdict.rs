use crate::config::GovernorConfig;
use crate::types::Verdict;

/// Thresholds a verdict is computed against.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VerdictThresholds {
    pub tau: f64,
    pub beta: f64,
    pub tau_floor: f64,
    pub beta_ceiling: f64,
    pub safe_offset: f64,
}

impl VerdictThresholds {
    pub fn from_config(config: &GovernorConfig, tau: f64, beta: f64) -> Self {
        Self {
            tau,
            beta,
            tau_floor: config.tau_floor,
            beta_ceiling: config.beta_ceiling,
            safe_offset: config.safe_offset,
        }
    }
}

/// Total, deterministic verdict selection.
///
/// Priority: the absolute hard block first (ignores adaptation), then
/// safe, caution and high risk against the adapted thresholds.
pub fn verdict_for(coherence: f64, risk: f64, t: &VerdictThresholds) -> Verdict {
    if coherence < t.tau_floor || risk > t.beta_ceiling {
        Verdict::HardBlock
    } else if coherence >= t.tau && risk < t.beta - t.safe_offset {
        Verdict::Safe
    } else if coherence >= t.tau && risk < t.beta {
        Verdict::Caution
    } else {
        Verdict::HighRisk
    }
}
