use serde::{Deserialize, Serialize};

use crate::convergence::ConvergenceConfig;
use crate::timeout::TimeoutConfig;

/// Protocol limits, matcher thresholds and session clocks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialecticConfig {
    /// Synthesis submissions accepted before the session escalates.
    pub max_synthesis_rounds: u32,
    /// A reviewer who resolved a review of the same agent within this
    /// window is not eligible again.
    pub recent_review_hours: i64,
    pub convergence: ConvergenceConfig,
    pub timeouts: TimeoutConfig,
}

impl Default for DialecticConfig {
    fn default() -> Self {
        Self {
            max_synthesis_rounds: 5,
            recent_review_hours: 24,
            convergence: ConvergenceConfig::default(),
            timeouts: TimeoutConfig::default(),
        }
    }
}
