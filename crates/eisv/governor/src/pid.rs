use serde::{Deserialize, Serialize};

use crate::config::PidGains;

/// PID accumulator for one adaptive threshold.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PidChannel {
    pub integral: f64,
    pub prev_error: f64,
    /// False until the first error is seen; the derivative term is skipped
    /// on that first sample.
    pub primed: bool,
}

impl PidChannel {
    /// Feed one error sample and return the P+I+D adjustment.
    ///
    /// The integral resets on a sign change of the error before
    /// accumulating, and is clamped to `±integral_max`.
    pub fn adjust(&mut self, error: f64, gains: &PidGains, damping: f64) -> f64 {
        if self.primed && error * self.prev_error < 0.0 {
            self.integral = 0.0;
        }
        self.integral = (self.integral + error).clamp(-gains.integral_max, gains.integral_max);

        let derivative = if self.primed {
            damping * gains.kd * (error - self.prev_error)
        } else {
            0.0
        };

        self.prev_error = error;
        self.primed = true;

        gains.kp * error + gains.ki * self.integral + derivative
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
