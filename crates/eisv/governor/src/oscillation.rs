use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::types::Verdict;

/// Snapshot of oscillation measurements after one observation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OscillationReading {
    /// Sum of the coherence and risk transition EMAs.
    pub index: f64,
    /// Verdict changes within the verdict window.
    pub flips: usize,
}

/// Bounded sign and verdict windows with incremental transition EMAs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OscillationTracker {
    coherence_signs: VecDeque<i8>,
    risk_signs: VecDeque<i8>,
    verdicts: VecDeque<Verdict>,
    coherence_ema: f64,
    risk_ema: f64,
}

fn sign(value: f64, threshold: f64) -> i8 {
    if value >= threshold {
        1
    } else {
        -1
    }
}

fn push_bounded<T>(window: &mut VecDeque<T>, item: T, size: usize) {
    window.push_back(item);
    while window.len() > size {
        window.pop_front();
    }
}

/// Push a sign and fold its transition into `ema`.
fn observe_sign(window: &mut VecDeque<i8>, ema: &mut f64, s: i8, alpha: f64, size: usize) {
    if let Some(&last) = window.back() {
        let transition = if last != s { 1.0 } else { 0.0 };
        *ema += alpha * (transition - *ema);
    }
    push_bounded(window, s, size);
}

impl OscillationTracker {
    /// Record one cycle.
    ///
    /// `previous_verdict` is the verdict issued on the prior cycle, if any;
    /// flips are counted over the verdict window.
    pub fn observe(
        &mut self,
        coherence: f64,
        tau: f64,
        risk: f64,
        beta: f64,
        previous_verdict: Option<Verdict>,
        alpha: f64,
        window_size: usize,
    ) -> OscillationReading {
        observe_sign(
            &mut self.coherence_signs,
            &mut self.coherence_ema,
            sign(coherence, tau),
            alpha,
            window_size,
        );
        observe_sign(
            &mut self.risk_signs,
            &mut self.risk_ema,
            sign(risk, beta),
            alpha,
            window_size,
        );
        if let Some(v) = previous_verdict {
            push_bounded(&mut self.verdicts, v, window_size);
        }

        OscillationReading {
            index: self.index(),
            flips: self.flips(),
        }
    }

    pub fn index(&self) -> f64 {
        self.coherence_ema + self.risk_ema
    }

    pub fn flips(&self) -> usize {
        self.verdicts
            .iter()
            .zip(self.verdicts.iter().skip(1))
            .filter(|(a, b)| a != b)
            .count()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
