//! Property tests: verdict selection is total, deterministic, and the hard
//! block always wins over the adapted thresholds.

use eisv_governor::{verdict_for, GovernorConfig, Verdict, VerdictThresholds};
use proptest::prelude::*;

fn arb_thresholds() -> impl Strategy<Value = VerdictThresholds> {
    (0.0..1.0f64, 0.0..1.0f64).prop_map(|(tau, beta)| {
        VerdictThresholds::from_config(&GovernorConfig::default(), tau, beta)
    })
}

proptest! {
    #[test]
    fn verdict_is_deterministic(
        coherence in -1.0..2.0f64,
        risk in -1.0..2.0f64,
        t in arb_thresholds(),
    ) {
        prop_assert_eq!(verdict_for(coherence, risk, &t), verdict_for(coherence, risk, &t));
    }

    #[test]
    fn hard_block_iff_outside_absolute_limits(
        coherence in -1.0..2.0f64,
        risk in -1.0..2.0f64,
        t in arb_thresholds(),
    ) {
        let outside = coherence < t.tau_floor || risk > t.beta_ceiling;
        let verdict = verdict_for(coherence, risk, &t);
        prop_assert_eq!(verdict == Verdict::HardBlock, outside);
    }

    #[test]
    fn safe_implies_within_adapted_thresholds(
        coherence in 0.0..1.0f64,
        risk in 0.0..1.0f64,
        t in arb_thresholds(),
    ) {
        match verdict_for(coherence, risk, &t) {
            Verdict::Safe => prop_assert!(coherence >= t.tau && risk < t.beta - t.safe_offset),
            Verdict::Caution => prop_assert!(coherence >= t.tau && risk < t.beta),
            Verdict::HighRisk => prop_assert!(coherence < t.tau || risk >= t.beta - t.safe_offset),
            Verdict::HardBlock => prop_assert!(coherence < t.tau_floor || risk > t.beta_ceiling),
        }
    }
}
