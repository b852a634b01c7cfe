//! Property tests: the dynamics layer clamps instead of diverging.
//!
//! Covers the bounds invariant of `step`, the coherence midpoint and
//! monotonicity, and the symmetry of basin classification.

use eisv_dynamics::{
    classify_basin, coherence, step, Basin, DampingMode, DynamicsParams, State, Theta,
};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_params() -> impl Strategy<Value = DynamicsParams> {
    prop_oneof![
        Just(DynamicsParams::default()),
        Just(DynamicsParams::conservative()),
        Just(DynamicsParams::exploratory()),
        Just(DynamicsParams {
            damping: DampingMode::Linear,
            ..DynamicsParams::default()
        }),
    ]
}

/// Any state, including components far outside the bounds.
fn arb_state() -> impl Strategy<Value = State> {
    (-10.0..10.0f64, -10.0..10.0f64, -10.0..10.0f64, -10.0..10.0f64)
        .prop_map(|(e, i, s, v)| State::new(e, i, s, v))
}

fn arb_theta() -> impl Strategy<Value = Theta> {
    (-5.0..10.0f64, -5.0..10.0f64).prop_map(|(c1, eta1)| Theta::new(c1, eta1))
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    /// One step from any state with any drift stays within bounds.
    #[test]
    fn step_stays_within_bounds(
        params in arb_params(),
        state in arb_state(),
        theta in arb_theta(),
        drift in prop::collection::vec(-100.0..100.0f64, 0..8),
        dt in -1.0..5.0f64,
        noise in -10.0..10.0f64,
        complexity in -5.0..5.0f64,
    ) {
        let next = step(&state, &drift, &theta, &params, dt, noise, complexity);
        prop_assert!(next.within_bounds(&params), "{:?}", next);
    }

    /// Repeated steps never escape either.
    #[test]
    fn trajectories_stay_within_bounds(
        params in arb_params(),
        theta in arb_theta(),
        drifts in prop::collection::vec(prop::collection::vec(-5.0..5.0f64, 3), 1..60),
        complexity in 0.0..1.0f64,
    ) {
        let mut state = State::default();
        for drift in &drifts {
            state = step(&state, drift, &theta, &params, 0.1, 0.0, complexity);
            prop_assert!(state.within_bounds(&params));
        }
    }

    #[test]
    fn coherence_is_half_max_at_zero_void(params in arb_params(), theta in arb_theta()) {
        let c = coherence(0.0, &theta, &params);
        prop_assert!((c - params.c_max / 2.0).abs() < 1e-9);
    }

    #[test]
    fn coherence_monotone_in_void(
        params in arb_params(),
        theta in arb_theta(),
        a in -2.0..2.0f64,
        b in -2.0..2.0f64,
    ) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let c_lo = coherence(lo, &theta, &params);
        let c_hi = coherence(hi, &theta, &params);
        prop_assert!(c_lo <= c_hi + 1e-12);
        prop_assert!((0.0..=params.c_max).contains(&c_lo));
        prop_assert!((0.0..=params.c_max).contains(&c_hi));
    }

    /// Mirrored integrity values around the midpoint land in mirrored basins.
    #[test]
    fn basin_classification_is_symmetric(
        params in arb_params(),
        offset in 0.0..0.5f64,
    ) {
        let margin = params.basin_margin.abs();
        prop_assume!((offset - margin).abs() > 1e-9);

        let mid = params.basin_midpoint;
        let above = classify_basin(&State { i: mid + offset, ..State::default() }, &params);
        let below = classify_basin(&State { i: mid - offset, ..State::default() }, &params);

        let mirrored = match above {
            Basin::High => Basin::Low,
            Basin::Low => Basin::High,
            Basin::Boundary => Basin::Boundary,
        };
        prop_assert_eq!(below, mirrored);
        prop_assert_eq!(above == Basin::Boundary, offset <= margin);
    }
}
