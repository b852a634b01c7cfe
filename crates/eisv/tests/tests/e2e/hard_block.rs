//! E2E: the absolute floor and ceiling block regardless of adaptation.

use std::sync::Arc;

use eisv_core::{AgentCycle, GovernanceConfig, GovernanceCore};
use eisv_dialectic::InMemorySessionStore;
use eisv_governor::{
    AdaptiveGovernor, GovernorConfig, GovernorInput, GovernorState, Verdict,
};
use eisv_tests::key_ring;

#[test]
fn coherence_below_floor_blocks_regardless_of_thresholds() {
    let config = GovernorConfig {
        tau_floor: 0.25,
        ..GovernorConfig::default()
    };
    let mut governor = AdaptiveGovernor::new(config.clone());

    // Most lenient thresholds the bounds allow.
    let mut lenient = GovernorState::new("a1", &config);
    lenient.tau = config.tau_floor;
    lenient.beta = config.beta_ceiling;
    governor.insert_state(lenient);

    let out = governor.update("a1", &GovernorInput::new(0.20, 0.0));
    assert_eq!(out.verdict, Verdict::HardBlock);

    let out = governor.update("b1", &GovernorInput::new(0.20, 0.0));
    assert_eq!(out.verdict, Verdict::HardBlock);
}

#[test]
fn risk_above_ceiling_blocks() {
    let mut governor = AdaptiveGovernor::new(GovernorConfig::default());
    let out = governor.update("a1", &GovernorInput::new(0.95, 0.71));
    assert_eq!(out.verdict, Verdict::HardBlock);
    assert!(out.verdict.is_blocking());
}

#[test]
fn core_flags_recovery_on_runaway_risk() {
    let mut core = GovernanceCore::new(
        GovernanceConfig::default(),
        key_ring(&["a1"]),
        Arc::new(InMemorySessionStore::new()),
    )
    .unwrap();

    let mut first_block = None;
    for n in 0..20 {
        let risk = (15 + 5 * n) as f64 / 100.0;
        let report = core.process_cycle("a1", &AgentCycle::with_risk(risk));
        assert!(report.state.within_bounds(core.params()));
        if report.recovery_required {
            first_block = Some(n);
            break;
        }
    }
    // 0.75 is the first risk above the 0.70 ceiling.
    assert_eq!(first_block, Some(12));
}
