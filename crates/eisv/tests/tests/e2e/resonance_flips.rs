//! E2E: verdict flips make an agent resonant, and the alert reaches a peer
//! governed by a different core over a shared bus.

use std::sync::Arc;

use eisv_core::{AgentCycle, GovernanceConfig, GovernanceCore};
use eisv_dialectic::InMemorySessionStore;
use eisv_governor::{
    AdaptiveGovernor, FixedPhase, GovernorConfig, GovernorInput, InMemoryResonanceBus, Phase,
    ResonanceBus, ResonanceTrigger, Verdict,
};
use eisv_tests::{frozen_governor_config, key_ring};

#[test]
fn alternating_safe_high_risk_triggers_flips_by_fifth_flip() {
    let config = GovernorConfig {
        flip_threshold: 4,
        ..frozen_governor_config()
    };
    let mut governor = AdaptiveGovernor::new(config).with_classifier(FixedPhase(Phase::Integration));

    let mut at_fifth_flip = None;
    for n in 0..10 {
        let input = if n % 2 == 0 {
            GovernorInput::new(0.9, 0.05)
        } else {
            GovernorInput::new(0.3, 0.65)
        };
        let out = governor.update("a1", &input);
        let expected = if n % 2 == 0 { Verdict::Safe } else { Verdict::HighRisk };
        assert_eq!(out.verdict, expected);
        if out.flips >= 5 && at_fifth_flip.is_none() {
            at_fifth_flip = Some((out.resonant, out.trigger));
        }
    }
    assert_eq!(at_fifth_flip, Some((true, Some(ResonanceTrigger::Flips))));
    assert!(governor.state("a1").unwrap().resonant);
}

fn core(config: GovernanceConfig, bus: Arc<InMemoryResonanceBus>) -> GovernanceCore {
    GovernanceCore::new(
        config,
        key_ring(&["a1", "b1"]),
        Arc::new(InMemorySessionStore::new()),
    )
    .unwrap()
    .with_bus(bus)
}

#[test]
fn alert_crosses_cores_on_shared_bus() {
    let bus = Arc::new(InMemoryResonanceBus::new(64));
    let frozen = GovernanceConfig {
        governor: frozen_governor_config(),
        ..GovernanceConfig::default()
    };
    let mut unstable = core(frozen, bus.clone()).with_phase_classifier(FixedPhase(Phase::Integration));
    let mut peer = core(GovernanceConfig::default(), bus.clone());

    let baseline = peer.process_cycle("b1", &AgentCycle::with_risk(0.1));
    assert_eq!(baseline.neighbor_pressure, 0.0);

    for n in 0..12 {
        let risk = if n % 2 == 0 { 0.05 } else { 0.65 };
        unstable.process_cycle("a1", &AgentCycle::with_risk(risk));
    }
    assert!(unstable.governor_state("a1").unwrap().resonant);
    assert!(bus
        .recent_peer_signals("b1")
        .iter()
        .any(|env| env.signal.is_alert() && env.signal.agent_id() == "a1"));

    let pressured = peer.process_cycle("b1", &AgentCycle::with_risk(0.1));
    assert!(pressured.neighbor_pressure > 0.0);

    // Signals are applied once; the watermark skips them afterwards.
    let again = peer.process_cycle("b1", &AgentCycle::with_risk(0.1));
    assert_eq!(again.neighbor_pressure, pressured.neighbor_pressure);
}
