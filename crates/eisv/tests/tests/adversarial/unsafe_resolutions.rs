//! Adversarial: both participants agree on something unsafe. The hard-limit
//! gate refuses to finalize, and the governor is never reconfigured.

use std::sync::Arc;

use eisv_core::{AgentCycle, GovernanceConfig, GovernanceCore};
use eisv_dialectic::{
    check_hard_limits, DialecticConfig, DialecticError, DialecticProtocol, DialecticSession,
    GateViolation, InMemoryCalibrationRecorder, InMemorySessionStore, ResolutionAction,
    SessionPhase, SessionStore,
};
use eisv_tests::{key_ring, protocol, session_in_synthesis, strings, submit, synthesis, t};

const ROOT_CAUSE: &str = "Risk threshold exceeded";

fn agreed_session(conditions: &[&str]) -> (DialecticProtocol, DialecticSession) {
    let p = protocol(DialecticConfig::default());
    let mut session = session_in_synthesis(&p, ROOT_CAUSE, conditions).unwrap();
    submit(&p, &mut session, "a1", synthesis(ROOT_CAUSE, conditions, true), 3).unwrap();
    submit(&p, &mut session, "b1", synthesis(ROOT_CAUSE, conditions, true), 4).unwrap();
    assert_eq!(session.phase, SessionPhase::Resolved);
    (p, session)
}

#[test]
fn agreed_disable_monitoring_is_blocked() {
    let (p, mut session) = agreed_session(&["Disable risk monitoring for the night"]);
    let err = p.finalize(&mut session).unwrap_err();
    assert!(matches!(err, DialecticError::SafetyViolation(ref reason) if reason.contains("disables")));
    assert!(!session.finalized);
    assert_eq!(session.outcome(), Some(ResolutionAction::Block));
}

#[test]
fn agreed_out_of_range_threshold_is_blocked() {
    let (p, mut session) = agreed_session(&["Set risk threshold to 0.95"]);
    assert!(matches!(
        p.finalize(&mut session).unwrap_err(),
        DialecticError::SafetyViolation(_)
    ));
}

#[test]
fn gate_catches_each_rule() {
    let root = "Risk threshold exceeded";
    assert!(matches!(
        check_hard_limits(&[], root),
        Err(GateViolation::EmptyConditions)
    ));
    assert!(matches!(
        check_hard_limits(&strings(&["Skip the safety checks on deploy"]), root),
        Err(GateViolation::Forbidden { .. })
    ));
    assert!(matches!(
        check_hard_limits(&strings(&["Remove rate limits for the importer"]), root),
        Err(GateViolation::Forbidden { .. })
    ));
    for phrasing in [
        "Resume after disabling safety monitoring",
        "Resume with safety monitoring disabled",
        "Stop monitoring for 10 cycles",
        "Halt the circuit breaker checks until Monday",
    ] {
        assert!(
            matches!(
                check_hard_limits(&strings(&[phrasing]), root),
                Err(GateViolation::Forbidden { .. })
            ),
            "{phrasing}"
        );
    }
    assert!(matches!(
        check_hard_limits(&strings(&["Set risk threshold to -0.5"]), root),
        Err(GateViolation::ThresholdOutOfBounds { .. })
    ));
    assert!(matches!(
        check_hard_limits(&strings(&["Maybe watch the logs"]), root),
        Err(GateViolation::Hedged { .. })
    ));
    assert!(matches!(
        check_hard_limits(&strings(&["Set coherence threshold to 0.05"]), root),
        Err(GateViolation::ThresholdOutOfBounds { .. })
    ));
    assert!(matches!(
        check_hard_limits(&strings(&["Monitor risk for 24 hours"]), "risk"),
        Err(GateViolation::RootCauseTooShort { .. })
    ));
    assert!(check_hard_limits(&strings(&["Monitor risk for 24 hours"]), root).is_ok());
}

#[tokio::test]
async fn core_keeps_thresholds_when_gate_rejects() {
    let mut core = GovernanceCore::new(
        GovernanceConfig::default(),
        key_ring(&["a1", "b1"]),
        Arc::new(InMemorySessionStore::new()),
    )
    .unwrap();
    core.process_cycle("a1", &AgentCycle::with_risk(0.95));
    let before = core.governor_state("a1").unwrap().clone();

    let (_, mut session) = agreed_session(&["Turn off governance checks and set risk threshold to 0.9"]);
    let recorder = InMemoryCalibrationRecorder::new();
    let err = core
        .conclude(&mut session, Some(&recorder), t(10))
        .await
        .unwrap_err();
    assert!(matches!(err, DialecticError::SafetyViolation(_)));

    let after = core.governor_state("a1").unwrap();
    assert_eq!(after.tau, before.tau);
    assert_eq!(after.beta, before.beta);

    let stored = core.store().get(&session.id).await.unwrap();
    assert_eq!(stored.outcome(), Some(ResolutionAction::Block));
    assert_eq!(recorder.reports().unwrap()[0].action, ResolutionAction::Block);
}

#[tokio::test]
async fn negative_threshold_never_reaches_the_governor() {
    let mut core = GovernanceCore::new(
        GovernanceConfig::default(),
        key_ring(&["a1", "b1"]),
        Arc::new(InMemorySessionStore::new()),
    )
    .unwrap();
    core.process_cycle("a1", &AgentCycle::with_risk(0.95));
    let before = core.governor_state("a1").unwrap().clone();

    let (_, mut session) = agreed_session(&["Set risk threshold to -0.5"]);
    let err = core.conclude(&mut session, None, t(10)).await.unwrap_err();
    assert!(matches!(err, DialecticError::SafetyViolation(ref reason) if reason.contains("-0.5")));
    assert_eq!(core.governor_state("a1").unwrap().beta, before.beta);
    assert_eq!(session.outcome(), Some(ResolutionAction::Block));
}
