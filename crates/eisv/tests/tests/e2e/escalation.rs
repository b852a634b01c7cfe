//! E2E: negotiations that never converge end in escalation, and expired
//! clocks are reported without touching the session.

use eisv_dialectic::{
    report_outcome, DialecticConfig, DialecticError, InMemoryCalibrationRecorder,
    ResolutionAction, SessionPhase,
};
use eisv_tests::{protocol, session_in_synthesis, submit, synthesis, t};

const ROOT_CAUSE: &str = "Risk threshold exceeded during batch import";

#[tokio::test]
async fn diverging_proposals_escalate_at_round_limit() {
    let config = DialecticConfig {
        max_synthesis_rounds: 4,
        ..DialecticConfig::default()
    };
    let p = protocol(config);
    let mut session =
        session_in_synthesis(&p, ROOT_CAUSE, &["Monitor risk for 24 hours"]).unwrap();

    let agent = ["Pause batch imports until reviewed"];
    let reviewer = ["Rotate credentials for the import service account"];
    for round in 0..4 {
        let (sender, conditions) = if round % 2 == 0 {
            ("a1", &agent[..])
        } else {
            ("b1", &reviewer[..])
        };
        let phase = submit(
            &p,
            &mut session,
            sender,
            synthesis(ROOT_CAUSE, conditions, true),
            10 + round,
        )
        .unwrap();
        assert_eq!(phase, SessionPhase::Synthesis);
    }
    assert_eq!(session.synthesis_round, 4);

    let err = submit(&p, &mut session, "a1", synthesis(ROOT_CAUSE, &agent, true), 20)
        .unwrap_err();
    assert!(matches!(err, DialecticError::RoundLimitExceeded { max: 4 }));
    assert_eq!(session.phase, SessionPhase::Escalated);
    assert_eq!(session.outcome(), Some(ResolutionAction::Escalate));
    assert!(session.resolution.is_none());

    let recorder = InMemoryCalibrationRecorder::new();
    assert!(report_outcome(&session, &recorder, t(30)).await.unwrap());
    assert_eq!(
        recorder.reports().unwrap()[0].action,
        ResolutionAction::Escalate
    );
}

#[test]
fn idle_synthesis_is_reported_not_acted_on() {
    let p = protocol(DialecticConfig::default());
    let mut session =
        session_in_synthesis(&p, ROOT_CAUSE, &["Monitor risk for 24 hours"]).unwrap();
    let before = session.clone();

    assert!(p.check_timeout(&session, t(2 + 30)).is_none());
    let reason = p.check_timeout(&session, t(2 + 90)).unwrap();
    assert!(!reason.is_empty());
    assert_eq!(session, before);

    p.force_escalate(&mut session, reason).unwrap();
    assert_eq!(session.phase, SessionPhase::Escalated);
    assert!(p.check_timeout(&session, t(2 + 90)).is_none());
    assert!(matches!(
        p.force_fail(&mut session, "late").unwrap_err(),
        DialecticError::InvalidState(_)
    ));
}

#[test]
fn total_duration_expires_even_while_active() {
    let p = protocol(DialecticConfig::default());
    let session = session_in_synthesis(&p, ROOT_CAUSE, &["Monitor risk for 24 hours"]).unwrap();
    let reason = p.check_timeout(&session, t(7 * 60)).unwrap();
    assert!(reason.contains("6h"));
}
