//! Adversarial: forged, replayed and misrouted messages are rejected and
//! never change the session.

use eisv_dialectic::{
    DialecticConfig, DialecticError, DialecticErrorKind, DialecticMessage, DialecticSession,
    SessionKind, SessionPhase,
};
use eisv_tests::{antithesis, protocol, session_in_synthesis, synthesis, t, thesis};

const ROOT_CAUSE: &str = "Risk threshold exceeded";
const CONDITION: &str = "Monitor risk for 24 hours";

#[test]
fn message_signed_with_wrong_key_is_rejected() {
    let p = protocol(DialecticConfig::default());
    let mut session = DialecticSession::new("a1", "b1", SessionKind::Recovery, t(0));
    let forged = DialecticMessage::signed(
        &session.id,
        "a1",
        t(1),
        thesis(ROOT_CAUSE, &[CONDITION]),
        b"not-a1s-secret",
    )
    .unwrap();
    let before = session.clone();

    let err = p.submit_thesis(&mut session, forged).unwrap_err();
    assert_eq!(err.kind(), DialecticErrorKind::InvalidSignature);
    assert_eq!(session, before);
}

#[test]
fn tampered_payload_fails_verification() {
    let p = protocol(DialecticConfig::default());
    let mut session = DialecticSession::new("a1", "b1", SessionKind::Recovery, t(0));
    let mut message = p
        .sign(&session, "a1", thesis(ROOT_CAUSE, &[CONDITION]), t(1))
        .unwrap();
    message.payload = thesis(ROOT_CAUSE, &["Disable monitoring"]);

    assert!(p.submit_thesis(&mut session, message).is_err());
    assert_eq!(session.phase, SessionPhase::Thesis);
    assert!(session.transcript.is_empty());
}

#[test]
fn message_replayed_into_another_session_is_rejected() {
    let p = protocol(DialecticConfig::default());
    let original = DialecticSession::new("a1", "b1", SessionKind::Recovery, t(0));
    let mut other = DialecticSession::new("a1", "b1", SessionKind::Recovery, t(60));
    assert_ne!(original.id, other.id);

    let message = p
        .sign(&original, "a1", thesis(ROOT_CAUSE, &[CONDITION]), t(1))
        .unwrap();
    let err = p.submit_thesis(&mut other, message).unwrap_err();
    assert_eq!(err.kind(), DialecticErrorKind::InvalidSignature);
    assert!(other.transcript.is_empty());
}

#[test]
fn outsider_cannot_submit_synthesis() {
    let p = protocol(DialecticConfig::default());
    let mut session = session_in_synthesis(&p, ROOT_CAUSE, &[CONDITION]).unwrap();
    let before = session.clone();

    let message = p
        .sign(&session, "c1", synthesis(ROOT_CAUSE, &[CONDITION], true), t(5))
        .unwrap();
    let err = p.submit_synthesis(&mut session, message).unwrap_err();
    assert!(matches!(err, DialecticError::Authorization { .. }));
    assert_eq!(session, before);
}

#[test]
fn reviewer_cannot_write_the_thesis() {
    let p = protocol(DialecticConfig::default());
    let mut session = DialecticSession::new("a1", "b1", SessionKind::Recovery, t(0));
    let message = p
        .sign(&session, "b1", thesis(ROOT_CAUSE, &[CONDITION]), t(1))
        .unwrap();
    let err = p.submit_thesis(&mut session, message).unwrap_err();
    assert_eq!(err.kind(), DialecticErrorKind::Authorization);
    assert_eq!(session.phase, SessionPhase::Thesis);
}

#[test]
fn antithesis_out_of_phase_is_rejected() {
    let p = protocol(DialecticConfig::default());
    let mut session = DialecticSession::new("a1", "b1", SessionKind::Recovery, t(0));
    let message = p.sign(&session, "b1", antithesis(&["high risk"]), t(1)).unwrap();
    let err = p.submit_antithesis(&mut session, message).unwrap_err();
    assert!(matches!(
        err,
        DialecticError::Phase {
            expected: SessionPhase::Antithesis,
            actual: SessionPhase::Thesis
        }
    ));
}

#[test]
fn unknown_sender_cannot_sign() {
    let p = protocol(DialecticConfig::default());
    let session = DialecticSession::new("a1", "b1", SessionKind::Recovery, t(0));
    let err = p
        .sign(&session, "mallory", thesis(ROOT_CAUSE, &[CONDITION]), t(1))
        .unwrap_err();
    assert_eq!(err.kind(), DialecticErrorKind::InvalidSignature);
}

#[test]
fn replayed_synthesis_cannot_burn_rounds() {
    let p = protocol(DialecticConfig {
        max_synthesis_rounds: 3,
        ..DialecticConfig::default()
    });
    let mut session = session_in_synthesis(&p, ROOT_CAUSE, &[CONDITION]).unwrap();
    let message = p
        .sign(&session, "a1", synthesis(ROOT_CAUSE, &[CONDITION], false), t(5))
        .unwrap();
    p.submit_synthesis(&mut session, message.clone()).unwrap();
    let before = session.clone();

    for _ in 0..5 {
        let err = p.submit_synthesis(&mut session, message.clone()).unwrap_err();
        assert_eq!(err.kind(), DialecticErrorKind::DuplicateMessage);
    }
    assert_eq!(session, before);
    assert_eq!(session.phase, SessionPhase::Synthesis);
    assert_eq!(session.last_activity, t(5));
}
