//! E2E: a paused agent and its reviewer negotiate a resumption, with the
//! session persisted between every step.

use std::sync::Arc;

use eisv_dialectic::{
    report_outcome, ActiveSessionRegistry, DialecticConfig, DialecticError,
    InMemoryCalibrationRecorder, JsonFileSessionStore, ResolutionAction, SessionKind,
    SessionPhase, SessionStore,
};
use eisv_tests::{antithesis, protocol, synthesis, t, thesis};

const ROOT_CAUSE: &str = "Risk threshold exceeded";
const CONDITION: &str = "Monitor risk for 24 hours";

#[tokio::test]
async fn a1_and_b1_agree_and_resume() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileSessionStore::new(dir.path()));
    let registry = ActiveSessionRegistry::new(store.clone());
    let p = protocol(DialecticConfig::default());

    let mut session = p
        .open_session("a1", "b1", SessionKind::Recovery, &registry, t(0))
        .await
        .unwrap();
    assert_eq!(session.id.len(), 16);
    store.save(&session).await.unwrap();

    let m = p.sign(&session, "a1", thesis(ROOT_CAUSE, &[CONDITION]), t(1)).unwrap();
    p.submit_thesis(&mut session, m).unwrap();
    store.save(&session).await.unwrap();

    let m = p.sign(&session, "b1", antithesis(&["high risk"]), t(2)).unwrap();
    p.submit_antithesis(&mut session, m).unwrap();
    store.save(&session).await.unwrap();

    // Resume from storage as a restarted host would.
    let mut session = store.get(&session.id).await.unwrap();
    assert_eq!(session.phase, SessionPhase::Synthesis);
    assert_eq!(session.transcript.len(), 2);

    let m = p
        .sign(&session, "a1", synthesis(ROOT_CAUSE, &[CONDITION], true), t(3))
        .unwrap();
    assert_eq!(p.submit_synthesis(&mut session, m).unwrap(), SessionPhase::Synthesis);

    let m = p
        .sign(&session, "b1", synthesis(ROOT_CAUSE, &[CONDITION], true), t(4))
        .unwrap();
    assert_eq!(p.submit_synthesis(&mut session, m).unwrap(), SessionPhase::Resolved);

    let resolution = p.finalize(&mut session).unwrap();
    assert_eq!(resolution.action, ResolutionAction::Resume);
    assert_eq!(resolution.conditions, vec![CONDITION.to_string()]);
    assert_eq!(resolution.root_cause, ROOT_CAUSE);
    assert!(resolution.verify_hash(&session.id));
    assert_eq!(session.outcome(), Some(ResolutionAction::Resume));

    store.save(&session).await.unwrap();
    let reloaded = store.get(&session.id).await.unwrap();
    assert_eq!(reloaded, session);
    assert!(store.list_active().await.unwrap().is_empty());

    let recorder = InMemoryCalibrationRecorder::new();
    assert!(report_outcome(&reloaded, &recorder, t(5)).await.unwrap());
    let reports = recorder.reports().unwrap();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].resumed());
}

#[tokio::test]
async fn participants_are_exclusive_while_session_is_open() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileSessionStore::new(dir.path()));
    let registry = ActiveSessionRegistry::new(store.clone());
    let p = protocol(DialecticConfig::default());

    let session = p
        .open_session("a1", "b1", SessionKind::Recovery, &registry, t(0))
        .await
        .unwrap();
    store.save(&session).await.unwrap();

    let err = p
        .open_session("c1", "b1", SessionKind::Dispute, &registry, t(1))
        .await
        .unwrap_err();
    assert!(matches!(err, DialecticError::ParticipantBusy(ref id) if id == "b1"));

    let mut session = session;
    p.force_fail(&mut session, "operator cancelled").unwrap();
    store.save(&session).await.unwrap();

    assert!(p
        .open_session("c1", "b1", SessionKind::Dispute, &registry, t(2))
        .await
        .is_ok());
}
