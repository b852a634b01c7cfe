//! Shared fixtures for the EISV integration and property tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use eisv_dialectic::{
    DialecticConfig, DialecticError, DialecticProtocol, DialecticSession, InMemoryKeyRing,
    KeyRing, MessagePayload, SessionKind, SessionPhase,
};
use eisv_governor::GovernorConfig;

/// Fixed reference clock, offset by `minutes`.
pub fn t(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
        .single()
        .unwrap_or_default()
        + Duration::minutes(minutes)
}

/// Key ring holding a distinct secret per agent id.
pub fn key_ring(agents: &[&str]) -> Arc<dyn KeyRing> {
    let mut keys = InMemoryKeyRing::new();
    for agent in agents {
        keys.insert(*agent, format!("secret-{agent}").into_bytes());
    }
    Arc::new(keys)
}

pub fn protocol(config: DialecticConfig) -> DialecticProtocol {
    DialecticProtocol::new(config, key_ring(&["a1", "b1", "c1"]))
}

/// Governor whose PID gains are zero, so thresholds stay at their defaults.
pub fn frozen_governor_config() -> GovernorConfig {
    GovernorConfig {
        kp: 0.0,
        ki: 0.0,
        kd: 0.0,
        ..GovernorConfig::default()
    }
}

pub fn thesis(root_cause: &str, conditions: &[&str]) -> MessagePayload {
    MessagePayload::Thesis {
        root_cause: root_cause.to_string(),
        proposed_conditions: strings(conditions),
        reasoning: String::new(),
    }
}

pub fn antithesis(concerns: &[&str]) -> MessagePayload {
    MessagePayload::Antithesis {
        observed_metrics: BTreeMap::new(),
        concerns: strings(concerns),
        reasoning: String::new(),
    }
}

pub fn synthesis(root_cause: &str, conditions: &[&str], agrees: bool) -> MessagePayload {
    MessagePayload::Synthesis {
        root_cause: root_cause.to_string(),
        proposed_conditions: strings(conditions),
        reasoning: String::new(),
        agrees,
    }
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// A fresh a1/b1 recovery session already past thesis and antithesis.
pub fn session_in_synthesis(
    protocol: &DialecticProtocol,
    root_cause: &str,
    conditions: &[&str],
) -> Result<DialecticSession, DialecticError> {
    let mut session = DialecticSession::new("a1", "b1", SessionKind::Recovery, t(0));
    let m = protocol.sign(&session, "a1", thesis(root_cause, conditions), t(1))?;
    protocol.submit_thesis(&mut session, m)?;
    let m = protocol.sign(&session, "b1", antithesis(&["high risk"]), t(2))?;
    protocol.submit_antithesis(&mut session, m)?;
    debug_assert_eq!(session.phase, SessionPhase::Synthesis);
    Ok(session)
}

/// Sign and submit one synthesis message.
pub fn submit(
    protocol: &DialecticProtocol,
    session: &mut DialecticSession,
    sender: &str,
    payload: MessagePayload,
    minute: i64,
) -> Result<SessionPhase, DialecticError> {
    let message = protocol.sign(session, sender, payload, t(minute))?;
    protocol.submit_synthesis(session, message)
}
