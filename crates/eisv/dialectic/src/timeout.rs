//! Session clocks. Timeouts are only reported, never acted on.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::session::{DialecticSession, SessionKind, SessionPhase};

/// The three independent clocks of one session kind, in seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutTable {
    /// Time the reviewer has to answer the thesis.
    pub antithesis_secs: u64,
    /// Time allowed between synthesis submissions.
    pub synthesis_round_secs: u64,
    /// Wall-clock cap for the whole session.
    pub total_secs: u64,
}

const HOUR: u64 = 3600;

impl TimeoutTable {
    pub const fn hours(antithesis: u64, synthesis_round: u64, total: u64) -> Self {
        Self {
            antithesis_secs: antithesis * HOUR,
            synthesis_round_secs: synthesis_round * HOUR,
            total_secs: total * HOUR,
        }
    }

    fn duration(secs: u64) -> Duration {
        // TimeDelta::seconds rejects magnitudes beyond i64::MAX / 1000.
        let secs = i64::try_from(secs).unwrap_or(i64::MAX).min(i64::MAX / 1000);
        Duration::seconds(secs)
    }

    pub fn antithesis(&self) -> Duration {
        Self::duration(self.antithesis_secs)
    }

    pub fn synthesis_round(&self) -> Duration {
        Self::duration(self.synthesis_round_secs)
    }

    pub fn total(&self) -> Duration {
        Self::duration(self.total_secs)
    }
}

/// Timeout tables per session kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Recovery and dispute sessions.
    pub standard: TimeoutTable,
    pub exploration: TimeoutTable,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            standard: TimeoutTable::hours(2, 1, 6),
            exploration: TimeoutTable::hours(24, 6, 72),
        }
    }
}

impl TimeoutConfig {
    pub fn for_kind(&self, kind: SessionKind) -> &TimeoutTable {
        match kind {
            SessionKind::Exploration => &self.exploration,
            SessionKind::Recovery | SessionKind::Dispute => &self.standard,
        }
    }
}

fn describe(d: Duration) -> String {
    if d.num_seconds() % 3600 == 0 {
        format!("{}h", d.num_hours())
    } else {
        format!("{}m", d.num_minutes())
    }
}

/// Describe the first expired clock of `session` at `now`, if any.
pub fn check_timeout(
    session: &DialecticSession,
    now: DateTime<Utc>,
    config: &TimeoutConfig,
) -> Option<String> {
    if session.is_terminal() {
        return None;
    }
    let table = config.for_kind(session.kind);

    if now - session.created_at > table.total() {
        return Some(format!(
            "session {} exceeded total duration of {}",
            session.id,
            describe(table.total())
        ));
    }

    let idle = now - session.last_activity;
    match session.phase {
        SessionPhase::Antithesis if idle > table.antithesis() => Some(format!(
            "reviewer {} did not answer the thesis within {}",
            session.reviewer,
            describe(table.antithesis())
        )),
        SessionPhase::Synthesis if idle > table.synthesis_round() => Some(format!(
            "synthesis round {} idle for longer than {}",
            session.synthesis_round,
            describe(table.synthesis_round())
        )),
        _ => None,
    }
}
