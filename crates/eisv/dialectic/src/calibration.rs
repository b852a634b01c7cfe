//! Calibration hook: reports how a session ended so an external recorder
//! can compare it with the paused agent's declared confidence.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::session::{DialecticSession, ResolutionAction, SessionKind};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReport {
    pub session_id: String,
    pub paused_agent: String,
    pub kind: SessionKind,
    /// Discovery the paused agent declared confidence against, if linked.
    pub discovery_id: Option<String>,
    pub action: ResolutionAction,
    pub session_created_at: DateTime<Utc>,
    pub recorded_at: DateTime<Utc>,
}

impl CalibrationReport {
    /// Build a report for a session with a settled outcome.
    pub fn from_session(session: &DialecticSession, recorded_at: DateTime<Utc>) -> Option<Self> {
        let action = session.outcome()?;
        Some(Self {
            session_id: session.id.clone(),
            paused_agent: session.paused_agent.clone(),
            kind: session.kind,
            discovery_id: session.discovery_id.clone(),
            action,
            session_created_at: session.created_at,
            recorded_at,
        })
    }

    pub fn resumed(&self) -> bool {
        self.action == ResolutionAction::Resume
    }
}

/// External sink for calibration reports.
#[async_trait]
pub trait CalibrationRecorder: Send + Sync {
    async fn record(&self, report: CalibrationReport) -> Result<(), StoreError>;
}

/// Send the session's report to `recorder` if its outcome is settled.
///
/// Returns whether a report was recorded.
pub async fn report_outcome<C>(
    session: &DialecticSession,
    recorder: &C,
    now: DateTime<Utc>,
) -> Result<bool, StoreError>
where
    C: CalibrationRecorder + ?Sized,
{
    match CalibrationReport::from_session(session, now) {
        Some(report) => {
            recorder.record(report).await?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Recorder that keeps reports in memory.
#[derive(Clone, Default)]
pub struct InMemoryCalibrationRecorder {
    reports: Arc<RwLock<Vec<CalibrationReport>>>,
}

impl InMemoryCalibrationRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Result<Vec<CalibrationReport>, StoreError> {
        Ok(self
            .reports
            .read()
            .map_err(|e| StoreError::Lock(e.to_string()))?
            .clone())
    }
}

#[async_trait]
impl CalibrationRecorder for InMemoryCalibrationRecorder {
    async fn record(&self, report: CalibrationReport) -> Result<(), StoreError> {
        self.reports
            .write()
            .map_err(|e| StoreError::Lock(e.to_string()))?
            .push(report);
        Ok(())
    }
}
