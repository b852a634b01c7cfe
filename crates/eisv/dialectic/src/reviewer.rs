//! Reviewer selection for a paused agent.
//!
//! Eligible candidates are chosen uniformly at random, with no authority
//! weighting.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::StoreError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    #[default]
    Active,
    Paused,
    Waiting,
    Archived,
}

/// Agent metadata the protocol needs, regardless of where it is stored.
pub trait AgentSummary: Send + Sync {
    fn status(&self) -> AgentStatus;
    fn tags(&self) -> &[String];
}

/// Plain agent record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRecord {
    pub status: AgentStatus,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl AgentRecord {
    pub fn active() -> Self {
        Self::default()
    }

    pub fn with_status(status: AgentStatus) -> Self {
        Self {
            status,
            tags: Vec::new(),
        }
    }
}

impl AgentSummary for AgentRecord {
    fn status(&self) -> AgentStatus {
        self.status
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }
}

/// Externally backed facts about who is busy and who reviewed whom.
///
/// Must be visible across processes so that participant exclusivity holds
/// fleet-wide.
#[async_trait]
pub trait ReviewerPredicates: Send + Sync {
    /// Whether `agent_id` participates in any non-terminal session.
    async fn is_in_active_session(&self, agent_id: &str) -> Result<bool, StoreError>;

    /// Whether `reviewer` resolved a review of `paused` within `window`
    /// before `now`.
    async fn has_recently_reviewed(
        &self,
        reviewer: &str,
        paused: &str,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;
}

/// Outcome of reviewer selection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewerSelection {
    pub reviewer: String,
    /// No candidate was eligible; the paused agent reviews itself.
    pub self_review: bool,
    pub eligible: usize,
}

/// Pick a reviewer for `paused` among `candidates`.
///
/// Filters out the paused agent, `exclude`d ids, agents already in a
/// session, agents that recently reviewed `paused`, and agents that are
/// not active. Falls back to self-review when nobody is left.
pub async fn select_reviewer<S, P, R>(
    paused: &str,
    candidates: &BTreeMap<String, S>,
    exclude: &[String],
    predicates: &P,
    recent_window: Duration,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<ReviewerSelection, StoreError>
where
    S: AgentSummary,
    P: ReviewerPredicates + ?Sized,
    R: Rng + ?Sized,
{
    let mut eligible: Vec<&str> = Vec::new();
    for (id, summary) in candidates {
        if id == paused || exclude.iter().any(|e| e == id) {
            continue;
        }
        if summary.status() != AgentStatus::Active {
            continue;
        }
        if predicates.is_in_active_session(id).await? {
            continue;
        }
        if predicates
            .has_recently_reviewed(id, paused, recent_window, now)
            .await?
        {
            continue;
        }
        eligible.push(id);
    }

    let selection = match eligible.choose(rng) {
        Some(reviewer) => ReviewerSelection {
            reviewer: reviewer.to_string(),
            self_review: false,
            eligible: eligible.len(),
        },
        None => ReviewerSelection {
            reviewer: paused.to_string(),
            self_review: true,
            eligible: 0,
        },
    };
    debug!(
        paused = %paused,
        reviewer = %selection.reviewer,
        eligible = selection.eligible,
        "Reviewer selected"
    );
    Ok(selection)
}
