//! Session state and resolution records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::message::{DialecticMessage, Proposal};
use crate::signing::ContentHash;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Thesis,
    Antithesis,
    Synthesis,
    Resolved,
    Escalated,
    Failed,
}

impl SessionPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved | Self::Escalated | Self::Failed)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Thesis => "thesis",
            Self::Antithesis => "antithesis",
            Self::Synthesis => "synthesis",
            Self::Resolved => "resolved",
            Self::Escalated => "escalated",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Why the session was opened. Selects the timeout table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    #[default]
    Recovery,
    Dispute,
    Exploration,
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Recovery => "recovery",
            Self::Dispute => "dispute",
            Self::Exploration => "exploration",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionAction {
    Resume,
    Block,
    Escalate,
}

impl fmt::Display for ResolutionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Resume => "resume",
            Self::Block => "block",
            Self::Escalate => "escalate",
        };
        f.write_str(s)
    }
}

/// Merged agreement produced when a session converges.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub action: ResolutionAction,
    pub conditions: Vec<String>,
    pub root_cause: String,
    pub reasoning: String,
    /// Latest synthesis signature of the paused agent.
    pub agent_signature: String,
    /// Latest synthesis signature of the reviewer.
    pub reviewer_signature: String,
    pub timestamp: DateTime<Utc>,
    pub content_hash: ContentHash,
}

#[derive(Serialize)]
struct HashView<'a> {
    session_id: &'a str,
    action: ResolutionAction,
    conditions: &'a [String],
    root_cause: &'a str,
    reasoning: &'a str,
}

impl Resolution {
    /// Hash over the agreed content and session id; the timestamp is
    /// excluded so identical agreements hash identically.
    pub fn compute_hash(
        session_id: &str,
        action: ResolutionAction,
        conditions: &[String],
        root_cause: &str,
        reasoning: &str,
    ) -> Result<ContentHash, serde_json::Error> {
        let view = HashView {
            session_id,
            action,
            conditions,
            root_cause,
            reasoning,
        };
        Ok(ContentHash::hash(&serde_json::to_vec(&view)?))
    }

    pub fn verify_hash(&self, session_id: &str) -> bool {
        Self::compute_hash(
            session_id,
            self.action,
            &self.conditions,
            &self.root_cause,
            &self.reasoning,
        )
        .map(|h| h == self.content_hash)
        .unwrap_or(false)
    }
}

/// First 16 hex chars of BLAKE3 over the participants and creation time.
pub fn derive_session_id(paused: &str, reviewer: &str, created_at: &DateTime<Utc>) -> String {
    let material = format!("{paused}|{reviewer}|{}", created_at.to_rfc3339());
    blake3::hash(material.as_bytes()).to_hex()[..16].to_string()
}

/// A dialectic negotiation between a paused agent and its reviewer.
///
/// Plain serializable data; the durable unit for persistence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DialecticSession {
    pub id: String,
    pub phase: SessionPhase,
    pub kind: SessionKind,
    pub paused_agent: String,
    pub reviewer: String,
    pub transcript: Vec<DialecticMessage>,
    pub synthesis_round: u32,
    pub resolution: Option<Resolution>,
    #[serde(default)]
    pub topic: Option<String>,
    /// Links the session to a previously declared discovery for calibration.
    #[serde(default)]
    pub discovery_id: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Time of the last accepted submission, or creation.
    pub last_activity: DateTime<Utc>,
    #[serde(default)]
    pub terminal_reason: Option<String>,
    #[serde(default)]
    pub finalized: bool,
}

impl DialecticSession {
    pub fn new(
        paused_agent: impl Into<String>,
        reviewer: impl Into<String>,
        kind: SessionKind,
        created_at: DateTime<Utc>,
    ) -> Self {
        let paused_agent = paused_agent.into();
        let reviewer = reviewer.into();
        Self {
            id: derive_session_id(&paused_agent, &reviewer, &created_at),
            phase: SessionPhase::Thesis,
            kind,
            paused_agent,
            reviewer,
            transcript: Vec::new(),
            synthesis_round: 0,
            resolution: None,
            topic: None,
            discovery_id: None,
            created_at,
            last_activity: created_at,
            terminal_reason: None,
            finalized: false,
        }
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn with_discovery_id(mut self, discovery_id: impl Into<String>) -> Self {
        self.discovery_id = Some(discovery_id.into());
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn is_self_review(&self) -> bool {
        self.paused_agent == self.reviewer
    }

    pub fn is_participant(&self, agent_id: &str) -> bool {
        self.paused_agent == agent_id || self.reviewer == agent_id
    }

    pub fn synthesis_messages(&self) -> impl Iterator<Item = &DialecticMessage> {
        self.transcript
            .iter()
            .filter(|m| m.phase() == SessionPhase::Synthesis)
    }

    pub fn latest_synthesis_from(&self, agent_id: &str) -> Option<&DialecticMessage> {
        self.synthesis_messages()
            .filter(|m| m.sender == agent_id)
            .last()
    }

    /// The thesis proposal, if one was accepted.
    pub fn thesis(&self) -> Option<Proposal> {
        self.transcript
            .iter()
            .find(|m| m.phase() == SessionPhase::Thesis)
            .and_then(|m| m.payload.proposal())
    }

    /// Summary for callers: `None` while negotiation is still open.
    ///
    /// A resolved session resumes only once finalized; a resolved session
    /// whose resolution failed the safety gate stays blocked.
    pub fn outcome(&self) -> Option<ResolutionAction> {
        match self.phase {
            SessionPhase::Resolved if self.finalized => self.resolution.as_ref().map(|r| r.action),
            SessionPhase::Resolved if self.terminal_reason.is_some() => {
                Some(ResolutionAction::Block)
            }
            SessionPhase::Resolved => None,
            SessionPhase::Escalated => Some(ResolutionAction::Escalate),
            SessionPhase::Failed => Some(ResolutionAction::Block),
            _ => None,
        }
    }
}
