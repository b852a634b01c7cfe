//! Signed transcript messages.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DialecticError;
use crate::session::SessionPhase;
use crate::signing;

/// Phase-dependent message body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum MessagePayload {
    /// The paused agent's account of what went wrong.
    Thesis {
        root_cause: String,
        proposed_conditions: Vec<String>,
        reasoning: String,
    },
    /// The reviewer's observations.
    Antithesis {
        observed_metrics: BTreeMap<String, f64>,
        concerns: Vec<String>,
        reasoning: String,
    },
    /// A negotiated proposal from either participant.
    Synthesis {
        root_cause: String,
        proposed_conditions: Vec<String>,
        reasoning: String,
        agrees: bool,
    },
}

impl MessagePayload {
    pub fn phase(&self) -> SessionPhase {
        match self {
            Self::Thesis { .. } => SessionPhase::Thesis,
            Self::Antithesis { .. } => SessionPhase::Antithesis,
            Self::Synthesis { .. } => SessionPhase::Synthesis,
        }
    }

    /// Root cause, conditions and reasoning, when the payload carries them.
    pub fn proposal(&self) -> Option<Proposal> {
        match self {
            Self::Thesis {
                root_cause,
                proposed_conditions,
                reasoning,
            }
            | Self::Synthesis {
                root_cause,
                proposed_conditions,
                reasoning,
                ..
            } => Some(Proposal {
                root_cause: root_cause.clone(),
                conditions: proposed_conditions.clone(),
                reasoning: reasoning.clone(),
            }),
            Self::Antithesis { .. } => None,
        }
    }

    pub fn agrees(&self) -> bool {
        matches!(self, Self::Synthesis { agrees: true, .. })
    }
}

/// What one side proposes the resumption should look like.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub root_cause: String,
    pub conditions: Vec<String>,
    pub reasoning: String,
}

#[derive(Serialize)]
struct SigningView<'a> {
    session_id: &'a str,
    sender: &'a str,
    timestamp: &'a DateTime<Utc>,
    payload: &'a MessagePayload,
}

/// One entry in a session transcript.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DialecticMessage {
    pub sender: String,
    pub timestamp: DateTime<Utc>,
    pub payload: MessagePayload,
    /// Hex keyed hash over [`DialecticMessage::canonical_bytes`].
    pub signature: String,
}

impl DialecticMessage {
    /// Build and sign a message bound to `session_id`.
    pub fn signed(
        session_id: &str,
        sender: impl Into<String>,
        timestamp: DateTime<Utc>,
        payload: MessagePayload,
        secret: &[u8],
    ) -> Result<Self, DialecticError> {
        let mut message = Self {
            sender: sender.into(),
            timestamp,
            payload,
            signature: String::new(),
        };
        let canonical = message.canonical_bytes(session_id)?;
        message.signature = signing::sign(secret, &canonical);
        Ok(message)
    }

    /// Bytes covered by the signature. Binding the session id prevents a
    /// message from being replayed into another session.
    pub fn canonical_bytes(&self, session_id: &str) -> Result<Vec<u8>, DialecticError> {
        let view = SigningView {
            session_id,
            sender: &self.sender,
            timestamp: &self.timestamp,
            payload: &self.payload,
        };
        Ok(serde_json::to_vec(&view)?)
    }

    pub fn verify(&self, session_id: &str, secret: &[u8]) -> Result<bool, DialecticError> {
        let canonical = self.canonical_bytes(session_id)?;
        Ok(signing::verify(secret, &canonical, &self.signature))
    }

    pub fn phase(&self) -> SessionPhase {
        self.payload.phase()
    }
}
