//! Dialectic error types.

use thiserror::Error;

use crate::session::SessionPhase;

/// Errors returned by protocol operations.
///
/// A rejected submission never mutates the session, with one exception:
/// overflowing the synthesis round limit escalates it.
#[derive(Debug, Error)]
pub enum DialecticError {
    /// Sender does not hold the role the phase requires.
    #[error("agent {sender} may not submit {phase}: {detail}")]
    Authorization {
        sender: String,
        phase: SessionPhase,
        detail: String,
    },

    /// Submission does not match the session phase.
    #[error("expected {expected}, found {actual}")]
    Phase {
        expected: SessionPhase,
        actual: SessionPhase,
    },

    #[error("synthesis round limit of {max} exceeded, session escalated")]
    RoundLimitExceeded { max: u32 },

    /// The hard-limit gate rejected the resolution.
    #[error("safety violation: {0}")]
    SafetyViolation(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("invalid signature from {0}")]
    InvalidSignature(String),

    /// The exact signed message is already in the transcript.
    #[error("duplicate message from {0}")]
    DuplicateMessage(String),

    /// A participant is already part of a non-terminal session.
    #[error("agent {0} is already in an active session")]
    ParticipantBusy(String),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Discriminant of [`DialecticError`] for callers that branch on the kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DialecticErrorKind {
    Authorization,
    Phase,
    RoundLimitExceeded,
    SafetyViolation,
    InvalidState,
    InvalidSignature,
    DuplicateMessage,
    ParticipantBusy,
    Storage,
    Serialization,
}

impl DialecticError {
    pub fn kind(&self) -> DialecticErrorKind {
        match self {
            Self::Authorization { .. } => DialecticErrorKind::Authorization,
            Self::Phase { .. } => DialecticErrorKind::Phase,
            Self::RoundLimitExceeded { .. } => DialecticErrorKind::RoundLimitExceeded,
            Self::SafetyViolation(_) => DialecticErrorKind::SafetyViolation,
            Self::InvalidState(_) => DialecticErrorKind::InvalidState,
            Self::InvalidSignature(_) => DialecticErrorKind::InvalidSignature,
            Self::DuplicateMessage(_) => DialecticErrorKind::DuplicateMessage,
            Self::ParticipantBusy(_) => DialecticErrorKind::ParticipantBusy,
            Self::Storage(_) => DialecticErrorKind::Storage,
            Self::Serialization(_) => DialecticErrorKind::Serialization,
        }
    }
}

/// Session and calibration persistence errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("session not found: {0}")]
    NotFound(String),

    #[error("invalid session id: {0}")]
    InvalidId(String),

    #[error("lock poisoned: {0}")]
    Lock(String),
}
