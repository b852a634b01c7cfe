#![deny(unsafe_code)]
//! # eisv-dialectic
//!
//! Structured recovery negotiation for a hard-blocked agent.
//!
//! A paused agent and a reviewer exchange signed messages through a fixed
//! sequence of phases:
//!
//! ```text
//! Thesis ──▶ Antithesis ──▶ Synthesis (bounded rounds) ──▶ Resolved
//!                                    │                        │
//!                                    └──▶ Escalated / Failed  └──▶ finalize (hard-limit gate)
//! ```
//!
//! Sessions are plain serializable data mutated through [`DialecticProtocol`];
//! persistence goes through a [`SessionStore`]. Timeouts are only reported.

pub mod calibration;
pub mod config;
pub mod convergence;
pub mod error;
pub mod gate;
pub mod merge;
pub mod message;
pub mod protocol;
pub mod reviewer;
pub mod session;
pub mod signing;
pub mod store;
pub mod timeout;

pub use calibration::{
    report_outcome, CalibrationRecorder, CalibrationReport, InMemoryCalibrationRecorder,
};
pub use config::DialecticConfig;
pub use convergence::{normalize_condition, ConvergenceConfig, ConvergenceReport};
pub use error::{DialecticError, DialecticErrorKind, StoreError};
pub use gate::{
    check_hard_limits, extract_threshold_mentions, GateViolation, ThresholdKind, ThresholdMention,
};
pub use merge::merge_conditions;
pub use message::{DialecticMessage, MessagePayload, Proposal};
pub use protocol::DialecticProtocol;
pub use reviewer::{
    select_reviewer, AgentRecord, AgentStatus, AgentSummary, ReviewerPredicates,
    ReviewerSelection,
};
pub use session::{
    derive_session_id, DialecticSession, Resolution, ResolutionAction, SessionKind, SessionPhase,
};
pub use signing::{ContentHash, InMemoryKeyRing, KeyRing};
pub use store::{ActiveSessionRegistry, InMemorySessionStore, JsonFileSessionStore, SessionStore};
pub use timeout::{check_timeout, TimeoutConfig, TimeoutTable};
