//! The dialectic state machine.
//!
//! Thesis -> Antithesis -> Synthesis (bounded rounds) -> Resolved, Escalated
//! or Failed. Every operation validates before it mutates, so a rejected
//! call leaves the session exactly as it was.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::config::DialecticConfig;
use crate::convergence;
use crate::error::DialecticError;
use crate::gate::check_hard_limits;
use crate::merge::merge_proposals;
use crate::message::{DialecticMessage, MessagePayload};
use crate::reviewer::{select_reviewer, AgentSummary, ReviewerPredicates};
use crate::session::{DialecticSession, Resolution, ResolutionAction, SessionKind, SessionPhase};
use crate::signing::KeyRing;
use crate::timeout;

pub struct DialecticProtocol {
    config: DialecticConfig,
    keys: Arc<dyn KeyRing>,
}

impl DialecticProtocol {
    pub fn new(config: DialecticConfig, keys: Arc<dyn KeyRing>) -> Self {
        Self { config, keys }
    }

    pub fn config(&self) -> &DialecticConfig {
        &self.config
    }

    /// Open a session between `paused` and `reviewer`.
    ///
    /// Fails with `ParticipantBusy` when either is already part of a
    /// non-terminal session. The caller persists the returned session.
    pub async fn open_session<P>(
        &self,
        paused: &str,
        reviewer: &str,
        kind: SessionKind,
        predicates: &P,
        now: DateTime<Utc>,
    ) -> Result<DialecticSession, DialecticError>
    where
        P: ReviewerPredicates + ?Sized,
    {
        for agent in [paused, reviewer] {
            if predicates.is_in_active_session(agent).await? {
                warn!(agent_id = %agent, "Session refused, participant busy");
                return Err(DialecticError::ParticipantBusy(agent.to_string()));
            }
        }
        let session = DialecticSession::new(paused, reviewer, kind, now);
        info!(
            session_id = %session.id,
            paused = %paused,
            reviewer = %reviewer,
            kind = %kind,
            "Dialectic session opened"
        );
        Ok(session)
    }

    /// Select a reviewer among `candidates`, then open the session.
    #[allow(clippy::too_many_arguments)]
    pub async fn open_with_selection<S, P, R>(
        &self,
        paused: &str,
        candidates: &BTreeMap<String, S>,
        exclude: &[String],
        kind: SessionKind,
        predicates: &P,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<DialecticSession, DialecticError>
    where
        S: AgentSummary,
        P: ReviewerPredicates + ?Sized,
        R: Rng + ?Sized,
    {
        let window = Duration::hours(self.config.recent_review_hours);
        let selection =
            select_reviewer(paused, candidates, exclude, predicates, window, now, rng).await?;
        self.open_session(paused, &selection.reviewer, kind, predicates, now)
            .await
    }

    /// Sign `payload` as `sender` for `session` using the key ring.
    pub fn sign(
        &self,
        session: &DialecticSession,
        sender: &str,
        payload: MessagePayload,
        timestamp: DateTime<Utc>,
    ) -> Result<DialecticMessage, DialecticError> {
        let secret = self
            .keys
            .secret(sender)
            .ok_or_else(|| DialecticError::InvalidSignature(sender.to_string()))?;
        DialecticMessage::signed(&session.id, sender, timestamp, payload, &secret)
    }

    fn check_submission(
        &self,
        session: &DialecticSession,
        message: &DialecticMessage,
        expected: SessionPhase,
    ) -> Result<(), DialecticError> {
        if session.phase != expected {
            return Err(DialecticError::Phase {
                expected,
                actual: session.phase,
            });
        }
        if message.phase() != expected {
            return Err(DialecticError::Phase {
                expected,
                actual: message.phase(),
            });
        }

        let sender = message.sender.as_str();
        let authorized = match expected {
            SessionPhase::Thesis => sender == session.paused_agent,
            SessionPhase::Antithesis => sender == session.reviewer,
            _ => session.is_participant(sender),
        };
        if !authorized {
            let detail = match expected {
                SessionPhase::Thesis => format!("only {} may submit", session.paused_agent),
                SessionPhase::Antithesis => format!("only {} may submit", session.reviewer),
                _ => "not a participant".to_string(),
            };
            return Err(DialecticError::Authorization {
                sender: sender.to_string(),
                phase: expected,
                detail,
            });
        }

        let secret = self
            .keys
            .secret(sender)
            .ok_or_else(|| DialecticError::InvalidSignature(sender.to_string()))?;
        if !message.verify(&session.id, &secret)? {
            return Err(DialecticError::InvalidSignature(sender.to_string()));
        }
        if session
            .transcript
            .iter()
            .any(|m| m.signature == message.signature)
        {
            return Err(DialecticError::DuplicateMessage(sender.to_string()));
        }
        Ok(())
    }

    fn rejected(session: &DialecticSession, sender: &str, err: DialecticError) -> DialecticError {
        warn!(
            session_id = %session.id,
            sender = %sender,
            phase = %session.phase,
            error = %err,
            "Submission rejected"
        );
        err
    }

    fn accept(session: &mut DialecticSession, message: DialecticMessage) {
        session.last_activity = message.timestamp;
        session.transcript.push(message);
    }

    /// The paused agent states its root cause and proposed conditions.
    pub fn submit_thesis(
        &self,
        session: &mut DialecticSession,
        message: DialecticMessage,
    ) -> Result<(), DialecticError> {
        self.check_submission(session, &message, SessionPhase::Thesis)
            .map_err(|e| Self::rejected(session, &message.sender, e))?;
        Self::accept(session, message);
        session.phase = SessionPhase::Antithesis;
        info!(session_id = %session.id, "Thesis accepted");
        Ok(())
    }

    /// The reviewer answers with observations and concerns.
    pub fn submit_antithesis(
        &self,
        session: &mut DialecticSession,
        message: DialecticMessage,
    ) -> Result<(), DialecticError> {
        self.check_submission(session, &message, SessionPhase::Antithesis)
            .map_err(|e| Self::rejected(session, &message.sender, e))?;
        Self::accept(session, message);
        session.phase = SessionPhase::Synthesis;
        info!(session_id = %session.id, "Antithesis accepted");
        Ok(())
    }

    /// Either participant proposes a synthesis.
    ///
    /// Returns the phase after the submission: `Resolved` once both sides'
    /// latest proposals agree and converge.
    pub fn submit_synthesis(
        &self,
        session: &mut DialecticSession,
        message: DialecticMessage,
    ) -> Result<SessionPhase, DialecticError> {
        self.check_submission(session, &message, SessionPhase::Synthesis)
            .map_err(|e| Self::rejected(session, &message.sender, e))?;

        let max = self.config.max_synthesis_rounds;
        if session.synthesis_round >= max {
            session.phase = SessionPhase::Escalated;
            session.terminal_reason = Some(format!("synthesis round limit of {max} reached"));
            warn!(session_id = %session.id, rounds = session.synthesis_round, "Session escalated");
            return Err(DialecticError::RoundLimitExceeded { max });
        }

        let timestamp = message.timestamp;
        let agrees = message.payload.agrees();
        Self::accept(session, message);
        session.synthesis_round += 1;
        debug!(
            session_id = %session.id,
            round = session.synthesis_round,
            agrees,
            "Synthesis accepted"
        );

        if agrees {
            if let Some(resolution) = self.try_converge(session, timestamp)? {
                info!(
                    session_id = %session.id,
                    conditions = resolution.conditions.len(),
                    content_hash = %resolution.content_hash,
                    "Session resolved"
                );
                session.resolution = Some(resolution);
                session.phase = SessionPhase::Resolved;
            }
        }
        Ok(session.phase)
    }

    /// The two synthesis messages to compare: the latest from each side, or
    /// for self-review the latest two.
    fn final_pair(session: &DialecticSession) -> Option<(&DialecticMessage, &DialecticMessage)> {
        if session.is_self_review() {
            let own: Vec<&DialecticMessage> = session.synthesis_messages().collect();
            match own.as_slice() {
                [.., first, second] => Some((*first, *second)),
                _ => None,
            }
        } else {
            Some((
                session.latest_synthesis_from(&session.paused_agent)?,
                session.latest_synthesis_from(&session.reviewer)?,
            ))
        }
    }

    fn try_converge(
        &self,
        session: &DialecticSession,
        now: DateTime<Utc>,
    ) -> Result<Option<Resolution>, DialecticError> {
        let Some((agent_msg, reviewer_msg)) = Self::final_pair(session) else {
            return Ok(None);
        };
        if !(agent_msg.payload.agrees() && reviewer_msg.payload.agrees()) {
            return Ok(None);
        }
        let (Some(agent), Some(reviewer)) =
            (agent_msg.payload.proposal(), reviewer_msg.payload.proposal())
        else {
            return Ok(None);
        };

        let report = convergence::evaluate(&agent, &reviewer, &self.config.convergence);
        debug!(
            session_id = %session.id,
            match_ratio = report.match_ratio,
            root_cause_overlap = report.root_cause_overlap,
            converged = report.converged,
            "Convergence check"
        );
        if !report.converged {
            return Ok(None);
        }

        let merged = merge_proposals(&agent, &reviewer);
        let content_hash = Resolution::compute_hash(
            &session.id,
            ResolutionAction::Resume,
            &merged.conditions,
            &merged.root_cause,
            &merged.reasoning,
        )?;
        Ok(Some(Resolution {
            action: ResolutionAction::Resume,
            conditions: merged.conditions,
            root_cause: merged.root_cause,
            reasoning: merged.reasoning,
            agent_signature: agent_msg.signature.clone(),
            reviewer_signature: reviewer_msg.signature.clone(),
            timestamp: now,
            content_hash,
        }))
    }

    /// Run the hard-limit gate and release the resolution.
    ///
    /// Only valid in `Resolved`. A gate failure leaves the phase unchanged
    /// but records the reason, so the session's outcome becomes a block.
    pub fn finalize(&self, session: &mut DialecticSession) -> Result<Resolution, DialecticError> {
        if session.phase != SessionPhase::Resolved {
            return Err(DialecticError::InvalidState(format!(
                "session {} is in {}, not resolved",
                session.id, session.phase
            )));
        }
        let Some(resolution) = session.resolution.clone() else {
            return Err(DialecticError::InvalidState(format!(
                "session {} has no resolution",
                session.id
            )));
        };
        if session.finalized {
            return Ok(resolution);
        }

        if let Err(violation) = check_hard_limits(&resolution.conditions, &resolution.root_cause) {
            let reason = violation.to_string();
            warn!(session_id = %session.id, reason = %reason, "Resolution blocked by safety gate");
            session.terminal_reason = Some(reason.clone());
            return Err(DialecticError::SafetyViolation(reason));
        }

        session.finalized = true;
        session.terminal_reason = None;
        info!(
            session_id = %session.id,
            action = %resolution.action,
            "Resolution finalized"
        );
        Ok(resolution)
    }

    /// Report an expired clock without acting on it.
    pub fn check_timeout(&self, session: &DialecticSession, now: DateTime<Utc>) -> Option<String> {
        timeout::check_timeout(session, now, &self.config.timeouts)
    }

    pub fn force_escalate(
        &self,
        session: &mut DialecticSession,
        reason: impl Into<String>,
    ) -> Result<(), DialecticError> {
        self.force_terminal(session, SessionPhase::Escalated, reason.into())
    }

    pub fn force_fail(
        &self,
        session: &mut DialecticSession,
        reason: impl Into<String>,
    ) -> Result<(), DialecticError> {
        self.force_terminal(session, SessionPhase::Failed, reason.into())
    }

    fn force_terminal(
        &self,
        session: &mut DialecticSession,
        phase: SessionPhase,
        reason: String,
    ) -> Result<(), DialecticError> {
        if session.is_terminal() {
            return Err(DialecticError::InvalidState(format!(
                "session {} is already {}",
                session.id, session.phase
            )));
        }
        warn!(session_id = %session.id, to = %phase, reason = %reason, "Session forced terminal");
        session.phase = phase;
        session.terminal_reason = Some(reason);
        Ok(())
    }
}
