//! Per-agent governance pipeline.
//!
//! dynamics step -> coherence -> governor verdict -> (hard block) recovery
//! session -> resolution -> governor reconfiguration.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use eisv_dialectic::{
    extract_threshold_mentions, report_outcome, ActiveSessionRegistry, AgentSummary,
    CalibrationRecorder, DialecticError, DialecticProtocol, DialecticSession, KeyRing,
    ReviewerPredicates, Resolution, SessionKind, SessionStore, ThresholdKind,
};
use eisv_dynamics::{classify_basin, coherence, step, Basin, DynamicsParams, State, Theta};
use eisv_governor::{
    AdaptiveGovernor, GovernorInput, GovernorState, InMemoryResonanceBus, Phase, PhaseClassifier,
    Reconfiguration, ResonanceBus, ResonanceSignal, SimilarityOracle, UniformSimilarity, Verdict,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::GovernanceConfig;
use crate::error::ConfigError;

/// Inputs for one agent cycle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentCycle {
    /// Ethical drift vector; only its squared norm enters the dynamics.
    pub drift: Vec<f64>,
    pub complexity: f64,
    /// Externally estimated risk in [0, 1].
    pub risk: f64,
    pub noise: f64,
    pub dt: f64,
}

impl Default for AgentCycle {
    fn default() -> Self {
        Self {
            drift: Vec::new(),
            complexity: 0.0,
            risk: 0.0,
            noise: 0.0,
            dt: 0.1,
        }
    }
}

impl AgentCycle {
    pub fn with_risk(risk: f64) -> Self {
        Self {
            risk,
            ..Self::default()
        }
    }
}

/// What one cycle produced for one agent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    pub agent_id: String,
    pub state: State,
    pub coherence: f64,
    pub basin: Basin,
    pub verdict: Verdict,
    pub tau: f64,
    pub beta: f64,
    pub phase: Phase,
    pub oscillation_index: f64,
    pub flips: usize,
    pub resonant: bool,
    pub neighbor_pressure: f64,
    /// Edge signal published to the bus this cycle.
    pub signal: Option<ResonanceSignal>,
    /// The agent is hard-blocked and needs a recovery session.
    pub recovery_required: bool,
}

/// Owns EISV states and the governor; drives dialectic recovery.
pub struct GovernanceCore {
    params: DynamicsParams,
    theta: Theta,
    states: HashMap<String, State>,
    governor: AdaptiveGovernor,
    protocol: DialecticProtocol,
    store: Arc<dyn SessionStore>,
    bus: Arc<dyn ResonanceBus>,
    similarity: Arc<dyn SimilarityOracle>,
}

impl GovernanceCore {
    pub fn new(
        config: GovernanceConfig,
        keys: Arc<dyn KeyRing>,
        store: Arc<dyn SessionStore>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let params = config.dynamics_params()?;
        info!(
            profile = %config.profile,
            damping = %params.damping,
            "Governance core initialized"
        );
        Ok(Self {
            params,
            theta: config.theta.clamped(),
            states: HashMap::new(),
            governor: AdaptiveGovernor::new(config.governor),
            protocol: DialecticProtocol::new(config.dialectic, keys),
            store,
            bus: Arc::new(InMemoryResonanceBus::new(config.resonance.bus_capacity)),
            similarity: Arc::new(UniformSimilarity(config.resonance.default_similarity)),
        })
    }

    /// Share a bus with other cores or processes.
    pub fn with_bus(mut self, bus: Arc<dyn ResonanceBus>) -> Self {
        self.bus = bus;
        self
    }

    pub fn with_similarity(mut self, oracle: Arc<dyn SimilarityOracle>) -> Self {
        self.similarity = oracle;
        self
    }

    pub fn with_phase_classifier(mut self, classifier: impl PhaseClassifier + 'static) -> Self {
        self.governor.set_classifier(Box::new(classifier));
        self
    }

    pub fn params(&self) -> &DynamicsParams {
        &self.params
    }

    pub fn theta(&self) -> &Theta {
        &self.theta
    }

    pub fn governor(&self) -> &AdaptiveGovernor {
        &self.governor
    }

    pub fn protocol(&self) -> &DialecticProtocol {
        &self.protocol
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn bus(&self) -> &Arc<dyn ResonanceBus> {
        &self.bus
    }

    pub fn state(&self, agent_id: &str) -> Option<&State> {
        self.states.get(agent_id)
    }

    pub fn governor_state(&self, agent_id: &str) -> Option<&GovernorState> {
        self.governor.state(agent_id)
    }

    /// Participant predicates backed by this core's session store.
    pub fn registry(&self) -> ActiveSessionRegistry<dyn SessionStore> {
        ActiveSessionRegistry::new(self.store.clone())
    }

    /// Advance one agent by one cycle.
    pub fn process_cycle(&mut self, agent_id: &str, cycle: &AgentCycle) -> CycleReport {
        let previous = self.states.get(agent_id).copied().unwrap_or_default();
        let state = step(
            &previous,
            &cycle.drift,
            &self.theta,
            &self.params,
            cycle.dt,
            cycle.noise,
            cycle.complexity,
        );
        self.states.insert(agent_id.to_string(), state);

        let coherence = coherence(state.v, &self.theta, &self.params);
        let basin = classify_basin(&state, &self.params);

        self.governor
            .absorb_peer_signals(agent_id, self.bus.as_ref(), self.similarity.as_ref());
        let input = GovernorInput::new(coherence, cycle.risk).with_state(state, cycle.complexity);
        let outcome = self.governor.update(agent_id, &input);

        if let Some(signal) = &outcome.signal {
            self.bus.emit(signal.clone());
        }
        let recovery_required = outcome.verdict == Verdict::HardBlock;
        if recovery_required {
            warn!(
                agent_id = %agent_id,
                coherence,
                risk = cycle.risk,
                basin = ?basin,
                "Agent hard-blocked, recovery required"
            );
        }

        CycleReport {
            agent_id: agent_id.to_string(),
            state,
            coherence,
            basin,
            verdict: outcome.verdict,
            tau: outcome.tau,
            beta: outcome.beta,
            phase: outcome.phase,
            oscillation_index: outcome.oscillation_index,
            flips: outcome.flips,
            resonant: outcome.resonant,
            neighbor_pressure: outcome.neighbor_pressure,
            signal: outcome.signal,
            recovery_required,
        }
    }

    /// Select a reviewer for `agent_id`, open a recovery session and
    /// persist it.
    #[allow(clippy::too_many_arguments)]
    pub async fn open_recovery<S, P, R>(
        &self,
        agent_id: &str,
        candidates: &BTreeMap<String, S>,
        exclude: &[String],
        predicates: &P,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<DialecticSession, DialecticError>
    where
        S: AgentSummary,
        P: ReviewerPredicates + ?Sized,
        R: Rng + ?Sized,
    {
        let session = self
            .protocol
            .open_with_selection(
                agent_id,
                candidates,
                exclude,
                SessionKind::Recovery,
                predicates,
                rng,
                now,
            )
            .await?;
        self.store.save(&session).await?;
        Ok(session)
    }

    /// Governor overrides implied by a resolution: the last risk threshold
    /// mentioned sets beta, the last coherence threshold sets tau.
    pub fn reconfiguration_for(resolution: &Resolution) -> Reconfiguration {
        let mut reconfig = Reconfiguration {
            tau: None,
            beta: None,
            reset_pressure: true,
        };
        for mention in extract_threshold_mentions(&resolution.conditions) {
            match mention.kind {
                ThresholdKind::Risk => reconfig.beta = Some(mention.value),
                ThresholdKind::Coherence => reconfig.tau = Some(mention.value),
            }
        }
        reconfig
    }

    /// Reconfigure the agent's governor from a finalized resolution.
    ///
    /// Returns the `(tau, beta)` now in effect.
    pub fn apply_resolution(&mut self, agent_id: &str, resolution: &Resolution) -> (f64, f64) {
        let reconfig = Self::reconfiguration_for(resolution);
        let (tau, beta) = self.governor.reconfigure(agent_id, &reconfig);
        info!(
            agent_id = %agent_id,
            content_hash = %resolution.content_hash,
            tau,
            beta,
            "Resolution applied"
        );
        (tau, beta)
    }

    /// Finalize a resolved session, apply it to the paused agent, persist
    /// the session and report the outcome for calibration.
    ///
    /// A safety-gate rejection is persisted and reported too before the
    /// error is returned.
    pub async fn conclude(
        &mut self,
        session: &mut DialecticSession,
        recorder: Option<&dyn CalibrationRecorder>,
        now: DateTime<Utc>,
    ) -> Result<Resolution, DialecticError> {
        let result = self.protocol.finalize(session);
        if let Ok(resolution) = &result {
            let agent_id = session.paused_agent.clone();
            self.apply_resolution(&agent_id, resolution);
        }
        self.store.save(session).await?;
        if let Some(recorder) = recorder {
            report_outcome(session, recorder, now).await?;
        }
        result
    }
}
