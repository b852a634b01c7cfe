//! The per-agent adaptive threshold controller.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::config::GovernorConfig;
use crate::phase::{PhaseClassifier, TrendPhaseClassifier};
use crate::resonance::{ResonanceBus, ResonanceSignal, SimilarityOracle};
use crate::state::GovernorState;
use crate::types::{CycleOutcome, GovernorInput, Reconfiguration, ResonanceTrigger};
use crate::verdict::{verdict_for, VerdictThresholds};

/// Adaptive governor owning the state of every agent it has seen.
///
/// All mutation goes through `&mut self`, so each agent's state has exactly
/// one logical owner.
pub struct AdaptiveGovernor {
    config: GovernorConfig,
    classifier: Box<dyn PhaseClassifier>,
    agents: HashMap<String, GovernorState>,
}

impl AdaptiveGovernor {
    pub fn new(config: GovernorConfig) -> Self {
        Self {
            config,
            classifier: Box::new(TrendPhaseClassifier::default()),
            agents: HashMap::new(),
        }
    }

    pub fn with_classifier(mut self, classifier: impl PhaseClassifier + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    pub fn set_classifier(&mut self, classifier: Box<dyn PhaseClassifier>) {
        self.classifier = classifier;
    }

    pub fn config(&self) -> &GovernorConfig {
        &self.config
    }

    pub fn state(&self, agent_id: &str) -> Option<&GovernorState> {
        self.agents.get(agent_id)
    }

    pub fn agent_ids(&self) -> impl Iterator<Item = &str> {
        self.agents.keys().map(String::as_str)
    }

    /// Restore previously persisted state for an agent.
    pub fn insert_state(&mut self, state: GovernorState) {
        self.agents.insert(state.agent_id.clone(), state);
    }

    pub fn remove_agent(&mut self, agent_id: &str) -> Option<GovernorState> {
        self.agents.remove(agent_id)
    }

    fn entry(&mut self, agent_id: &str) -> &mut GovernorState {
        let config = &self.config;
        self.agents
            .entry(agent_id.to_string())
            .or_insert_with(|| GovernorState::new(agent_id, config))
    }

    /// Run one governance cycle for `agent_id`.
    pub fn update(&mut self, agent_id: &str, input: &GovernorInput) -> CycleOutcome {
        let config = &self.config;
        let classifier = self.classifier.as_ref();
        let state = self
            .agents
            .entry(agent_id.to_string())
            .or_insert_with(|| GovernorState::new(agent_id, config));
        run_cycle(config, classifier, state, input)
    }

    /// Apply one peer signal to `agent_id`'s neighbor pressure.
    ///
    /// Alerts count only when `similarity` reaches the configured gate;
    /// stability signals only relieve peers that were pressuring. Returns
    /// true when the pressure changed.
    pub fn receive_signal(
        &mut self,
        agent_id: &str,
        signal: &ResonanceSignal,
        similarity: f64,
    ) -> bool {
        let peer = signal.agent_id();
        if peer == agent_id {
            return false;
        }
        let step = self.config.pressure_step;
        let cap = self.config.pressure_max;
        let decay = self.config.pressure_decay;
        let gate = self.config.similarity_gate;
        let state = self.entry(agent_id);

        match signal {
            ResonanceSignal::ResonanceAlert { .. } => {
                if similarity < gate {
                    return false;
                }
                state.pressure.raise(peer, similarity, step, cap);
                debug!(
                    agent_id = %agent_id,
                    peer = %peer,
                    similarity,
                    pressure = state.pressure.value,
                    "Neighbor pressure raised"
                );
                true
            }
            ResonanceSignal::StabilityRestored { .. } => {
                let relieved = state.pressure.relieve(peer, decay);
                if relieved {
                    debug!(
                        agent_id = %agent_id,
                        peer = %peer,
                        pressure = state.pressure.value,
                        "Neighbor pressure decayed"
                    );
                }
                relieved
            }
        }
    }

    /// Pull unseen peer signals from `bus` and apply them.
    ///
    /// Returns the number of signals that changed pressure.
    pub fn absorb_peer_signals(
        &mut self,
        agent_id: &str,
        bus: &dyn ResonanceBus,
        oracle: &dyn SimilarityOracle,
    ) -> usize {
        let watermark = self.entry(agent_id).last_signal_seq;
        let mut newest = watermark;
        let mut applied = 0;

        for envelope in bus
            .recent_peer_signals(agent_id)
            .into_iter()
            .filter(|e| e.seq > watermark)
        {
            let similarity = oracle.similarity(agent_id, envelope.signal.agent_id());
            if self.receive_signal(agent_id, &envelope.signal, similarity) {
                applied += 1;
            }
            newest = newest.max(envelope.seq);
        }

        self.entry(agent_id).last_signal_seq = newest;
        applied
    }

    /// Reset control memory after a recovery and install new thresholds.
    ///
    /// Returns the `(tau, beta)` now in effect.
    pub fn reconfigure(&mut self, agent_id: &str, reconfig: &Reconfiguration) -> (f64, f64) {
        let tau = self
            .config
            .clamp_tau(reconfig.tau.unwrap_or(self.config.tau_default));
        let beta = self
            .config
            .clamp_beta(reconfig.beta.unwrap_or(self.config.beta_default));
        let state = self.entry(agent_id);

        state.reset_control();
        state.tau = tau;
        state.beta = beta;
        if reconfig.reset_pressure {
            state.pressure.clear();
        }

        info!(agent_id = %agent_id, tau, beta, "Governor reconfigured");
        (tau, beta)
    }
}

fn run_cycle(
    config: &GovernorConfig,
    classifier: &dyn PhaseClassifier,
    state: &mut GovernorState,
    input: &GovernorInput,
) -> CycleOutcome {
    let coherence = input.coherence;
    let risk = input.risk;
    state.cycles += 1;

    // Phase from recent history.
    state
        .history
        .push(input.eisv, input.complexity.clamp(0.0, 1.0), config.history_size);
    let phase = classifier.classify(&state.history, state.phase);
    if phase != state.phase {
        debug!(agent_id = %state.agent_id, from = %state.phase, to = %phase, "Phase changed");
    }
    state.phase = phase;

    // PID per threshold, then asymmetric neighbor pressure, then hard bounds.
    let (tau_ref, beta_ref) = config.references(phase);
    let damping = config.derivative_damping(phase);
    let gains = config.gains();
    let tau_adj = state.tau_pid.adjust(tau_ref - coherence, &gains, damping);
    let beta_adj = state.beta_pid.adjust(beta_ref - risk, &gains, damping);
    let pressure = state.pressure.value;
    state.tau = config.clamp_tau(state.tau + tau_adj + pressure);
    state.beta = config.clamp_beta(state.beta + beta_adj - pressure);

    // Oscillation and resonance.
    let reading = state.oscillation.observe(
        coherence,
        state.tau,
        risk,
        state.beta,
        state.last_verdict,
        config.ema_alpha,
        config.window_size,
    );
    state.oscillation_index = reading.index;
    state.flips = reading.flips;

    let trigger = if reading.flips > config.flip_threshold {
        Some(ResonanceTrigger::Flips)
    } else if reading.index.abs() > config.oscillation_threshold {
        Some(ResonanceTrigger::Oscillation)
    } else {
        None
    };
    let was_resonant = state.resonant;
    state.resonant = trigger.is_some();
    state.trigger = trigger;

    // Relax toward the static defaults while stable.
    let decayed = reading.index < config.decay_threshold && reading.flips == 0;
    if decayed {
        state.tau = config.clamp_tau(state.tau + config.decay_rate * (config.tau_default - state.tau));
        state.beta =
            config.clamp_beta(state.beta + config.decay_rate * (config.beta_default - state.beta));
    }

    let verdict = verdict_for(
        coherence,
        risk,
        &VerdictThresholds::from_config(config, state.tau, state.beta),
    );
    if state.last_verdict != Some(verdict) {
        info!(
            agent_id = %state.agent_id,
            verdict = %verdict,
            coherence,
            risk,
            tau = state.tau,
            beta = state.beta,
            "Verdict changed"
        );
    }
    state.last_verdict = Some(verdict);

    debug!(
        agent_id = %state.agent_id,
        cycle = state.cycles,
        phase = %phase,
        tau = state.tau,
        beta = state.beta,
        oscillation_index = reading.index,
        flips = reading.flips,
        pressure,
        "Governor cycle"
    );

    let signal = match (was_resonant, state.resonant) {
        (false, true) => {
            warn!(
                agent_id = %state.agent_id,
                trigger = ?state.trigger,
                oscillation_index = reading.index,
                flips = reading.flips,
                "Agent entered resonance"
            );
            Some(ResonanceSignal::ResonanceAlert {
                agent_id: state.agent_id.clone(),
                oscillation_index: reading.index,
                phase,
                tau: state.tau,
                beta: state.beta,
                flips: reading.flips,
            })
        }
        (true, false) => {
            info!(
                agent_id = %state.agent_id,
                oscillation_index = reading.index,
                "Agent stability restored"
            );
            Some(ResonanceSignal::StabilityRestored {
                agent_id: state.agent_id.clone(),
                oscillation_index: reading.index,
                tau: state.tau,
                beta: state.beta,
            })
        }
        _ => None,
    };

    CycleOutcome {
        agent_id: state.agent_id.clone(),
        verdict,
        tau: state.tau,
        beta: state.beta,
        phase,
        oscillation_index: reading.index,
        flips: reading.flips,
        resonant: state.resonant,
        trigger: state.trigger,
        neighbor_pressure: state.pressure.value,
        decayed,
        signal,
    }
}
