#![deny(unsafe_code)]
//! EISV demo binary.
//!
//! Runs a small simulated fleet through the governance core:
//! 1. configuration and core setup
//! 2. governed cycles (steady, oscillating and runaway-risk agents)
//! 3. a dialectic recovery session for the hard-blocked agent
//! 4. resumed cycles under the reconfigured thresholds
//!
//! Sessions are persisted as JSON under `--data-dir`.

mod workload;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use clap::Parser;
use eisv_core::{CycleReport, GovernanceConfig, GovernanceCore};
use eisv_dialectic::{
    AgentRecord, AgentStatus, DialecticSession, InMemoryCalibrationRecorder, InMemoryKeyRing,
    JsonFileSessionStore, MessagePayload, SessionPhase, SessionStore,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use workload::{SimulatedWorkload, WorkloadProfile};

/// Simulated fleet run through the EISV governance core
#[derive(Parser, Debug)]
#[command(name = "eisv-demo")]
#[command(version)]
struct Args {
    /// Governance configuration file (defaults apply when missing)
    #[arg(short, long, env = "EISV_CONFIG", default_value = "eisv.toml")]
    config: PathBuf,

    /// Governed cycles before recovery
    #[arg(long, default_value_t = 24)]
    cycles: usize,

    /// Cycles run after a successful recovery
    #[arg(long, default_value_t = 8)]
    resume_cycles: usize,

    /// Seed for workload jitter and reviewer selection
    #[arg(long, default_value_t = 7)]
    seed: u64,

    /// Directory for persisted dialectic sessions
    #[arg(long, env = "EISV_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

const FLEET: [(&str, WorkloadProfile); 4] = [
    ("alpha", WorkloadProfile::Steady),
    ("bravo", WorkloadProfile::Oscillating),
    ("charlie", WorkloadProfile::RunawayRisk),
    ("delta", WorkloadProfile::Steady),
];

// ── Formatting Helpers ──────────────────────────────────────────────────

const BANNER: &str = r#"
 ╔═══════════════════════════════════════════════════════════════╗
 ║             EISV Governance Core  --  Demo                   ║
 ║                                                              ║
 ║   Coupled state dynamics, adaptive thresholds and            ║
 ║   signed dialectic recovery for an agent fleet.              ║
 ╚═══════════════════════════════════════════════════════════════╝
"#;

fn section(title: &str) {
    let width: usize = 60;
    let pad = width.saturating_sub(title.len() + 4);
    let left = pad / 2;
    let right = pad - left;
    println!();
    println!(" ┌{}┐", "─".repeat(width));
    println!(" │{}  {}  {}│", " ".repeat(left), title, " ".repeat(right));
    println!(" └{}┘", "─".repeat(width));
}

fn ok(msg: &str) {
    println!("   [OK]  {}", msg);
}

fn info(msg: &str) {
    println!("   [--]  {}", msg);
}

fn warn(msg: &str) {
    println!("   [!!]  {}", msg);
}

fn print_report(cycle: usize, report: &CycleReport) {
    let line = format!(
        "#{:<3} {:<8} E={:.2} I={:.2} S={:.2} V={:+.2}  C={:.2}  {:<10} tau={:.3} beta={:.3}  OI={:.2} flips={}",
        cycle,
        report.agent_id,
        report.state.e,
        report.state.i,
        report.state.s,
        report.state.v,
        report.coherence,
        report.verdict.to_string(),
        report.tau,
        report.beta,
        report.oscillation_index,
        report.flips,
    );
    if report.recovery_required {
        warn(&line);
    } else {
        info(&line);
    }
    if let Some(signal) = &report.signal {
        if signal.is_alert() {
            warn(&format!("      resonance alert from {}", signal.agent_id()));
        } else {
            ok(&format!("      {} restored stability", signal.agent_id()));
        }
    }
}

// ── Main ────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    println!("{}", BANNER);

    if let Err(e) = run_demo(args).await {
        eprintln!();
        eprintln!("   [FATAL]  Demo failed: {:#}", e);
        std::process::exit(1);
    }

    println!();
    println!(" ════════════════════════════════════════════════════════════════");
    println!("  Demo complete.");
    println!(" ════════════════════════════════════════════════════════════════");
    println!();
}

async fn run_demo(args: Args) -> anyhow::Result<()> {
    // ── Phase A: Setup ──────────────────────────────────────────────
    section("Phase A: Configuration");

    let config = GovernanceConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    info(&format!(
        "profile={}  tau_default={:.2}  beta_default={:.2}  max_rounds={}",
        config.profile,
        config.governor.tau_default,
        config.governor.beta_default,
        config.dialectic.max_synthesis_rounds
    ));

    let mut keys = InMemoryKeyRing::new();
    for (id, _) in FLEET {
        keys.insert(id, format!("eisv-demo-{}-{}", id, args.seed).into_bytes());
    }

    let data_dir = args
        .data_dir
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("eisv-demo"));
    let store: Arc<dyn SessionStore> = Arc::new(JsonFileSessionStore::new(&data_dir));
    let mut core = GovernanceCore::new(config, Arc::new(keys), store)?;
    ok(&format!(
        "Governance core online  damping={}  sessions={}",
        core.params().damping,
        data_dir.display()
    ));

    let mut rng = StdRng::seed_from_u64(args.seed);
    let clock = Utc::now();
    let mut statuses: BTreeMap<String, AgentRecord> = FLEET
        .iter()
        .map(|(id, _)| (id.to_string(), AgentRecord::active()))
        .collect();

    // ── Phase B: Governed Cycles ────────────────────────────────────
    section(&format!("Phase B: Governed Cycles  ({})", args.cycles));

    let mut blocked: Option<(String, CycleReport, f64)> = None;
    for n in 0..args.cycles {
        for (id, profile) in FLEET {
            if statuses.get(id).map(|r| r.status) != Some(AgentStatus::Active) {
                continue;
            }
            let cycle = SimulatedWorkload::cycle(profile, n, &mut rng);
            let report = core.process_cycle(id, &cycle);
            if report.signal.is_some() || report.recovery_required || n % 6 == 0 {
                print_report(n, &report);
            }
            if report.recovery_required {
                statuses.insert(id.to_string(), AgentRecord::with_status(AgentStatus::Paused));
                if blocked.is_none() {
                    blocked = Some((id.to_string(), report, cycle.risk));
                }
            }
        }
    }

    for (id, profile) in FLEET {
        if let Some(state) = core.governor_state(id) {
            info(&format!(
                "{:<8} {:<13} tau={:.3} beta={:.3} resonant={} pressure={:.3}",
                id,
                profile.to_string(),
                state.tau,
                state.beta,
                state.resonant,
                state.pressure.value
            ));
        }
    }

    let Some((paused, report, risk)) = blocked else {
        warn("No agent reached a hard block; skipping recovery");
        return Ok(());
    };

    // ── Phase C: Dialectic Recovery ─────────────────────────────────
    section(&format!("Phase C: Recovery of {}", paused));

    let registry = core.registry();
    let mut session = core
        .open_recovery(&paused, &statuses, &[], &registry, &mut rng, at(clock, 0))
        .await?;
    if session.is_self_review() {
        warn("No eligible reviewer, falling back to self-review");
    }
    ok(&format!(
        "Session {} opened  reviewer={}",
        session.id, session.reviewer
    ));

    run_dialectic(&core, &mut session, &report, risk, clock)?;
    ok(&format!(
        "Session reached {} after {} synthesis round(s)",
        session.phase, session.synthesis_round
    ));

    let recorder = InMemoryCalibrationRecorder::new();
    let resolution = core
        .conclude(&mut session, Some(&recorder), at(clock, 10))
        .await?;
    ok(&format!(
        "Resolution {}  hash={}",
        resolution.action, resolution.content_hash
    ));
    for condition in &resolution.conditions {
        info(&format!("  condition: {}", condition));
    }
    for calibration in recorder.reports()? {
        info(&format!(
            "Calibration  session={}  resumed={}",
            calibration.session_id,
            calibration.resumed()
        ));
    }
    info(&format!(
        "Resolution JSON: {}",
        serde_json::to_string(&resolution)?
    ));

    // ── Phase D: Resumed Operation ──────────────────────────────────
    section(&format!("Phase D: {} Resumed", paused));

    statuses.insert(paused.clone(), AgentRecord::active());
    for n in 0..args.resume_cycles {
        let cycle = SimulatedWorkload::cycle(WorkloadProfile::Steady, n, &mut rng);
        let report = core.process_cycle(&paused, &cycle);
        print_report(n, &report);
    }

    let persisted = core.store().list_all().await?;
    ok(&format!(
        "{} session(s) persisted, {} active",
        persisted.len(),
        core.store().list_active().await?.len()
    ));

    Ok(())
}

fn at(clock: DateTime<Utc>, minutes: i64) -> DateTime<Utc> {
    clock + Duration::minutes(minutes)
}

/// Scripted thesis, antithesis and two agreeing syntheses.
fn run_dialectic(
    core: &GovernanceCore,
    session: &mut DialecticSession,
    report: &CycleReport,
    risk: f64,
    clock: DateTime<Utc>,
) -> anyhow::Result<()> {
    let protocol = core.protocol();
    let paused = session.paused_agent.clone();
    let reviewer = session.reviewer.clone();
    let root_cause = "Risk estimate climbed past the hard ceiling as task complexity grew";
    let conditions = vec![
        "Set risk threshold to 0.50".to_string(),
        "Cap task complexity at 0.3 for the next 20 cycles".to_string(),
    ];

    let thesis = MessagePayload::Thesis {
        root_cause: root_cause.to_string(),
        proposed_conditions: conditions.clone(),
        reasoning: "Drift and complexity compounded; a tighter risk ceiling limits exposure."
            .to_string(),
    };
    let message = protocol.sign(session, &paused, thesis, at(clock, 1))?;
    protocol.submit_thesis(session, message)?;
    info(&format!("{} submitted thesis", paused));

    let antithesis = MessagePayload::Antithesis {
        observed_metrics: BTreeMap::from([
            ("risk".to_string(), risk),
            ("coherence".to_string(), report.coherence),
            ("integrity".to_string(), report.state.i),
        ]),
        concerns: vec!["Complexity kept rising after the caution verdicts".to_string()],
        reasoning: "The governor flagged the trend before the hard block.".to_string(),
    };
    let message = protocol.sign(session, &reviewer, antithesis, at(clock, 2))?;
    protocol.submit_antithesis(session, message)?;
    info(&format!("{} submitted antithesis", reviewer));

    for (offset, sender) in [(3, &paused), (4, &reviewer)] {
        let synthesis = MessagePayload::Synthesis {
            root_cause: root_cause.to_string(),
            proposed_conditions: conditions.clone(),
            reasoning: "Both sides accept the tighter ceiling.".to_string(),
            agrees: true,
        };
        let message = protocol.sign(session, sender, synthesis, at(clock, offset))?;
        let phase = protocol.submit_synthesis(session, message)?;
        info(&format!("{} submitted synthesis  phase={}", sender, phase));
        if phase == SessionPhase::Resolved {
            break;
        }
    }
    Ok(())
}
