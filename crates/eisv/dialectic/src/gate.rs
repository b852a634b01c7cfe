//! Hard-limit safety gate applied before any resolution is finalized.
//!
//! Independent of the similarity heuristics: a resolution both sides agree
//! on is still rejected if it weakens governance, names an out-of-range
//! threshold, or is too vague to act on.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const WEAKENING: &str = "disables governance or safety controls";

/// Patterns that may never appear in resolution conditions.
const DENY_PATTERNS: &[(&str, &str)] = &[
    (
        WEAKENING,
        r"(?i)\b(disabl\w*|deactivat\w*|turn(?:s|ed|ing)?\s+off|shut(?:s|ting)?\s+down|suspend\w*|stop\w*|paus\w*|halt\w*)\b.{0,40}\b(governance|safety|monitoring|circuit[\s_-]*breakers?)\b",
    ),
    (
        WEAKENING,
        r"(?i)\b(governance|safety|monitoring|circuit[\s_-]*breakers?)\b.{0,40}\b(disabl\w*|deactivat\w*|off|suspend\w*|stop\w*|paus\w*|halt\w*)\b",
    ),
    (
        "skips or ignores checks",
        r"(?i)\b(skip|skipping|ignore|ignoring|bypass|bypassing)\b.{0,40}\b(checks?|validations?|verifications?|reviews?|guards?)\b",
    ),
    (
        "removes limits",
        r"(?i)\b(remove|removing|lift|eliminate|drop)\b.{0,30}\b(limits?|limitations?|caps?|bounds?)\b",
    ),
];

// The value keeps its sign so negative thresholds fail the bounds check.
const RISK_THRESHOLD_PATTERN: &str =
    r"(?i)\brisk[\s_-]*threshold[^0-9.-]{0,20}(-?(?:\d+(?:\.\d+)?|\.\d+))\s*(%)?";
const COHERENCE_THRESHOLD_PATTERN: &str =
    r"(?i)\bcoherence[\s_-]*threshold[^0-9.-]{0,20}(-?(?:\d+(?:\.\d+)?|\.\d+))\s*(%)?";

pub const RISK_THRESHOLD_BOUNDS: (f64, f64) = (0.0, 0.90);
pub const COHERENCE_THRESHOLD_BOUNDS: (f64, f64) = (0.1, 1.0);
pub const MIN_ROOT_CAUSE_CHARS: usize = 10;

static DENY: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    DENY_PATTERNS
        .iter()
        .map(|(reason, p)| (*reason, Regex::new(p).expect("valid deny regex")))
        .collect()
});
static HEDGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(maybe|perhaps|try|consider)\b").expect("valid hedge regex")
});
static RISK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(RISK_THRESHOLD_PATTERN).expect("valid risk threshold regex"));
static COHERENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(COHERENCE_THRESHOLD_PATTERN).expect("valid coherence threshold regex")
});

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdKind {
    /// Maps to the governor's beta.
    Risk,
    /// Maps to the governor's tau.
    Coherence,
}

impl std::fmt::Display for ThresholdKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Risk => f.write_str("risk threshold"),
            Self::Coherence => f.write_str("coherence threshold"),
        }
    }
}

/// A numeric threshold named inside a condition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThresholdMention {
    pub kind: ThresholdKind,
    pub value: f64,
    /// Index of the condition the mention came from.
    pub condition: usize,
}

/// Find every risk and coherence threshold value named in `conditions`.
///
/// Percentages are converted to fractions. Mentions are returned in
/// condition order.
pub fn extract_threshold_mentions(conditions: &[String]) -> Vec<ThresholdMention> {
    let mut mentions = Vec::new();
    for (index, condition) in conditions.iter().enumerate() {
        for (kind, re) in [
            (ThresholdKind::Risk, &*RISK_RE),
            (ThresholdKind::Coherence, &*COHERENCE_RE),
        ] {
            for caps in re.captures_iter(condition) {
                let Some(value) = caps.get(1).and_then(|m| m.as_str().parse::<f64>().ok()) else {
                    continue;
                };
                let value = if caps.get(2).is_some() { value / 100.0 } else { value };
                mentions.push(ThresholdMention {
                    kind,
                    value,
                    condition: index,
                });
            }
        }
    }
    mentions
}

/// Why the gate refused a resolution.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum GateViolation {
    #[error("resolution has no conditions")]
    EmptyConditions,

    #[error("condition {condition:?} {reason}")]
    Forbidden {
        condition: String,
        reason: &'static str,
    },

    #[error("condition {condition:?} is hedged, conditions must be definite")]
    Hedged { condition: String },

    #[error("{kind} {value} outside [{min}, {max}]")]
    ThresholdOutOfBounds {
        kind: ThresholdKind,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("root cause must be at least {min} characters, got {len}")]
    RootCauseTooShort { len: usize, min: usize },
}

/// Check merged conditions and root cause against the hard limits.
///
/// Returns the first violation found.
pub fn check_hard_limits(conditions: &[String], root_cause: &str) -> Result<(), GateViolation> {
    if conditions.iter().all(|c| c.trim().is_empty()) {
        return Err(GateViolation::EmptyConditions);
    }

    for condition in conditions {
        if let Some((reason, _)) = DENY.iter().find(|(_, re)| re.is_match(condition)) {
            return Err(GateViolation::Forbidden {
                condition: condition.clone(),
                reason: *reason,
            });
        }
        if HEDGE_RE.is_match(condition) {
            return Err(GateViolation::Hedged {
                condition: condition.clone(),
            });
        }
    }

    for mention in extract_threshold_mentions(conditions) {
        let (min, max) = match mention.kind {
            ThresholdKind::Risk => RISK_THRESHOLD_BOUNDS,
            ThresholdKind::Coherence => COHERENCE_THRESHOLD_BOUNDS,
        };
        if mention.value < min || mention.value > max {
            return Err(GateViolation::ThresholdOutOfBounds {
                kind: mention.kind,
                value: mention.value,
                min,
                max,
            });
        }
    }

    let len = root_cause.trim().chars().count();
    if len < MIN_ROOT_CAUSE_CHARS {
        return Err(GateViolation::RootCauseTooShort {
            len,
            min: MIN_ROOT_CAUSE_CHARS,
        });
    }

    Ok(())
}
