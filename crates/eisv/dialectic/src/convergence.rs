//! Token-overlap convergence between two proposals.
//!
//! Conditions are normalized (parenthetical asides, filler words and
//! punctuation removed, tokens sorted) and compared pairwise with Jaccard
//! similarity. The matcher is a heuristic; the hard-limit gate is what
//! actually blocks unsafe resolutions.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::message::Proposal;

const FILLER_WORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "of", "for", "to", "in", "on", "at", "by", "with", "be", "is",
    "are", "will", "should", "must", "shall", "we", "i", "it", "its", "please", "just", "then",
    "that", "this", "all",
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvergenceConfig {
    /// Minimum Jaccard similarity for two conditions to count as a match.
    pub pair_threshold: f64,
    /// Fraction of all conditions that must have a matching partner.
    pub coverage_threshold: f64,
    /// Minimum word overlap between root causes.
    pub root_cause_threshold: f64,
    /// Condition coverage at which root-cause disagreement is waived.
    pub root_cause_waiver: f64,
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            pair_threshold: 0.6,
            coverage_threshold: 0.5,
            root_cause_threshold: 0.2,
            root_cause_waiver: 0.6,
        }
    }
}

fn strip_parentheticals(text: &str) -> String {
    let mut depth = 0usize;
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '(' => depth += 1,
            ')' if depth > 0 => depth -= 1,
            _ if depth == 0 => out.push(ch),
            _ => {}
        }
    }
    out
}

/// Lowercased content tokens with asides, filler words and punctuation
/// removed. Decimal points inside numbers survive.
pub fn tokens(text: &str) -> BTreeSet<String> {
    let cleaned: String = strip_parentheticals(&text.to_lowercase())
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '.' { c } else { ' ' })
        .collect();
    cleaned
        .split_whitespace()
        .map(|t| t.trim_matches('.'))
        .filter(|t| !t.is_empty() && !FILLER_WORDS.contains(t))
        .map(str::to_string)
        .collect()
}

/// Canonical form of a condition: sorted, deduplicated tokens.
pub fn normalize_condition(text: &str) -> String {
    tokens(text).into_iter().collect::<Vec<_>>().join(" ")
}

pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let shared = a.intersection(b).count() as f64;
    let union = a.union(b).count() as f64;
    shared / union
}

/// Result of comparing two proposals.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceReport {
    /// Fraction of normalized conditions (both sides) with a partner.
    pub match_ratio: f64,
    pub root_cause_overlap: f64,
    pub root_cause_agreed: bool,
    pub converged: bool,
}

fn distinct_condition_tokens(conditions: &[String]) -> Vec<BTreeSet<String>> {
    let mut seen = BTreeSet::new();
    conditions
        .iter()
        .map(|c| tokens(c))
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .collect()
}

fn matched(side: &[BTreeSet<String>], other: &[BTreeSet<String>], threshold: f64) -> usize {
    side.iter()
        .filter(|a| other.iter().any(|b| jaccard(a, b) >= threshold))
        .count()
}

/// Compare two proposals. Proposals without any usable condition never
/// converge.
pub fn evaluate(a: &Proposal, b: &Proposal, config: &ConvergenceConfig) -> ConvergenceReport {
    let ta = distinct_condition_tokens(&a.conditions);
    let tb = distinct_condition_tokens(&b.conditions);
    let total = ta.len() + tb.len();

    let match_ratio = if ta.is_empty() || tb.is_empty() {
        0.0
    } else {
        let hits = matched(&ta, &tb, config.pair_threshold) + matched(&tb, &ta, config.pair_threshold);
        hits as f64 / total as f64
    };

    let root_cause_overlap = jaccard(&tokens(&a.root_cause), &tokens(&b.root_cause));
    let root_cause_agreed = root_cause_overlap >= config.root_cause_threshold
        || match_ratio >= config.root_cause_waiver;

    ConvergenceReport {
        match_ratio,
        root_cause_overlap,
        root_cause_agreed,
        converged: match_ratio >= config.coverage_threshold && root_cause_agreed,
    }
}
