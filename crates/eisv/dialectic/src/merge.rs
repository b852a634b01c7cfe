//! Merging two converged proposals into one resolution body.

use std::collections::BTreeSet;

use crate::convergence::{normalize_condition, tokens};
use crate::message::Proposal;

const ANTONYMS: &[(&str, &str)] = &[
    ("increase", "decrease"),
    ("enable", "disable"),
    ("raise", "lower"),
    ("higher", "lower"),
    ("more", "less"),
    ("add", "remove"),
    ("allow", "deny"),
    ("allow", "block"),
    ("start", "stop"),
    ("expand", "reduce"),
    ("tighten", "loosen"),
];

fn is_number(token: &str) -> bool {
    token.parse::<f64>().is_ok()
}

fn split_numeric(t: &BTreeSet<String>) -> (BTreeSet<&str>, BTreeSet<&str>) {
    let (numbers, words): (Vec<&str>, Vec<&str>) =
        t.iter().map(String::as_str).partition(|s| is_number(s));
    (words.into_iter().collect(), numbers.into_iter().collect())
}

/// Two conditions contradict each other.
///
/// Either they use an antonym pair while sharing some other term, or they
/// name the same non-numeric terms with different numbers.
pub fn conflicts(a: &str, b: &str) -> bool {
    let ta = tokens(a);
    let tb = tokens(b);

    let antonym = ANTONYMS.iter().any(|(x, y)| {
        let (x, y) = (x.to_string(), y.to_string());
        (ta.contains(&x) && tb.contains(&y)) || (ta.contains(&y) && tb.contains(&x))
    });
    if antonym {
        let is_antonym =
            |t: &&String| ANTONYMS.iter().any(|(x, y)| t.as_str() == *x || t.as_str() == *y);
        let shared_subject = ta.intersection(&tb).filter(|t| !is_antonym(t)).count() > 0;
        if shared_subject {
            return true;
        }
    }

    let (words_a, numbers_a) = split_numeric(&ta);
    let (words_b, numbers_b) = split_numeric(&tb);
    !words_a.is_empty()
        && words_a == words_b
        && !numbers_a.is_empty()
        && !numbers_b.is_empty()
        && numbers_a != numbers_b
}

/// Intersection of both lists (in `primary` order and wording), then any
/// remaining condition from either side that conflicts with nothing
/// already merged. Duplicates by normalized form are dropped.
pub fn merge_conditions(primary: &[String], secondary: &[String]) -> Vec<String> {
    let secondary_keys: BTreeSet<String> =
        secondary.iter().map(|c| normalize_condition(c)).collect();
    let mut merged: Vec<String> = Vec::new();
    let mut keys: BTreeSet<String> = BTreeSet::new();

    for condition in primary {
        let key = normalize_condition(condition);
        if secondary_keys.contains(&key) && keys.insert(key) {
            merged.push(condition.clone());
        }
    }

    for condition in primary.iter().chain(secondary) {
        let key = normalize_condition(condition);
        if key.is_empty() || keys.contains(&key) {
            continue;
        }
        if merged.iter().any(|m| conflicts(m, condition)) {
            continue;
        }
        keys.insert(key);
        merged.push(condition.clone());
    }

    merged
}

pub fn merge_root_cause(agent: &str, reviewer: &str) -> String {
    if agent.trim() == reviewer.trim() {
        agent.trim().to_string()
    } else {
        format!("Agent: {} | Reviewer: {}", agent.trim(), reviewer.trim())
    }
}

pub fn merge_reasoning(agent: &str, reviewer: &str) -> String {
    match (agent.trim().is_empty(), reviewer.trim().is_empty()) {
        (true, true) => String::new(),
        (false, true) => agent.trim().to_string(),
        (true, false) => reviewer.trim().to_string(),
        (false, false) => format!("{}\n\n{}", agent.trim(), reviewer.trim()),
    }
}

/// Merge the paused agent's and the reviewer's final proposals.
pub fn merge_proposals(agent: &Proposal, reviewer: &Proposal) -> Proposal {
    Proposal {
        root_cause: merge_root_cause(&agent.root_cause, &reviewer.root_cause),
        conditions: merge_conditions(&agent.conditions, &reviewer.conditions),
        reasoning: merge_reasoning(&agent.reasoning, &reviewer.reasoning),
    }
}
