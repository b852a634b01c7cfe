//! Property tests: sessions only resolve on two distinct agreeing syntheses,
//! and merging identical condition sets is idempotent.

use std::collections::BTreeSet;

use eisv_dialectic::{merge_conditions, normalize_condition, DialecticConfig, SessionPhase};
use eisv_tests::{protocol, session_in_synthesis, submit, synthesis};
use proptest::prelude::*;

const ROOT_CAUSE: &str = "Risk threshold exceeded";
const CONDITION: &str = "Monitor risk for 24 hours";

fn arb_condition() -> impl Strategy<Value = String> {
    ("[a-z]{4,9}", "[a-z]{4,9}", 1u32..100).prop_map(|(verb, noun, n)| format!("{verb} {noun} {n}"))
}

/// Conditions with pairwise distinct normalized forms.
fn distinct(conditions: Vec<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    conditions
        .into_iter()
        .filter(|c| seen.insert(normalize_condition(c)))
        .collect()
}

proptest! {
    /// Only one side ever agrees: the session must never resolve.
    #[test]
    fn single_agreeing_side_never_resolves(
        agreeing_is_agent in any::<bool>(),
        turns in prop::collection::vec(any::<bool>(), 1..12),
    ) {
        let p = protocol(DialecticConfig::default());
        let mut session = session_in_synthesis(&p, ROOT_CAUSE, &[CONDITION]).unwrap();
        let agreeing = if agreeing_is_agent { "a1" } else { "b1" };

        for (n, agent_turn) in turns.into_iter().enumerate() {
            let sender = if agent_turn { "a1" } else { "b1" };
            let agrees = sender == agreeing;
            let result = submit(
                &p,
                &mut session,
                sender,
                synthesis(ROOT_CAUSE, &[CONDITION], agrees),
                10 + n as i64,
            );
            if result.is_err() {
                break;
            }
            prop_assert_ne!(session.phase, SessionPhase::Resolved);
        }
        prop_assert_ne!(session.phase, SessionPhase::Resolved);
        prop_assert!(session.resolution.is_none());
    }

    /// One participant repeating an agreeing synthesis is not a second
    /// distinct agreement.
    #[test]
    fn repeated_agreement_from_one_side_never_resolves(rounds in 1usize..8) {
        let p = protocol(DialecticConfig::default());
        let mut session = session_in_synthesis(&p, ROOT_CAUSE, &[CONDITION]).unwrap();
        for n in 0..rounds {
            if submit(&p, &mut session, "a1", synthesis(ROOT_CAUSE, &[CONDITION], true), 10 + n as i64).is_err() {
                break;
            }
        }
        prop_assert_ne!(session.phase, SessionPhase::Resolved);
    }

    #[test]
    fn merging_identical_sets_is_idempotent(
        conditions in prop::collection::vec(arb_condition(), 1..8),
    ) {
        let conditions = distinct(conditions);
        let merged = merge_conditions(&conditions, &conditions);
        prop_assert_eq!(merged, conditions);
    }

    #[test]
    fn merge_never_duplicates(
        a in prop::collection::vec(arb_condition(), 0..6),
        b in prop::collection::vec(arb_condition(), 0..6),
    ) {
        let merged = merge_conditions(&a, &b);
        let keys: BTreeSet<String> = merged.iter().map(|c| normalize_condition(c)).collect();
        prop_assert_eq!(keys.len(), merged.len());
    }
}
