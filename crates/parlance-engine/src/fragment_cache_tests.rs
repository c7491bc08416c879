//! Tests for the fragment cache.

use std::sync::Arc;

use parlance_syntax::{Phrase, Value};

use super::engine::SolutionAction;
use super::fragment_cache::{FragmentCache, Registration};
use super::parse_state::ParseState;
use super::scope::ScopeMap;

fn state(position: u32) -> ParseState {
    ParseState::new(position, ScopeMap::empty())
}

fn noop_action() -> SolutionAction {
    Arc::new(|_, _, _| {})
}

fn literal(n: i64) -> Arc<Phrase> {
    Arc::new(Phrase::synthetic_literal(Value::Integer(n), 0, 1))
}

#[test]
fn first_registration_starts_the_parse() {
    let cache = FragmentCache::new();
    assert!(matches!(
        cache.register_action(&state(0), noop_action()),
        Registration::First
    ));
    assert!(matches!(
        cache.register_action(&state(0), noop_action()),
        Registration::Replay(ref solutions) if solutions.is_empty()
    ));
}

#[test]
fn new_actions_replay_existing_solutions() {
    let cache = FragmentCache::new();
    let origin = state(0);
    let _ = cache.register_action(&origin, noop_action());
    cache.add_solution(&origin, &state(3), &literal(7));

    match cache.register_action(&origin, noop_action()) {
        Registration::Replay(solutions) => {
            assert_eq!(solutions.len(), 1);
            assert_eq!(solutions[0].0.position, 3);
        }
        Registration::First => panic!("entry should already exist"),
    }
}

#[test]
fn new_solutions_fan_out_to_all_actions() {
    let cache = FragmentCache::new();
    let origin = state(0);
    let _ = cache.register_action(&origin, noop_action());
    let _ = cache.register_action(&origin, noop_action());
    let actions = cache.add_solution(&origin, &state(2), &literal(1));
    assert_eq!(actions.len(), 2);
}

#[test]
fn duplicate_solutions_are_suppressed() {
    let cache = FragmentCache::new();
    let origin = state(0);
    let _ = cache.register_action(&origin, noop_action());
    let first = cache.add_solution(&origin, &state(2), &literal(1));
    assert_eq!(first.len(), 1);
    let second = cache.add_solution(&origin, &state(2), &literal(1));
    assert!(second.is_empty());
    // A structurally different phrase at the same end state is new.
    let third = cache.add_solution(&origin, &state(2), &literal(2));
    assert_eq!(third.len(), 1);
}

#[test]
fn distinct_states_have_distinct_entries() {
    let cache = FragmentCache::new();
    let _ = cache.register_action(&state(0), noop_action());
    let _ = cache.register_action(&state(5), noop_action());
    assert_eq!(cache.len(), 2);
    cache.clear();
    assert!(cache.is_empty());
}
