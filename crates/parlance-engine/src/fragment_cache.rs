//! Memoization of expression parses.
//!
//! Parsing an expression at a state is done at most once; every later
//! attempt that reaches the same state registers an action and has the
//! already-found solutions replayed into it. New solutions fan out to all
//! registered actions. Each (solution, action) pair fires exactly once,
//! and duplicate solutions are suppressed by structural equality.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use parlance_syntax::Phrase;

use crate::engine::SolutionAction;
use crate::parse_state::ParseState;

#[derive(Default)]
struct FragmentEntry {
    solutions: Vec<(ParseState, Arc<Phrase>)>,
    actions: Vec<SolutionAction>,
}

/// What registering an action found.
pub enum Registration {
    /// This state has never been parsed; the caller must start the
    /// uncached parse exactly once.
    First,
    /// Already started; these existing solutions must be replayed into
    /// the new action.
    Replay(Vec<(ParseState, Arc<Phrase>)>),
}

/// The per-compilation memo of expression parses.
#[derive(Default)]
pub struct FragmentCache {
    map: Mutex<HashMap<ParseState, FragmentEntry>>,
}

impl FragmentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an action for the solutions at `state`.
    pub fn register_action(&self, state: &ParseState, action: SolutionAction) -> Registration {
        let mut map = self.map.lock().expect("fragment cache poisoned");
        match map.get_mut(state) {
            Some(entry) => {
                let replay = entry.solutions.clone();
                entry.actions.push(action);
                Registration::Replay(replay)
            }
            None => {
                map.insert(
                    state.clone(),
                    FragmentEntry {
                        solutions: Vec::new(),
                        actions: vec![action],
                    },
                );
                Registration::First
            }
        }
    }

    /// Record a solution; returns the actions to fire with it, or nothing
    /// when the identical (end state, phrase) pair was already recorded.
    pub fn add_solution(
        &self,
        state: &ParseState,
        end_state: &ParseState,
        phrase: &Arc<Phrase>,
    ) -> Vec<SolutionAction> {
        let mut map = self.map.lock().expect("fragment cache poisoned");
        let entry = map.entry(state.clone()).or_default();
        let duplicate = entry
            .solutions
            .iter()
            .any(|(s, p)| s == end_state && p == phrase);
        if duplicate {
            return Vec::new();
        }
        entry
            .solutions
            .push((end_state.clone(), Arc::clone(phrase)));
        entry.actions.clone()
    }

    /// Number of states with cache entries.
    pub fn len(&self) -> usize {
        self.map.lock().expect("fragment cache poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget everything; called between top-level statements, whose
    /// execution may have changed the visible grammar.
    pub fn clear(&self) {
        self.map.lock().expect("fragment cache poisoned").clear();
    }
}
