//! Engine errors and parse problems.

use std::sync::Arc;

use parlance_syntax::Phrase;

use crate::parse_state::ParseState;

/// Fatal conditions that abort the whole work window.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    #[error("work-unit limit exceeded ({0} units)")]
    WorkFuelExhausted(u64),

    #[error("expression nesting exceeds the recursion limit ({0})")]
    RecursionLimitExceeded(u32),

    #[error("internal parser invariant violated: {0}")]
    Invariant(&'static str),
}

/// Why an outermost statement failed to parse.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ParseProblem {
    /// No interpretation survived. Carries the rightmost position and the
    /// deduplicated expectations there.
    #[error("no viable interpretation at position {position}")]
    NoSolution {
        position: u32,
        expectations: Vec<String>,
    },

    /// At least two interpretations survived; the payload is the smallest
    /// discriminating subtree pair, rendered.
    #[error("ambiguous statement: {first} vs {second}")]
    Ambiguous {
        end_state: ParseState,
        first: String,
        second: String,
    },

    #[error(transparent)]
    Fatal(#[from] EngineError),
}

/// A successfully parsed outermost statement.
#[derive(Debug, Clone)]
pub struct Solution {
    pub end_state: ParseState,
    pub phrase: Arc<Phrase>,
}
