//! The parlance parsing engine.
//!
//! All visible message names compile to small parsing programs; this crate
//! merges them into a lazily expanded bundle trie and explores every
//! interpretation of the token stream simultaneously, as cooperatively
//! scheduled work units. Expression parses are memoized per state, a
//! single outermost interpretation is demanded per statement, and
//! user-supplied semantic restrictions and macros run at parse time.
//!
//! - `scope` / `parse_state` - immutable scope chains and parse states
//! - `method` / `bundle` / `runtime` - the registry mutated transactionally
//! - `bundle_tree` - the prefix-merged trie over parsing programs
//! - `fragment_cache` - per-state memoization of expression parses
//! - `work` - the work-unit executor and quiescence accounting
//! - `expectations` - rightmost-failure bookkeeping
//! - `engine` / `send` / `ambiguity` - the parser itself
//! - `interpreter` - collaborator seams for evaluation and code generation

pub mod ambiguity;
pub mod bundle;
pub mod bundle_tree;
pub mod engine;
pub mod error;
pub mod expectations;
pub mod fragment_cache;
pub mod interpreter;
pub mod method;
pub mod parse_state;
pub mod runtime;
pub mod scope;
pub mod send;
pub mod tracer;
pub mod work;

#[cfg(test)]
mod bundle_tree_tests;
#[cfg(test)]
mod engine_tests;
#[cfg(test)]
mod expectations_tests;
#[cfg(test)]
mod fragment_cache_tests;
#[cfg(test)]
mod work_tests;

pub use ambiguity::discriminate;
pub use bundle::{Bundle, PlanInProgress};
pub use bundle_tree::BundleTree;
pub use engine::{Engine, EngineConfig, SolutionAction};
pub use error::{EngineError, ParseProblem, Solution};
pub use expectations::{Describer, ExpectationSink};
pub use fragment_cache::FragmentCache;
pub use interpreter::{CodeGenError, CodeGenerator, Interpreter, RunError};
pub use method::{
    Definition, DefinitionBody, MacroDefinition, Method, SemanticRestriction,
};
pub use parse_state::ParseState;
pub use runtime::{ModuleRecord, Runtime, Transaction};
pub use scope::ScopeMap;
pub use tracer::{NoopTracer, PrintTracer, Tracer};
pub use work::{EngineLimits, Workshop};
