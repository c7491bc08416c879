//! The immutable parse state.

use std::sync::Arc;

use parlance_syntax::{Declaration, Phrase};

use crate::scope::ScopeMap;

/// Where a parse attempt stands: a source position, the declarations in
/// scope there, and the innermost block's argument snapshot. Immutable;
/// equality over all three fields drives the fragment cache.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct ParseState {
    /// Code-point offset of the next token to consider.
    pub position: u32,
    pub scope: ScopeMap,
    /// Arguments checkpointed by the innermost enclosing block.
    pub checkpoint_args: Vec<Arc<Phrase>>,
}

impl ParseState {
    pub fn new(position: u32, scope: ScopeMap) -> Self {
        Self {
            position,
            scope,
            checkpoint_args: Vec::new(),
        }
    }

    /// The same state at another position.
    pub fn at_position(&self, position: u32) -> Self {
        Self {
            position,
            scope: self.scope.clone(),
            checkpoint_args: self.checkpoint_args.clone(),
        }
    }

    /// A new state with one more declaration in scope.
    pub fn with_declaration(&self, declaration: Arc<Declaration>) -> Self {
        Self {
            position: self.position,
            scope: self.scope.with(declaration),
            checkpoint_args: self.checkpoint_args.clone(),
        }
    }

    /// A derived state whose scope is empty, for sub-expressions that are
    /// evaluated immediately and must not see local declarations.
    pub fn with_empty_scope(&self) -> Self {
        Self {
            position: self.position,
            scope: ScopeMap::empty(),
            checkpoint_args: Vec::new(),
        }
    }

    /// A derived state with the argument snapshot replaced.
    pub fn with_checkpoint(&self, arguments: Vec<Arc<Phrase>>) -> Self {
        Self {
            position: self.position,
            scope: self.scope.clone(),
            checkpoint_args: arguments,
        }
    }
}
