//! Bundles: message names bound to methods and parsing programs.

use std::sync::{Arc, Mutex};

use indexmap::IndexSet;
use parlance_core::Symbol;
use parlance_message::{MessageSplitter, ParsingOperation};

use crate::method::Method;

/// A parseable message name with its splitter output, the method it
/// names, and the grammatical restrictions on its argument positions.
pub struct Bundle {
    message: Symbol,
    splitter: Arc<MessageSplitter>,
    method: Arc<Method>,
    /// Excluded inner messages per one-based leaf-argument index.
    restrictions: Mutex<Vec<IndexSet<Symbol>>>,
}

impl Bundle {
    pub fn new(message: Symbol, splitter: Arc<MessageSplitter>, method: Arc<Method>) -> Arc<Self> {
        Arc::new(Self {
            message,
            splitter,
            method,
            restrictions: Mutex::new(Vec::new()),
        })
    }

    pub fn message(&self) -> Symbol {
        self.message
    }

    pub fn splitter(&self) -> &Arc<MessageSplitter> {
        &self.splitter
    }

    pub fn method(&self) -> &Arc<Method> {
        &self.method
    }

    /// Forbid the given messages from filling the numbered argument.
    pub fn restrict_argument(&self, index: u32, excluded: impl IntoIterator<Item = Symbol>) {
        let mut restrictions = self.restrictions.lock().expect("bundle poisoned");
        let slot = index as usize - 1;
        if restrictions.len() <= slot {
            restrictions.resize_with(slot + 1, IndexSet::new);
        }
        restrictions[slot].extend(excluded);
    }

    /// Whether a send of `inner` may fill the numbered argument.
    pub fn argument_allows(&self, index: u32, inner: Symbol) -> bool {
        let restrictions = self.restrictions.lock().expect("bundle poisoned");
        match restrictions.get(index as usize - 1) {
            Some(excluded) => !excluded.contains(&inner),
            None => true,
        }
    }

    /// Whether any argument position carries restrictions.
    pub fn has_grammatical_restrictions(&self) -> bool {
        self.restrictions
            .lock()
            .expect("bundle poisoned")
            .iter()
            .any(|set| !set.is_empty())
    }

    /// Snapshot of one argument slot's exclusions.
    pub(crate) fn restriction_snapshot(&self, index: u32) -> IndexSet<Symbol> {
        self.restrictions
            .lock()
            .expect("bundle poisoned")
            .get(index as usize - 1)
            .cloned()
            .unwrap_or_default()
    }

    /// Restore one argument slot (transaction rollback).
    pub(crate) fn restore_restriction(&self, index: u32, previous: IndexSet<Symbol>) {
        let mut restrictions = self.restrictions.lock().expect("bundle poisoned");
        let slot = index as usize - 1;
        if restrictions.len() <= slot {
            restrictions.resize_with(slot + 1, IndexSet::new);
        }
        restrictions[slot] = previous;
    }
}

impl std::fmt::Debug for Bundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bundle")
            .field("message", &self.splitter.name())
            .finish()
    }
}

/// A plan: a bundle plus a cursor into its parsing program.
#[derive(Clone, Debug)]
pub struct PlanInProgress {
    pub bundle: Arc<Bundle>,
    /// One-based index of the next instruction; past the end means the
    /// message is complete at this tree node.
    pub pc: u32,
}

impl PlanInProgress {
    pub fn start(bundle: Arc<Bundle>) -> Self {
        Self { bundle, pc: 1 }
    }

    pub fn at(bundle: Arc<Bundle>, pc: u32) -> Self {
        Self { bundle, pc }
    }

    /// The instruction this plan is waiting to execute.
    pub fn current_op(&self) -> Option<&ParsingOperation> {
        self.bundle.splitter().program().op_at(self.pc)
    }

    pub fn is_complete(&self) -> bool {
        self.current_op().is_none()
    }
}
