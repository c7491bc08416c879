//! The prefix-merged bundle trie.
//!
//! Every node holds the set of plans that have reached it; expansion
//! sorts their next instructions into keyword edges (exact and
//! case-folded), an action map, and the list of messages complete here.
//! Nodes are lazy: loops in parsing programs unfold an unbounded trie,
//! but only the parts a parse actually reaches are ever expanded.
//! Expansion is idempotent; registering a new plan invalidates it.

use std::sync::{Arc, Mutex};

use indexmap::IndexMap;
use parlance_core::Symbol;
use parlance_message::ParsingOperation;

use crate::bundle::{Bundle, PlanInProgress};

/// The sorted view of one node's plans.
pub struct Expansion {
    plan_count: usize,
    /// Plans whose programs have run to completion at this node.
    pub complete: Vec<PlanInProgress>,
    /// Keyword edges matched verbatim.
    pub exact: IndexMap<Symbol, Arc<BundleTree>>,
    /// Keyword edges matched after case folding the candidate token.
    pub folded: IndexMap<Symbol, Arc<BundleTree>>,
    /// Non-keyword instructions, each with one successor tree per
    /// successor program counter.
    pub actions: IndexMap<ParsingOperation, Vec<Arc<BundleTree>>>,
}

/// One node of the bundle trie.
pub struct BundleTree {
    plans: Mutex<Vec<PlanInProgress>>,
    expansion: Mutex<Option<Arc<Expansion>>>,
    /// Children filtered by grammatical restrictions, keyed by the inner
    /// send's message. Populated lazily at `CheckArgument` boundaries.
    prefilter: Mutex<IndexMap<Symbol, Arc<BundleTree>>>,
}

impl BundleTree {
    pub fn new() -> Arc<Self> {
        Self::with_plans(Vec::new())
    }

    pub fn with_plans(plans: Vec<PlanInProgress>) -> Arc<Self> {
        Arc::new(Self {
            plans: Mutex::new(plans),
            expansion: Mutex::new(None),
            prefilter: Mutex::new(IndexMap::new()),
        })
    }

    /// A root node holding every given bundle's plan at its start.
    pub fn root_for(bundles: impl IntoIterator<Item = Arc<Bundle>>) -> Arc<Self> {
        Self::with_plans(bundles.into_iter().map(PlanInProgress::start).collect())
    }

    /// Register another plan; the node will re-expand on next use.
    pub fn add_plan(&self, plan: PlanInProgress) {
        self.plans.lock().expect("bundle tree poisoned").push(plan);
        *self.expansion.lock().expect("bundle tree poisoned") = None;
        self.prefilter.lock().expect("bundle tree poisoned").clear();
    }

    pub fn plan_count(&self) -> usize {
        self.plans.lock().expect("bundle tree poisoned").len()
    }

    /// Expand (or return the cached expansion of) this node.
    pub fn expand(&self) -> Arc<Expansion> {
        let plans = self.plans.lock().expect("bundle tree poisoned").clone();
        {
            let cached = self.expansion.lock().expect("bundle tree poisoned");
            if let Some(expansion) = cached.as_ref()
                && expansion.plan_count == plans.len()
            {
                return Arc::clone(expansion);
            }
        }

        let mut complete = Vec::new();
        let mut exact: IndexMap<Symbol, Vec<PlanInProgress>> = IndexMap::new();
        let mut folded: IndexMap<Symbol, Vec<PlanInProgress>> = IndexMap::new();
        let mut actions: IndexMap<ParsingOperation, Vec<Vec<PlanInProgress>>> = IndexMap::new();

        for plan in &plans {
            match plan.current_op() {
                None => complete.push(plan.clone()),
                Some(op) => {
                    if let Some((part, fold)) = op.keyword_edge() {
                        let map = if fold { &mut folded } else { &mut exact };
                        map.entry(part)
                            .or_default()
                            .push(PlanInProgress::at(Arc::clone(&plan.bundle), plan.pc + 1));
                    } else {
                        let successors = op.successors(plan.pc);
                        let children = actions
                            .entry(*op)
                            .or_insert_with(|| vec![Vec::new(); successors.len()]);
                        for (i, pc) in successors.iter().enumerate() {
                            children[i].push(PlanInProgress::at(Arc::clone(&plan.bundle), *pc));
                        }
                    }
                }
            }
        }

        let expansion = Arc::new(Expansion {
            plan_count: plans.len(),
            complete,
            exact: exact
                .into_iter()
                .map(|(k, plans)| (k, BundleTree::with_plans(plans)))
                .collect(),
            folded: folded
                .into_iter()
                .map(|(k, plans)| (k, BundleTree::with_plans(plans)))
                .collect(),
            actions: actions
                .into_iter()
                .map(|(op, children)| {
                    (
                        op,
                        children.into_iter().map(BundleTree::with_plans).collect(),
                    )
                })
                .collect(),
        });
        *self.expansion.lock().expect("bundle tree poisoned") = Some(Arc::clone(&expansion));
        expansion
    }

    /// The distinct macro definitions of the methods with plans at this
    /// node, for running prefix functions.
    pub(crate) fn macros_here(&self) -> Vec<Arc<crate::method::MacroDefinition>> {
        let plans = self.plans.lock().expect("bundle tree poisoned");
        let mut out: Vec<Arc<crate::method::MacroDefinition>> = Vec::new();
        for plan in plans.iter() {
            for definition in plan.bundle.method().macros() {
                if !out.iter().any(|d| Arc::ptr_eq(d, &definition)) {
                    out.push(definition);
                }
            }
        }
        out
    }

    /// The subtree of plans that tolerate a send of `inner` filling the
    /// numbered argument. Returns `self` untouched when no plan here
    /// carries grammatical restrictions.
    pub fn prefiltered(self: &Arc<Self>, argument_index: u32, inner: Symbol) -> Arc<Self> {
        let plans = self.plans.lock().expect("bundle tree poisoned").clone();
        if plans
            .iter()
            .all(|plan| !plan.bundle.has_grammatical_restrictions())
        {
            return Arc::clone(self);
        }
        if let Some(cached) = self
            .prefilter
            .lock()
            .expect("bundle tree poisoned")
            .get(&inner)
        {
            return Arc::clone(cached);
        }
        let filtered: Vec<PlanInProgress> = plans
            .into_iter()
            .filter(|plan| plan.bundle.argument_allows(argument_index, inner))
            .collect();
        let child = BundleTree::with_plans(filtered);
        self.prefilter
            .lock()
            .expect("bundle tree poisoned")
            .insert(inner, Arc::clone(&child));
        child
    }
}

impl std::fmt::Debug for BundleTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BundleTree")
            .field("plans", &self.plan_count())
            .finish()
    }
}
