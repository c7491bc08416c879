//! The method/bundle registry and its transactional mutation log.
//!
//! Everything a module compilation adds - bundles, definitions, macros,
//! restrictions, atoms, module records - is journaled; rolling the
//! transaction back replays the journal in reverse. Within a statement
//! the registry is read-only.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use indexmap::{IndexMap, IndexSet};
use parlance_core::{Interner, Symbol};
use parlance_message::{MessageError, MessageSplitter};
use parlance_syntax::{AtomId, FunctionType, Type};

use crate::bundle::Bundle;
use crate::method::{
    Definition, DefinitionBody, MacroDefinition, Method, SemanticRestriction,
};

/// An installed module: its versions and published names.
#[derive(Clone, Debug)]
pub struct ModuleRecord {
    pub name: Arc<str>,
    pub versions: Vec<Arc<str>>,
    pub public_names: IndexMap<Arc<str>, AtomId>,
}

enum UndoAction {
    RemoveBundle(Symbol),
    RemoveMethod(Symbol),
    PopDefinition(Symbol),
    ReplaceDefinition {
        method: Symbol,
        index: usize,
        previous: Arc<Definition>,
    },
    PopRestriction(Symbol),
    PopMacro(Symbol),
    RestoreGrammatical {
        message: Symbol,
        index: u32,
        previous: IndexSet<Symbol>,
    },
    RemoveModule(Arc<str>),
    RemoveAtom(AtomId),
}

#[derive(Clone, Debug)]
struct AtomRecord {
    name: Arc<str>,
    module: Arc<str>,
}

/// The process-wide registry consulted and (transactionally) grown by
/// module compilations.
pub struct Runtime {
    interner: Mutex<Interner>,
    methods: Mutex<IndexMap<Symbol, Arc<Method>>>,
    bundles: Mutex<IndexMap<Symbol, Arc<Bundle>>>,
    modules: Mutex<IndexMap<Arc<str>, Arc<ModuleRecord>>>,
    atoms: Mutex<IndexMap<AtomId, AtomRecord>>,
    next_atom: AtomicU32,
    journal: Mutex<Vec<UndoAction>>,
}

impl Runtime {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            interner: Mutex::new(Interner::new()),
            methods: Mutex::new(IndexMap::new()),
            bundles: Mutex::new(IndexMap::new()),
            modules: Mutex::new(IndexMap::new()),
            atoms: Mutex::new(IndexMap::new()),
            next_atom: AtomicU32::new(1),
            journal: Mutex::new(Vec::new()),
        })
    }

    pub fn intern(&self, text: &str) -> Symbol {
        self.interner.lock().expect("interner poisoned").intern(text)
    }

    pub fn lookup_symbol(&self, text: &str) -> Option<Symbol> {
        self.interner.lock().expect("interner poisoned").get(text)
    }

    pub fn resolve(&self, symbol: Symbol) -> Arc<str> {
        Arc::clone(self.interner.lock().expect("interner poisoned").resolve(symbol))
    }

    /// Run a splitter against this runtime's interner.
    pub fn split(&self, name: &str) -> Result<Arc<MessageSplitter>, MessageError> {
        let mut interner = self.interner.lock().expect("interner poisoned");
        Ok(Arc::new(MessageSplitter::split(name, &mut interner)?))
    }

    pub fn bundle_named(&self, message: Symbol) -> Option<Arc<Bundle>> {
        self.bundles
            .lock()
            .expect("bundles poisoned")
            .get(&message)
            .cloned()
    }

    pub fn method_named(&self, message: Symbol) -> Option<Arc<Method>> {
        self.methods
            .lock()
            .expect("methods poisoned")
            .get(&message)
            .cloned()
    }

    /// Every bundle currently visible.
    pub fn all_bundles(&self) -> Vec<Arc<Bundle>> {
        self.bundles
            .lock()
            .expect("bundles poisoned")
            .values()
            .cloned()
            .collect()
    }

    /// The bundle for a message name, creating message, method, and
    /// bundle on first use.
    pub fn declare_bundle(&self, name: &str) -> Result<Arc<Bundle>, MessageError> {
        let message = self.intern(name);
        if let Some(existing) = self.bundle_named(message) {
            return Ok(existing);
        }
        let splitter = self.split(name)?;
        let method = Method::new(message);
        let bundle = Bundle::new(message, splitter, Arc::clone(&method));
        self.methods
            .lock()
            .expect("methods poisoned")
            .insert(message, method);
        self.bundles
            .lock()
            .expect("bundles poisoned")
            .insert(message, Arc::clone(&bundle));
        let mut journal = self.journal.lock().expect("journal poisoned");
        journal.push(UndoAction::RemoveMethod(message));
        journal.push(UndoAction::RemoveBundle(message));
        Ok(bundle)
    }

    /// Add one definition, enforcing the shape and variance rules.
    pub fn add_method_definition(
        &self,
        name: &str,
        signature: FunctionType,
        body: DefinitionBody,
    ) -> Result<Arc<Bundle>, MessageError> {
        let bundle = self.declare_bundle(name)?;
        bundle
            .splitter()
            .check_implementation_signature(&signature, None)?;

        let method = bundle.method();
        if let Some((index, existing)) = method.definition_with_params(&signature.params) {
            // Only a forward declaration may be superseded, and only by a
            // definition with the very return type it promised.
            if !existing.is_forward() || matches!(body, DefinitionBody::Forward) {
                return Err(MessageError::RedefinedWithSameArgumentTypes);
            }
            if *existing.signature.result != *signature.result {
                return Err(MessageError::MethodReturnTypeNotAsForwardDeclared);
            }
            let replacement = Arc::new(Definition::new(signature, body));
            method.replace_definition(index, replacement);
            self.journal
                .lock()
                .expect("journal poisoned")
                .push(UndoAction::ReplaceDefinition {
                    method: bundle.message(),
                    index,
                    previous: existing,
                });
            return Ok(bundle);
        }

        check_result_covariance(&method.definitions(), &signature)?;
        method.push_definition(Arc::new(Definition::new(signature, body)));
        self.journal
            .lock()
            .expect("journal poisoned")
            .push(UndoAction::PopDefinition(bundle.message()));
        Ok(bundle)
    }

    /// Add a macro definition. The body must return a phrase; there must
    /// be one prefix function per section checkpoint in the name.
    pub fn add_macro(
        &self,
        name: &str,
        definition: MacroDefinition,
    ) -> Result<Arc<Bundle>, MessageError> {
        let bundle = self.declare_bundle(name)?;
        if !matches!(*definition.signature.result, Type::Phrase(_)) {
            return Err(MessageError::MacroMustReturnAPhrase);
        }
        if definition.signature.params.len() as u32 != bundle.splitter().argument_count() {
            return Err(MessageError::IncorrectNumberOfArguments {
                expected: bundle.splitter().argument_count(),
                given: definition.signature.params.len() as u32,
            });
        }
        if definition.prefix_functions.len() as u32
            != bundle.splitter().section_checkpoint_count()
        {
            return Err(MessageError::IncorrectNumberOfArguments {
                expected: bundle.splitter().section_checkpoint_count(),
                given: definition.prefix_functions.len() as u32,
            });
        }
        bundle.method().push_macro(Arc::new(definition));
        self.journal
            .lock()
            .expect("journal poisoned")
            .push(UndoAction::PopMacro(bundle.message()));
        Ok(bundle)
    }

    /// Attach a semantic restriction to an existing message.
    pub fn add_semantic_restriction(
        &self,
        name: &str,
        restriction: SemanticRestriction,
    ) -> Result<Arc<Bundle>, MessageError> {
        let bundle = self.declare_bundle(name)?;
        if restriction.function.params.len() as u32 != bundle.splitter().argument_count() {
            return Err(MessageError::IncorrectNumberOfArguments {
                expected: bundle.splitter().argument_count(),
                given: restriction.function.params.len() as u32,
            });
        }
        bundle.method().push_restriction(Arc::new(restriction));
        self.journal
            .lock()
            .expect("journal poisoned")
            .push(UndoAction::PopRestriction(bundle.message()));
        Ok(bundle)
    }

    /// Forbid `excluded` messages from the numbered argument of `name`.
    pub fn add_grammatical_restriction(
        &self,
        name: &str,
        argument_index: u32,
        excluded: &[&str],
    ) -> Result<Arc<Bundle>, MessageError> {
        let bundle = self.declare_bundle(name)?;
        if argument_index == 0 || argument_index > bundle.splitter().underscore_count() {
            return Err(MessageError::IncorrectNumberOfArguments {
                expected: bundle.splitter().underscore_count(),
                given: argument_index,
            });
        }
        let previous = bundle.restriction_snapshot(argument_index);
        let symbols: Vec<Symbol> = excluded.iter().map(|n| self.intern(n)).collect();
        bundle.restrict_argument(argument_index, symbols);
        self.journal
            .lock()
            .expect("journal poisoned")
            .push(UndoAction::RestoreGrammatical {
                message: bundle.message(),
                index: argument_index,
                previous,
            });
        Ok(bundle)
    }

    /// Mint a fresh atom for a name published by a module.
    pub fn create_atom(&self, name: &str, module: &str) -> AtomId {
        let id = AtomId(self.next_atom.fetch_add(1, Ordering::Relaxed));
        self.atoms.lock().expect("atoms poisoned").insert(
            id,
            AtomRecord {
                name: Arc::from(name),
                module: Arc::from(module),
            },
        );
        self.journal
            .lock()
            .expect("journal poisoned")
            .push(UndoAction::RemoveAtom(id));
        id
    }

    pub fn atom_name(&self, id: AtomId) -> Option<Arc<str>> {
        self.atoms
            .lock()
            .expect("atoms poisoned")
            .get(&id)
            .map(|record| Arc::clone(&record.name))
    }

    pub fn atom_module(&self, id: AtomId) -> Option<Arc<str>> {
        self.atoms
            .lock()
            .expect("atoms poisoned")
            .get(&id)
            .map(|record| Arc::clone(&record.module))
    }

    pub fn add_module(&self, record: ModuleRecord) {
        let name = Arc::clone(&record.name);
        self.modules
            .lock()
            .expect("modules poisoned")
            .insert(Arc::clone(&name), Arc::new(record));
        self.journal
            .lock()
            .expect("journal poisoned")
            .push(UndoAction::RemoveModule(name));
    }

    pub fn module_at(&self, name: &str) -> Option<Arc<ModuleRecord>> {
        self.modules.lock().expect("modules poisoned").get(name).cloned()
    }

    /// Messages that still carry unresolved forward declarations.
    pub fn unresolved_forwards(&self) -> Vec<(Arc<str>, FunctionType)> {
        let methods = self.methods.lock().expect("methods poisoned");
        let mut out = Vec::new();
        for method in methods.values() {
            for signature in method.unresolved_forwards() {
                out.push((self.resolve(method.name()), signature));
            }
        }
        out
    }

    /// Open a transaction; dropping it without `commit` rolls back.
    pub fn begin_transaction(self: &Arc<Self>) -> Transaction {
        let mark = self.journal.lock().expect("journal poisoned").len();
        Transaction {
            runtime: Arc::clone(self),
            mark,
            committed: false,
        }
    }

    fn rollback_to(&self, mark: usize) {
        loop {
            let action = {
                let mut journal = self.journal.lock().expect("journal poisoned");
                if journal.len() <= mark {
                    break;
                }
                journal.pop()
            };
            let Some(action) = action else { break };
            match action {
                UndoAction::RemoveBundle(message) => {
                    self.bundles
                        .lock()
                        .expect("bundles poisoned")
                        .shift_remove(&message);
                }
                UndoAction::RemoveMethod(message) => {
                    self.methods
                        .lock()
                        .expect("methods poisoned")
                        .shift_remove(&message);
                }
                UndoAction::PopDefinition(message) => {
                    if let Some(method) = self.method_named(message) {
                        method.pop_definition();
                    }
                }
                UndoAction::ReplaceDefinition {
                    method,
                    index,
                    previous,
                } => {
                    if let Some(method) = self.method_named(method) {
                        method.replace_definition(index, previous);
                    }
                }
                UndoAction::PopRestriction(message) => {
                    if let Some(method) = self.method_named(message) {
                        method.pop_restriction();
                    }
                }
                UndoAction::PopMacro(message) => {
                    if let Some(method) = self.method_named(message) {
                        method.pop_macro();
                    }
                }
                UndoAction::RestoreGrammatical {
                    message,
                    index,
                    previous,
                } => {
                    if let Some(bundle) = self.bundle_named(message) {
                        bundle.restore_restriction(index, previous);
                    }
                }
                UndoAction::RemoveModule(name) => {
                    self.modules
                        .lock()
                        .expect("modules poisoned")
                        .shift_remove(&name);
                }
                UndoAction::RemoveAtom(id) => {
                    self.atoms.lock().expect("atoms poisoned").shift_remove(&id);
                }
            }
        }
    }
}

/// The new-result covariance rule: if one signature's parameters are
/// pointwise narrower than another's, its result must be narrower too.
fn check_result_covariance(
    existing: &[Arc<Definition>],
    incoming: &FunctionType,
) -> Result<(), MessageError> {
    for other in existing {
        if other.signature.params.len() != incoming.params.len() {
            continue;
        }
        let incoming_narrower = incoming
            .params
            .iter()
            .zip(&other.signature.params)
            .all(|(a, b)| a.is_subtype_of(b));
        if incoming_narrower && !incoming.result.is_subtype_of(&other.signature.result) {
            return Err(MessageError::ResultTypeShouldCovaryWithArguments);
        }
        let other_narrower = other
            .signature
            .params
            .iter()
            .zip(&incoming.params)
            .all(|(a, b)| a.is_subtype_of(b));
        if other_narrower && !other.signature.result.is_subtype_of(&incoming.result) {
            return Err(MessageError::ResultTypeShouldCovaryWithArguments);
        }
    }
    Ok(())
}

/// A transactional window over the runtime. Rolls back on drop unless
/// committed.
pub struct Transaction {
    runtime: Arc<Runtime>,
    mark: usize,
    committed: bool,
}

impl Transaction {
    /// Keep everything added since the transaction opened; the undo
    /// records are discarded.
    pub fn commit(mut self) {
        self.committed = true;
        self.runtime
            .journal
            .lock()
            .expect("journal poisoned")
            .truncate(self.mark);
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if !self.committed {
            self.runtime.rollback_to(self.mark);
        }
    }
}
