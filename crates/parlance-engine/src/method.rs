//! Methods and their definitions, restrictions, and macros.

use std::sync::{Arc, Mutex};

use parlance_core::Symbol;
use parlance_syntax::{FunctionType, FunctionValue, Type};

/// What backs a single definition.
#[derive(Clone, Debug)]
pub enum DefinitionBody {
    /// A callable function value.
    Function(Arc<FunctionValue>),
    /// Declared ahead of its definition; must be resolved by module end.
    Forward,
    /// Present for dispatch but never directly callable.
    Abstract,
}

/// One concrete entry in a method.
#[derive(Clone, Debug)]
pub struct Definition {
    pub signature: FunctionType,
    pub body: DefinitionBody,
}

impl Definition {
    pub fn new(signature: FunctionType, body: DefinitionBody) -> Self {
        Self { signature, body }
    }

    pub fn is_forward(&self) -> bool {
        matches!(self.body, DefinitionBody::Forward)
    }

    /// Whether these argument types select this definition.
    pub fn accepts(&self, argument_types: &[Type]) -> bool {
        self.signature.params.len() == argument_types.len()
            && argument_types
                .iter()
                .zip(&self.signature.params)
                .all(|(given, expected)| given.is_subtype_of(expected))
    }
}

/// A function run at parse time over argument *types*; it narrows the
/// send's return type or rejects the parse outright.
#[derive(Clone, Debug)]
pub struct SemanticRestriction {
    pub description: Arc<str>,
    pub function: Arc<FunctionValue>,
}

/// A definition whose body runs at parse time over argument *phrases*
/// and returns a phrase. Prefix functions run at the message's section
/// checkpoints, in order.
#[derive(Clone, Debug)]
pub struct MacroDefinition {
    pub signature: FunctionType,
    pub body: Arc<FunctionValue>,
    pub prefix_functions: Vec<Arc<FunctionValue>>,
}

#[derive(Default)]
struct MethodState {
    definitions: Vec<Arc<Definition>>,
    restrictions: Vec<Arc<SemanticRestriction>>,
    macros: Vec<Arc<MacroDefinition>>,
}

/// A named polymorphic operation: a tuple of definitions, a tuple of
/// semantic restrictions, and, separately, a tuple of macros.
///
/// Mutated only between statements, inside the module transaction; the
/// engine reads snapshots.
pub struct Method {
    name: Symbol,
    state: Mutex<MethodState>,
}

impl Method {
    pub fn new(name: Symbol) -> Arc<Self> {
        Arc::new(Self {
            name,
            state: Mutex::new(MethodState::default()),
        })
    }

    pub fn name(&self) -> Symbol {
        self.name
    }

    pub fn definitions(&self) -> Vec<Arc<Definition>> {
        self.state.lock().expect("method poisoned").definitions.clone()
    }

    pub fn restrictions(&self) -> Vec<Arc<SemanticRestriction>> {
        self.state.lock().expect("method poisoned").restrictions.clone()
    }

    pub fn macros(&self) -> Vec<Arc<MacroDefinition>> {
        self.state.lock().expect("method poisoned").macros.clone()
    }

    pub fn has_macros(&self) -> bool {
        !self.state.lock().expect("method poisoned").macros.is_empty()
    }

    /// The definition with exactly these parameter types, if any.
    pub fn definition_with_params(&self, params: &[Type]) -> Option<(usize, Arc<Definition>)> {
        let state = self.state.lock().expect("method poisoned");
        state
            .definitions
            .iter()
            .enumerate()
            .find(|(_, d)| d.signature.params.as_slice() == params)
            .map(|(i, d)| (i, Arc::clone(d)))
    }

    pub(crate) fn push_definition(&self, definition: Arc<Definition>) {
        self.state
            .lock()
            .expect("method poisoned")
            .definitions
            .push(definition);
    }

    pub(crate) fn pop_definition(&self) {
        self.state.lock().expect("method poisoned").definitions.pop();
    }

    pub(crate) fn replace_definition(&self, index: usize, definition: Arc<Definition>) {
        self.state.lock().expect("method poisoned").definitions[index] = definition;
    }

    pub(crate) fn push_restriction(&self, restriction: Arc<SemanticRestriction>) {
        self.state
            .lock()
            .expect("method poisoned")
            .restrictions
            .push(restriction);
    }

    pub(crate) fn pop_restriction(&self) {
        self.state.lock().expect("method poisoned").restrictions.pop();
    }

    pub(crate) fn push_macro(&self, definition: Arc<MacroDefinition>) {
        self.state.lock().expect("method poisoned").macros.push(definition);
    }

    pub(crate) fn pop_macro(&self) {
        self.state.lock().expect("method poisoned").macros.pop();
    }

    /// Forward declarations still awaiting a concrete definition.
    pub fn unresolved_forwards(&self) -> Vec<FunctionType> {
        self.state
            .lock()
            .expect("method poisoned")
            .definitions
            .iter()
            .filter(|d| d.is_forward())
            .map(|d| d.signature.clone())
            .collect()
    }
}

impl std::fmt::Debug for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock().expect("method poisoned");
        f.debug_struct("Method")
            .field("name", &self.name)
            .field("definitions", &state.definitions.len())
            .field("restrictions", &state.restrictions.len())
            .field("macros", &state.macros.len())
            .finish()
    }
}
