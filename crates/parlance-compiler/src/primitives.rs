//! The injected primitive registry.
//!
//! Pragmas name primitives by number; the numbers mean nothing to the
//! front end. Hosts register each primitive's signature and handler
//! here, and bootstrap definitions created from pragmas carry the
//! primitive-backed function values.

use std::sync::{Arc, Mutex};

use indexmap::IndexMap;
use parlance_engine::RunError;
use parlance_syntax::{FunctionValue, Type, Value};

/// A host implementation of one primitive.
pub type PrimitiveHandler = Arc<dyn Fn(&[Value]) -> Result<Value, RunError> + Send + Sync>;

struct PrimitiveEntry {
    function: Arc<FunctionValue>,
    handler: PrimitiveHandler,
}

/// Numbered primitives available to pragmas and the evaluator.
#[derive(Default)]
pub struct PrimitiveRegistry {
    entries: Mutex<IndexMap<u32, PrimitiveEntry>>,
}

impl PrimitiveRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a primitive under a number, replacing any previous entry.
    pub fn register(
        &self,
        number: u32,
        name: &str,
        params: Vec<Type>,
        result: Type,
        handler: impl Fn(&[Value]) -> Result<Value, RunError> + Send + Sync + 'static,
    ) {
        let function = Arc::new(FunctionValue::primitive(name, params, result, number));
        self.entries.lock().expect("primitive registry poisoned").insert(
            number,
            PrimitiveEntry {
                function,
                handler: Arc::new(handler),
            },
        );
    }

    /// The signature-bearing function value for a primitive number.
    pub fn function_for(&self, number: u32) -> Option<Arc<FunctionValue>> {
        self.entries
            .lock()
            .expect("primitive registry poisoned")
            .get(&number)
            .map(|entry| Arc::clone(&entry.function))
    }

    /// Run a primitive by number.
    pub fn run(&self, number: u32, arguments: &[Value]) -> Result<Value, RunError> {
        let handler = self
            .entries
            .lock()
            .expect("primitive registry poisoned")
            .get(&number)
            .map(|entry| Arc::clone(&entry.handler));
        match handler {
            Some(handler) => handler(arguments),
            None => Err(RunError::failed(format!("unknown primitive {number}"))),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("primitive registry poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
