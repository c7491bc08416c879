//! A phrase evaluator sufficient for bootstrap modules.
//!
//! The real language runtime is an external collaborator; this
//! implementation covers what module compilation itself needs: running
//! primitive-backed definitions, evaluating literals, lists, sends, and
//! module-scope variables, and executing top-level statements. Closures
//! over local state are out of its depth and fail cleanly.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use parlance_engine::{Interpreter, RunError, Runtime};
use parlance_syntax::{FunctionBody, FunctionValue, Phrase, Value};

use crate::primitives::PrimitiveRegistry;

/// Module-scope variable storage for one compilation.
#[derive(Default)]
pub struct ModuleSpace {
    variables: Mutex<HashMap<Arc<str>, Value>>,
}

impl ModuleSpace {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn declare(&self, name: &Arc<str>, value: Value) {
        self.variables
            .lock()
            .expect("module space poisoned")
            .insert(Arc::clone(name), value);
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.variables
            .lock()
            .expect("module space poisoned")
            .get(name)
            .cloned()
    }

    pub fn assign(&self, name: &str, value: Value) -> Result<(), RunError> {
        let mut variables = self.variables.lock().expect("module space poisoned");
        match variables.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(RunError::failed(format!(
                "assignment to undeclared module variable `{name}`"
            ))),
        }
    }
}

/// The provided interpreter: primitives from the registry, phrase bodies
/// by direct tree walk.
pub struct BasicInterpreter {
    primitives: Arc<PrimitiveRegistry>,
    space: Arc<ModuleSpace>,
}

impl BasicInterpreter {
    pub fn new(primitives: Arc<PrimitiveRegistry>, space: Arc<ModuleSpace>) -> Self {
        Self { primitives, space }
    }

    pub fn space(&self) -> &Arc<ModuleSpace> {
        &self.space
    }

    fn eval(
        &self,
        phrase: &Phrase,
        env: &HashMap<Arc<str>, Value>,
        runtime: &Runtime,
    ) -> Result<Value, RunError> {
        match phrase {
            Phrase::Literal { value, .. } => Ok(value.clone()),
            Phrase::VariableUse { declaration, .. } => {
                if let Some(value) = env.get(&declaration.name) {
                    return Ok(value.clone());
                }
                self.space.get(&declaration.name).ok_or_else(|| {
                    RunError::failed(format!(
                        "variable `{}` is not available at evaluation time",
                        declaration.name
                    ))
                })
            }
            Phrase::Send {
                message, arguments, ..
            } => {
                let mut values = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.eval(argument, env, runtime)?);
                }
                self.dispatch(*message, &values, runtime)
            }
            Phrase::List { elements } => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.eval(element, env, runtime)?);
                }
                Ok(Value::Tuple(values))
            }
            Phrase::Block {
                arguments,
                statements,
                result_type,
            } => Ok(Value::Function(Arc::new(FunctionValue {
                name: Arc::from("block"),
                params: arguments.iter().map(|a| a.declared_type.clone()).collect(),
                result: result_type.clone(),
                body: FunctionBody::Phrase {
                    parameters: arguments.clone(),
                    body: Arc::new(Phrase::Block {
                        arguments: arguments.clone(),
                        statements: statements.clone(),
                        result_type: result_type.clone(),
                    }),
                },
            }))),
            Phrase::Declaration {
                declaration,
                initializer,
            } => {
                let value = match initializer {
                    Some(initializer) => self.eval(initializer, env, runtime)?,
                    None => {
                        return Err(RunError::failed(format!(
                            "declaration of `{}` has no initializer to evaluate",
                            declaration.name
                        )));
                    }
                };
                self.space.declare(&declaration.name, value);
                Ok(Value::Tuple(Vec::new()))
            }
            Phrase::Assignment { target, value } => {
                let value = self.eval(value, env, runtime)?;
                self.space.assign(&target.name, value)?;
                Ok(Value::Tuple(Vec::new()))
            }
            Phrase::MacroSubstitution { replacement, .. } => {
                self.eval(replacement, env, runtime)
            }
            Phrase::Reference { declaration, .. } => Err(RunError::failed(format!(
                "references (↑{}) need the full runtime",
                declaration.name
            ))),
        }
    }

    fn dispatch(
        &self,
        message: parlance_core::Symbol,
        values: &[Value],
        runtime: &Runtime,
    ) -> Result<Value, RunError> {
        let method = runtime
            .method_named(message)
            .ok_or_else(|| RunError::failed("send of an unknown message"))?;
        let value_types: Vec<_> = values.iter().map(Value::type_of).collect();
        for definition in method.definitions() {
            if !definition.accepts(&value_types) {
                continue;
            }
            return match &definition.body {
                parlance_engine::DefinitionBody::Function(function) => {
                    self.run(function, values, runtime)
                }
                parlance_engine::DefinitionBody::Forward => Err(RunError::failed(
                    "send of a forward declaration before its definition",
                )),
                parlance_engine::DefinitionBody::Abstract => {
                    Err(RunError::failed("send of an abstract definition"))
                }
            };
        }
        Err(RunError::failed(format!(
            "no definition applicable to ({})",
            value_types
                .iter()
                .map(|t| t.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )))
    }
}

impl Interpreter for BasicInterpreter {
    fn run(
        &self,
        function: &FunctionValue,
        arguments: &[Value],
        runtime: &Runtime,
    ) -> Result<Value, RunError> {
        match &function.body {
            FunctionBody::Primitive(number) => self.primitives.run(*number, arguments),
            FunctionBody::Phrase { parameters, body } => {
                let mut env = HashMap::new();
                for (parameter, value) in parameters.iter().zip(arguments) {
                    env.insert(Arc::clone(&parameter.name), value.clone());
                }
                match &**body {
                    Phrase::Block { statements, .. } => {
                        let mut last = Value::Tuple(Vec::new());
                        for statement in statements {
                            last = self.eval(statement, &env, runtime)?;
                        }
                        Ok(last)
                    }
                    other => self.eval(other, &env, runtime),
                }
            }
        }
    }
}
