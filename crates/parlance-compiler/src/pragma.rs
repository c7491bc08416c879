//! Bootstrap pragmas.
//!
//! Each pragma string has the shape `kind=primitive=name` with
//! `kind ∈ {method, macro}`: it binds a new message to a definition
//! whose body is the named primitive, giving a module its first
//! callable syntax before any statement has run.

use std::sync::Arc;

use parlance_engine::{MacroDefinition, Runtime};
use parlance_engine::method::DefinitionBody;
use parlance_syntax::FunctionType;

use crate::primitives::PrimitiveRegistry;

/// What a pragma creates.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PragmaKind {
    Method,
    Macro,
}

/// One parsed pragma.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pragma {
    pub kind: PragmaKind,
    pub primitive: u32,
    pub name: Arc<str>,
}

/// A malformed or inapplicable pragma.
#[derive(Debug, Clone, thiserror::Error)]
#[error("pragma `{pragma}`: {message}")]
pub struct PragmaError {
    pub pragma: String,
    pub message: String,
}

impl PragmaError {
    fn new(pragma: &str, message: impl Into<String>) -> Self {
        Self {
            pragma: pragma.to_string(),
            message: message.into(),
        }
    }
}

impl Pragma {
    /// Parse `kind=primitive=name`.
    pub fn parse(text: &str) -> Result<Self, PragmaError> {
        let mut parts = text.splitn(3, '=');
        let kind = match parts.next() {
            Some("method") => PragmaKind::Method,
            Some("macro") => PragmaKind::Macro,
            Some(other) => {
                return Err(PragmaError::new(
                    text,
                    format!("unknown pragma kind `{other}`"),
                ));
            }
            None => return Err(PragmaError::new(text, "empty pragma")),
        };
        let number = parts
            .next()
            .ok_or_else(|| PragmaError::new(text, "missing primitive number"))?;
        let primitive: u32 = number
            .parse()
            .map_err(|_| PragmaError::new(text, format!("bad primitive number `{number}`")))?;
        let name = parts
            .next()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| PragmaError::new(text, "missing message name"))?;
        Ok(Self {
            kind,
            primitive,
            name: Arc::from(name),
        })
    }

    /// Install the bootstrap definition this pragma describes.
    pub fn apply(
        &self,
        runtime: &Arc<Runtime>,
        primitives: &PrimitiveRegistry,
    ) -> Result<(), PragmaError> {
        let function = primitives.function_for(self.primitive).ok_or_else(|| {
            PragmaError::new(
                &self.render(),
                format!("primitive {} is not registered", self.primitive),
            )
        })?;
        let signature = FunctionType::new(function.params.clone(), function.result.clone());
        let outcome = match self.kind {
            PragmaKind::Method => runtime
                .add_method_definition(&self.name, signature, DefinitionBody::Function(function))
                .map(|_| ()),
            PragmaKind::Macro => runtime
                .add_macro(
                    &self.name,
                    MacroDefinition {
                        signature,
                        body: function,
                        prefix_functions: Vec::new(),
                    },
                )
                .map(|_| ()),
        };
        outcome.map_err(|error| PragmaError::new(&self.render(), error.to_string()))
    }

    fn render(&self) -> String {
        let kind = match self.kind {
            PragmaKind::Method => "method",
            PragmaKind::Macro => "macro",
        };
        format!("{kind}={}={}", self.primitive, self.name)
    }
}
