//! Serializable mirror of phrases.
//!
//! The module stream must outlive the compiler's in-memory structures,
//! so phrases are lowered to a self-contained form: message names become
//! strings, declarations carry their rendered types, macro substitutions
//! collapse to their replacements.

use std::sync::Arc;

use parlance_core::Symbol;
use parlance_syntax::{DeclarationKind, Phrase, Value};

/// A serializable value.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum IrValue {
    Boolean(bool),
    Integer(i64),
    Str(String),
    Char(char),
    Tuple(Vec<IrValue>),
    Atom(u32),
    /// A type, kept by its rendering.
    Type(String),
    /// A function, kept by name; bodies re-resolve on load.
    Function(String),
    Phrase(Box<IrPhrase>),
}

impl IrValue {
    fn lower(value: &Value) -> Self {
        match value {
            Value::Boolean(b) => IrValue::Boolean(*b),
            Value::Integer(n) => IrValue::Integer(*n),
            Value::Str(s) => IrValue::Str(s.to_string()),
            Value::Char(c) => IrValue::Char(*c),
            Value::Tuple(elements) => {
                IrValue::Tuple(elements.iter().map(IrValue::lower).collect())
            }
            Value::Atom(id) => IrValue::Atom(id.0),
            Value::Type(t) => IrValue::Type(t.to_string()),
            Value::Function(f) => IrValue::Function(f.name.to_string()),
            Value::Phrase(p) => IrValue::Phrase(Box::new(lower_phrase(p, &|s| {
                Arc::from(format!("message#{}", s.as_u32()))
            }))),
        }
    }
}

/// What a declaration introduced, in the stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum IrDeclarationKind {
    Argument,
    Variable,
    Constant,
}

impl From<DeclarationKind> for IrDeclarationKind {
    fn from(kind: DeclarationKind) -> Self {
        match kind {
            DeclarationKind::Argument => IrDeclarationKind::Argument,
            DeclarationKind::LocalVariable | DeclarationKind::ModuleVariable => {
                IrDeclarationKind::Variable
            }
            DeclarationKind::LocalConstant | DeclarationKind::ModuleConstant => {
                IrDeclarationKind::Constant
            }
        }
    }
}

/// A serializable phrase.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum IrPhrase {
    Literal(IrValue),
    VariableUse {
        name: String,
    },
    Reference {
        name: String,
    },
    Send {
        message: String,
        arguments: Vec<IrPhrase>,
    },
    List {
        elements: Vec<IrPhrase>,
    },
    Block {
        arguments: Vec<(String, String)>,
        statements: Vec<IrPhrase>,
    },
    Declaration {
        name: String,
        kind: IrDeclarationKind,
        declared_type: String,
        initializer: Option<Box<IrPhrase>>,
    },
    Assignment {
        target: String,
        value: Box<IrPhrase>,
    },
}

/// Lower a phrase, resolving message symbols through `resolve`.
pub fn lower_phrase(phrase: &Phrase, resolve: &dyn Fn(Symbol) -> Arc<str>) -> IrPhrase {
    match phrase {
        Phrase::Literal { value, .. } => IrPhrase::Literal(IrValue::lower(value)),
        Phrase::VariableUse { declaration, .. } => IrPhrase::VariableUse {
            name: declaration.name.to_string(),
        },
        Phrase::Reference { declaration, .. } => IrPhrase::Reference {
            name: declaration.name.to_string(),
        },
        Phrase::Send {
            message, arguments, ..
        } => IrPhrase::Send {
            message: resolve(*message).to_string(),
            arguments: arguments
                .iter()
                .map(|a| lower_phrase(a, resolve))
                .collect(),
        },
        Phrase::List { elements } => IrPhrase::List {
            elements: elements.iter().map(|e| lower_phrase(e, resolve)).collect(),
        },
        Phrase::Block {
            arguments,
            statements,
            ..
        } => IrPhrase::Block {
            arguments: arguments
                .iter()
                .map(|a| (a.name.to_string(), a.declared_type.to_string()))
                .collect(),
            statements: statements
                .iter()
                .map(|s| lower_phrase(s, resolve))
                .collect(),
        },
        Phrase::Declaration {
            declaration,
            initializer,
        } => IrPhrase::Declaration {
            name: declaration.name.to_string(),
            kind: declaration.kind.into(),
            declared_type: declaration.declared_type.to_string(),
            initializer: initializer
                .as_ref()
                .map(|i| Box::new(lower_phrase(i, resolve))),
        },
        Phrase::Assignment { target, value } => IrPhrase::Assignment {
            target: target.name.to_string(),
            value: Box::new(lower_phrase(value, resolve)),
        },
        Phrase::MacroSubstitution { replacement, .. } => lower_phrase(replacement, resolve),
    }
}
