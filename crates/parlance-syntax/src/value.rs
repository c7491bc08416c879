//! Runtime values.
//!
//! Values appear in three places: attached to literal tokens, produced by
//! parse-time evaluation (module-scope arguments, semantic restrictions,
//! macros), and executed as top-level statements. Functions compare by
//! identity; everything else compares structurally.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::phrase::{Declaration, Phrase};
use crate::types::{Type, TupleType};

/// Identity of an atom (a true name minted by a module).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct AtomId(pub u32);

/// The body of a function value.
#[derive(Clone, Debug)]
pub enum FunctionBody {
    /// Backed by a numbered primitive from the injected registry.
    Primitive(u32),
    /// Backed by a compiled block phrase.
    Phrase {
        parameters: Vec<Arc<Declaration>>,
        body: Arc<Phrase>,
    },
}

/// A function value: signature plus body. Compared by identity.
#[derive(Clone, Debug)]
pub struct FunctionValue {
    pub name: Arc<str>,
    pub params: Vec<Type>,
    pub result: Type,
    pub body: FunctionBody,
}

impl FunctionValue {
    pub fn primitive(name: &str, params: Vec<Type>, result: Type, number: u32) -> Self {
        Self {
            name: Arc::from(name),
            params,
            result,
            body: FunctionBody::Primitive(number),
        }
    }

    pub fn signature(&self) -> Type {
        Type::function(self.params.clone(), self.result.clone())
    }
}

/// A runtime value.
#[derive(Clone, Debug)]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    Str(Arc<str>),
    Char(char),
    Tuple(Vec<Value>),
    Atom(AtomId),
    Function(Arc<FunctionValue>),
    Phrase(Arc<Phrase>),
    /// A type as a first-class value.
    Type(Type),
}

impl Value {
    /// The most specific type of this value. Integer values yield their
    /// singleton range so semantic restrictions can see exact literals.
    pub fn type_of(&self) -> Type {
        match self {
            Value::Boolean(_) => Type::Boolean,
            Value::Integer(n) => Type::exact_integer(*n),
            Value::Str(_) => Type::Str,
            Value::Char(_) => Type::Character,
            Value::Tuple(elements) => {
                Type::Tuple(TupleType::fixed(elements.iter().map(Value::type_of).collect()))
            }
            Value::Atom(_) => Type::Atom,
            Value::Function(function) => {
                Type::function(function.params.clone(), function.result.clone())
            }
            Value::Phrase(phrase) => Type::phrase_yielding(phrase.expression_type()),
            Value::Type(_) => Type::Meta,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Atom(a), Value::Atom(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),
            (Value::Phrase(a), Value::Phrase(b)) => a == b,
            (Value::Type(a), Value::Type(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Boolean(b) => b.hash(state),
            Value::Integer(n) => n.hash(state),
            Value::Str(s) => s.hash(state),
            Value::Char(c) => c.hash(state),
            Value::Tuple(elements) => elements.hash(state),
            Value::Atom(id) => id.hash(state),
            Value::Function(f) => (Arc::as_ptr(f) as usize).hash(state),
            Value::Phrase(p) => p.hash(state),
            Value::Type(t) => t.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Char(c) => write!(f, "¢{c}"),
            Value::Tuple(elements) => {
                write!(f, "<")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{element}")?;
                }
                write!(f, ">")
            }
            Value::Atom(id) => write!(f, "atom#{}", id.0),
            Value::Function(function) => write!(f, "[{}]", function.name),
            Value::Phrase(phrase) => write!(f, "{phrase}"),
            Value::Type(t) => write!(f, "{t}"),
        }
    }
}
