//! Phrases: the abstract syntax produced by parsing.
//!
//! Phrases are immutable and shared (`Arc`) because the fragment cache
//! replays them to every parse attempt that reaches the same state. They
//! compare structurally; equal-state duplicate solutions are suppressed by
//! that comparison.

use std::fmt;
use std::sync::Arc;

use parlance_core::Symbol;

use crate::token::Token;
use crate::types::Type;
use crate::value::Value;

/// What a declaration introduces.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum DeclarationKind {
    /// A block argument.
    Argument,
    /// A local variable (assignable).
    LocalVariable,
    /// A local constant.
    LocalConstant,
    /// A module-scope variable.
    ModuleVariable,
    /// A module-scope constant.
    ModuleConstant,
}

impl DeclarationKind {
    pub fn is_assignable(self) -> bool {
        matches!(
            self,
            DeclarationKind::LocalVariable | DeclarationKind::ModuleVariable
        )
    }

    pub fn is_module_scoped(self) -> bool {
        matches!(
            self,
            DeclarationKind::ModuleVariable | DeclarationKind::ModuleConstant
        )
    }
}

/// A name binding introduced into some scope.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Declaration {
    pub name: Arc<str>,
    pub kind: DeclarationKind,
    pub declared_type: Type,
    /// The token that introduced the name, when one exists.
    pub token: Option<Token>,
}

impl Declaration {
    pub fn new(name: &str, kind: DeclarationKind, declared_type: Type) -> Self {
        Self {
            name: Arc::from(name),
            kind,
            declared_type,
            token: None,
        }
    }

    pub fn with_token(mut self, token: Token) -> Self {
        self.token = Some(token);
        self
    }
}

/// An abstract syntax node.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Phrase {
    /// A literal value read directly from a token.
    Literal { token: Token, value: Value },

    /// A use of a declared name.
    VariableUse {
        declaration: Arc<Declaration>,
        token: Token,
    },

    /// A reference (`↑`) to an assignable declaration.
    Reference {
        declaration: Arc<Declaration>,
        token: Token,
    },

    /// A completed message send.
    Send {
        message: Symbol,
        arguments: Vec<Arc<Phrase>>,
        return_type: Type,
    },

    /// A list assembled by a repeating group.
    List { elements: Vec<Arc<Phrase>> },

    /// A block expression; evaluates to a function value.
    Block {
        arguments: Vec<Arc<Declaration>>,
        statements: Vec<Arc<Phrase>>,
        result_type: Type,
    },

    /// A declaration statement, with its initializer when present.
    Declaration {
        declaration: Arc<Declaration>,
        initializer: Option<Arc<Phrase>>,
    },

    /// An assignment statement.
    Assignment {
        target: Arc<Declaration>,
        value: Arc<Phrase>,
    },

    /// The output of a macro, wrapping what the macro body returned.
    MacroSubstitution {
        message: Symbol,
        replacement: Arc<Phrase>,
    },
}

impl Phrase {
    /// A literal phrase for a token that carries a value.
    pub fn literal(token: Token) -> Option<Self> {
        let value = token.value()?.clone();
        Some(Phrase::Literal { token, value })
    }

    /// A synthetic literal with no originating token text beyond `lexeme`.
    pub fn synthetic_literal(value: Value, position: u32, line: u32) -> Self {
        let token = Token::literal(value.to_string(), position, line, value.clone());
        Phrase::Literal { token, value }
    }

    /// The static type this phrase yields when evaluated.
    pub fn expression_type(&self) -> Type {
        match self {
            Phrase::Literal { value, .. } => value.type_of(),
            Phrase::VariableUse { declaration, .. } => declaration.declared_type.clone(),
            Phrase::Reference { declaration, .. } => declaration.declared_type.clone(),
            Phrase::Send { return_type, .. } => return_type.clone(),
            Phrase::List { elements } => Type::tuple_of(
                elements
                    .iter()
                    .map(|element| element.expression_type())
                    .collect(),
            ),
            Phrase::Block {
                arguments,
                result_type,
                ..
            } => Type::function(
                arguments
                    .iter()
                    .map(|argument| argument.declared_type.clone())
                    .collect(),
                result_type.clone(),
            ),
            Phrase::Declaration { .. } | Phrase::Assignment { .. } => Type::Top,
            Phrase::MacroSubstitution { replacement, .. } => replacement.expression_type(),
        }
    }

    /// Short name of the variant, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Phrase::Literal { .. } => "literal",
            Phrase::VariableUse { .. } => "variable use",
            Phrase::Reference { .. } => "variable reference",
            Phrase::Send { .. } => "send",
            Phrase::List { .. } => "list",
            Phrase::Block { .. } => "block",
            Phrase::Declaration { .. } => "declaration",
            Phrase::Assignment { .. } => "assignment",
            Phrase::MacroSubstitution { .. } => "macro substitution",
        }
    }

    /// Child phrases in order, for lockstep structural walks.
    pub fn children(&self) -> Vec<&Arc<Phrase>> {
        match self {
            Phrase::Literal { .. }
            | Phrase::VariableUse { .. }
            | Phrase::Reference { .. } => Vec::new(),
            Phrase::Send { arguments, .. } => arguments.iter().collect(),
            Phrase::List { elements } => elements.iter().collect(),
            Phrase::Block { statements, .. } => statements.iter().collect(),
            Phrase::Declaration { initializer, .. } => initializer.iter().collect(),
            Phrase::Assignment { value, .. } => vec![value],
            Phrase::MacroSubstitution { replacement, .. } => vec![replacement],
        }
    }

    /// The first token position covered by this phrase, if any token is.
    pub fn start_position(&self) -> Option<u32> {
        match self {
            Phrase::Literal { token, .. }
            | Phrase::VariableUse { token, .. }
            | Phrase::Reference { token, .. } => Some(token.start()),
            _ => self
                .children()
                .iter()
                .filter_map(|child| child.start_position())
                .min(),
        }
    }
}

/// Rendering used by ambiguity reports and traces. Message names print
/// with their underscores intact, followed by the argument phrases.
pub struct PhrasePrinter<'a> {
    pub phrase: &'a Phrase,
    pub resolve: &'a dyn Fn(Symbol) -> Arc<str>,
}

impl fmt::Display for PhrasePrinter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        print_phrase(self.phrase, self.resolve, f)
    }
}

fn print_phrase(
    phrase: &Phrase,
    resolve: &dyn Fn(Symbol) -> Arc<str>,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    match phrase {
        Phrase::Literal { value, .. } => write!(f, "{value}"),
        Phrase::VariableUse { declaration, .. } => write!(f, "{}", declaration.name),
        Phrase::Reference { declaration, .. } => write!(f, "↑{}", declaration.name),
        Phrase::Send {
            message, arguments, ..
        } => {
            write!(f, "{}(", resolve(*message))?;
            for (i, argument) in arguments.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                print_phrase(argument, resolve, f)?;
            }
            write!(f, ")")
        }
        Phrase::List { elements } => {
            write!(f, "<")?;
            for (i, element) in elements.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                print_phrase(element, resolve, f)?;
            }
            write!(f, ">")
        }
        Phrase::Block {
            arguments,
            statements,
            ..
        } => {
            write!(f, "[")?;
            for (i, argument) in arguments.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{} : {}", argument.name, argument.declared_type)?;
            }
            if !arguments.is_empty() {
                write!(f, " |")?;
            }
            for statement in statements {
                write!(f, " ")?;
                print_phrase(statement, resolve, f)?;
                write!(f, ";")?;
            }
            write!(f, " ]")
        }
        Phrase::Declaration {
            declaration,
            initializer,
        } => {
            write!(f, "{} : {}", declaration.name, declaration.declared_type)?;
            if let Some(init) = initializer {
                write!(f, " := ")?;
                print_phrase(init, resolve, f)?;
            }
            Ok(())
        }
        Phrase::Assignment { target, value } => {
            write!(f, "{} := ", target.name)?;
            print_phrase(value, resolve, f)
        }
        Phrase::MacroSubstitution { replacement, .. } => print_phrase(replacement, resolve, f),
    }
}

impl fmt::Display for Phrase {
    /// Fallback rendering with raw symbol numbers; prefer `PhrasePrinter`
    /// when an interner is at hand.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let resolve = |sym: Symbol| -> Arc<str> { Arc::from(format!("message#{}", sym.as_u32())) };
        print_phrase(self, &resolve, f)
    }
}
