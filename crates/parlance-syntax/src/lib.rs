//! Syntax data model and lexical scanning for parlance.
//!
//! This crate provides everything the parsing engine consumes and produces:
//! - `source` - decoded source text with line/column accounting
//! - `token` - the immutable scanned token
//! - `value` - runtime values carried by literal tokens and evaluation
//! - `types` - the type lattice used for signatures and restrictions
//! - `phrase` - the abstract syntax produced by parsing
//! - `scanner` - the user-extensible lexical scanner and bootstrap lexers

pub mod phrase;
pub mod scanner;
pub mod source;
pub mod token;
pub mod types;
pub mod value;

#[cfg(test)]
mod phrase_tests;
#[cfg(test)]
mod source_tests;
#[cfg(test)]
mod types_tests;

pub use phrase::{Declaration, DeclarationKind, Phrase, PhrasePrinter};
pub use scanner::{
    CandidateSet, Lexer, LexerBody, LexerFailure, LexerRegistry, LexicalScanner,
};
pub use source::{DecodeError, SourceText};
pub use token::{Token, TokenKind};
pub use value::{AtomId, FunctionBody, FunctionValue, Value};
pub use types::{FunctionType, IntegerRange, SizeRange, TupleType, Type};
