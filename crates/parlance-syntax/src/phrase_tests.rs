//! Tests for phrases.

use std::sync::Arc;

use parlance_core::{Interner, Symbol};

use super::phrase::{Declaration, DeclarationKind, Phrase, PhrasePrinter};
use super::token::Token;
use super::types::Type;
use super::value::Value;

fn integer_literal(n: i64, position: u32) -> Arc<Phrase> {
    Arc::new(Phrase::synthetic_literal(Value::Integer(n), position, 1))
}

#[test]
fn literal_types_are_singletons() {
    let phrase = integer_literal(7, 0);
    assert_eq!(phrase.expression_type(), Type::exact_integer(7));
}

#[test]
fn variable_use_takes_declared_type() {
    let declaration = Arc::new(Declaration::new(
        "x",
        DeclarationKind::LocalVariable,
        Type::Str,
    ));
    let token = Token::new(crate::token::TokenKind::Keyword, "x", 0, 1);
    let phrase = Phrase::VariableUse { declaration, token };
    assert_eq!(phrase.expression_type(), Type::Str);
}

#[test]
fn list_type_is_a_fixed_tuple() {
    let phrase = Phrase::List {
        elements: vec![integer_literal(1, 0), integer_literal(2, 2)],
    };
    assert_eq!(
        phrase.expression_type(),
        Type::tuple_of(vec![Type::exact_integer(1), Type::exact_integer(2)])
    );
}

#[test]
fn declarations_and_assignments_are_statements() {
    let declaration = Arc::new(Declaration::new(
        "x",
        DeclarationKind::ModuleVariable,
        Type::integer(),
    ));
    let decl_phrase = Phrase::Declaration {
        declaration: Arc::clone(&declaration),
        initializer: Some(integer_literal(1, 5)),
    };
    let assign_phrase = Phrase::Assignment {
        target: declaration,
        value: integer_literal(2, 9),
    };
    assert!(decl_phrase.expression_type().is_top());
    assert!(assign_phrase.expression_type().is_top());
}

#[test]
fn structural_equality_suppresses_duplicates() {
    let mut interner = Interner::new();
    let message = interner.intern("_+_");
    let a = Phrase::Send {
        message,
        arguments: vec![integer_literal(1, 0), integer_literal(2, 2)],
        return_type: Type::integer(),
    };
    let b = Phrase::Send {
        message,
        arguments: vec![integer_literal(1, 0), integer_literal(2, 2)],
        return_type: Type::integer(),
    };
    assert_eq!(a, b);
}

#[test]
fn printer_resolves_message_names() {
    let mut interner = Interner::new();
    let message = interner.intern("_+_");
    let phrase = Phrase::Send {
        message,
        arguments: vec![integer_literal(1, 0), integer_literal(2, 2)],
        return_type: Type::integer(),
    };
    let resolve = |sym: Symbol| Arc::clone(interner.resolve(sym));
    let printed = PhrasePrinter {
        phrase: &phrase,
        resolve: &resolve,
    }
    .to_string();
    assert_eq!(printed, "_+_(1, 2)");
}

#[test]
fn start_position_descends_to_first_token() {
    let phrase = Phrase::List {
        elements: vec![integer_literal(4, 8), integer_literal(5, 3)],
    };
    assert_eq!(phrase.start_position(), Some(3));
}
