//! Tests for signature checking.

use parlance_core::Interner;
use parlance_syntax::{FunctionType, IntegerRange, Type};

use super::error::MessageError;
use super::splitter::MessageSplitter;

fn check(name: &str, params: Vec<Type>, result: Type) -> Result<(), MessageError> {
    let mut interner = Interner::new();
    let splitter = MessageSplitter::split(name, &mut interner).expect("splits");
    splitter.check_implementation_signature(&FunctionType::new(params, result), None)
}

#[test]
fn infix_signature_matches() {
    assert_eq!(
        check("_+_", vec![Type::integer(), Type::integer()], Type::integer()),
        Ok(())
    );
}

#[test]
fn arity_mismatch() {
    assert_eq!(
        check("_+_", vec![Type::integer()], Type::integer()),
        Err(MessageError::IncorrectNumberOfArguments {
            expected: 2,
            given: 1
        })
    );
}

#[test]
fn top_is_not_an_argument_type() {
    assert_eq!(
        check("print_", vec![Type::Top], Type::Top),
        Err(MessageError::IncorrectArgumentType)
    );
}

#[test]
fn group_takes_a_tuple() {
    assert_eq!(
        check(
            "«_‡,»",
            vec![Type::list_of(Type::integer())],
            Type::integer()
        ),
        Ok(())
    );
    assert_eq!(
        check("«_‡,»", vec![Type::integer()], Type::integer()),
        Err(MessageError::IncorrectTypeForGroup)
    );
}

#[test]
fn complex_group_takes_tuples_of_tuples() {
    let inner = Type::tuple_of(vec![Type::integer(), Type::Str]);
    assert_eq!(
        check("«_:_»", vec![Type::list_of(inner)], Type::Top).is_ok(),
        true
    );
    assert_eq!(
        check("«_:_»", vec![Type::list_of(Type::integer())], Type::Top),
        Err(MessageError::IncorrectTypeForComplexGroup)
    );
}

#[test]
fn counter_takes_whole_numbers() {
    assert_eq!(
        check("«very‡,»# good", vec![Type::whole_number()], Type::Top),
        Ok(())
    );
    assert_eq!(
        check("«very‡,»# good", vec![Type::integer()], Type::Top),
        Err(MessageError::IncorrectTypeForCountingGroup)
    );
}

#[test]
fn optional_takes_boolean() {
    assert_eq!(
        check("«a|an»?_", vec![Type::Boolean, Type::Str], Type::Top),
        Ok(())
    );
    assert_eq!(
        check("«a|an»?_", vec![Type::integer(), Type::Str], Type::Top),
        Err(MessageError::IncorrectTypeForBooleanGroup)
    );
}

#[test]
fn numbered_choice_covers_exactly_its_range() {
    let exact = Type::Integer(IntegerRange::inclusive(1, 3));
    assert_eq!(check("«red|green|blue»!", vec![exact], Type::Top), Ok(()));
    assert_eq!(
        check("«red|green|blue»!", vec![Type::integer()], Type::Top),
        Err(MessageError::IncorrectTypeForNumberedChoice)
    );
}

#[test]
fn prefix_function_takes_one_tuple() {
    let mut interner = Interner::new();
    let splitter = MessageSplitter::split("for_§do_", &mut interner).expect("splits");
    let good = FunctionType::new(vec![Type::list_of(Type::Top)], Type::Top);
    assert_eq!(
        splitter.check_implementation_signature(&good, Some(1)),
        Ok(())
    );
    let bad = FunctionType::new(vec![Type::integer()], Type::Top);
    assert_eq!(
        splitter.check_implementation_signature(&bad, Some(1)),
        Err(MessageError::IncorrectArgumentType)
    );
    let missing = FunctionType::new(vec![Type::list_of(Type::Top)], Type::Top);
    assert!(
        splitter
            .check_implementation_signature(&missing, Some(2))
            .is_err()
    );
}
