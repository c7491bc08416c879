//! Tests for bootstrap pragmas.

use parlance_engine::{RunError, Runtime};
use parlance_syntax::{Type, Value};

use super::pragma::{Pragma, PragmaKind};
use super::primitives::PrimitiveRegistry;

#[test]
fn parse_method_pragma() {
    let pragma = Pragma::parse("method=160=_+_").expect("parses");
    assert_eq!(pragma.kind, PragmaKind::Method);
    assert_eq!(pragma.primitive, 160);
    assert_eq!(&*pragma.name, "_+_");
}

#[test]
fn name_may_contain_equals_like_operators() {
    let pragma = Pragma::parse("method=7=_=_").expect("parses");
    assert_eq!(&*pragma.name, "_=_");
}

#[test]
fn malformed_pragmas_are_rejected() {
    assert!(Pragma::parse("method=160").is_err());
    assert!(Pragma::parse("method=xyz=_+_").is_err());
    assert!(Pragma::parse("lexer=1=_+_").is_err());
    assert!(Pragma::parse("method=1=").is_err());
}

#[test]
fn applying_a_method_pragma_installs_a_definition() {
    let runtime = Runtime::new();
    let primitives = PrimitiveRegistry::new();
    primitives.register(
        3,
        "_+_",
        vec![Type::integer(), Type::integer()],
        Type::integer(),
        |args| match args {
            [Value::Integer(a), Value::Integer(b)] => Ok(Value::Integer(a + b)),
            _ => Err(RunError::failed("expected integers")),
        },
    );

    Pragma::parse("method=3=_+_")
        .expect("parses")
        .apply(&runtime, &primitives)
        .expect("applies");

    let plus = runtime.lookup_symbol("_+_").expect("interned");
    let method = runtime.method_named(plus).expect("method exists");
    assert_eq!(method.definitions().len(), 1);
}

#[test]
fn unregistered_primitives_are_refused() {
    let runtime = Runtime::new();
    let primitives = PrimitiveRegistry::new();
    let error = Pragma::parse("method=99=_+_")
        .expect("parses")
        .apply(&runtime, &primitives)
        .expect_err("must fail");
    assert!(error.to_string().contains("not registered"));
}

#[test]
fn macro_pragmas_demand_a_phrase_result() {
    let runtime = Runtime::new();
    let primitives = PrimitiveRegistry::new();
    primitives.register(4, "bad macro", vec![Type::phrase_yielding(Type::Any)], Type::integer(), |_| {
        Err(RunError::failed("never runs"))
    });
    let error = Pragma::parse("macro=4=expand_")
        .expect("parses")
        .apply(&runtime, &primitives)
        .expect_err("must fail");
    assert!(error.to_string().contains("phrase"));
}
