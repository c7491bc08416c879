//! End-to-end tests of the parsing engine against small grammars.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use parlance_syntax::{
    Declaration, DeclarationKind, FunctionBody, FunctionType, FunctionValue, LexicalScanner,
    Phrase, SourceText, Type, Value, scanner::body_registry,
};

use super::engine::{Engine, EngineConfig, SolutionAction};
use super::error::ParseProblem;
use super::interpreter::{CodeGenError, CodeGenerator, Interpreter, RunError};
use super::method::{DefinitionBody, SemanticRestriction};
use super::parse_state::ParseState;
use super::runtime::Runtime;
use super::scope::ScopeMap;

type Primitive = Box<dyn Fn(&[Value]) -> Result<Value, RunError> + Send + Sync>;

/// Runs primitive-backed functions from a closure table and evaluates
/// literal-only phrase bodies (enough for parse-time evaluation tests).
#[derive(Default)]
struct TestInterpreter {
    primitives: Mutex<HashMap<u32, Primitive>>,
}

impl TestInterpreter {
    fn with_primitive(
        self,
        number: u32,
        body: impl Fn(&[Value]) -> Result<Value, RunError> + Send + Sync + 'static,
    ) -> Self {
        self.primitives
            .lock()
            .expect("primitive table poisoned")
            .insert(number, Box::new(body));
        self
    }

    fn eval(&self, phrase: &Phrase) -> Result<Value, RunError> {
        match phrase {
            Phrase::Literal { value, .. } => Ok(value.clone()),
            Phrase::Block { statements, .. } => statements
                .last()
                .map(|s| self.eval(s))
                .unwrap_or(Err(RunError::failed("empty block"))),
            other => Err(RunError::failed(format!(
                "test interpreter cannot evaluate a {}",
                other.kind_name()
            ))),
        }
    }
}

impl Interpreter for TestInterpreter {
    fn run(
        &self,
        function: &FunctionValue,
        arguments: &[Value],
        _runtime: &Runtime,
    ) -> Result<Value, RunError> {
        match &function.body {
            FunctionBody::Primitive(number) => {
                let primitives = self.primitives.lock().expect("primitive table poisoned");
                match primitives.get(number) {
                    Some(primitive) => primitive(arguments),
                    None => Err(RunError::failed(format!("unknown primitive {number}"))),
                }
            }
            FunctionBody::Phrase { body, .. } => self.eval(body),
        }
    }
}

struct TestCodeGen;

impl CodeGenerator for TestCodeGen {
    fn generate(&self, block: &Arc<Phrase>) -> Result<Arc<FunctionValue>, CodeGenError> {
        let Phrase::Block {
            arguments,
            result_type,
            ..
        } = &**block
        else {
            return Err(CodeGenError::new("not a block"));
        };
        Ok(Arc::new(FunctionValue {
            name: Arc::from("test block"),
            params: arguments.iter().map(|a| a.declared_type.clone()).collect(),
            result: result_type.clone(),
            body: FunctionBody::Phrase {
                parameters: arguments.clone(),
                body: Arc::clone(block),
            },
        }))
    }
}

fn define(runtime: &Arc<Runtime>, name: &str, params: Vec<Type>, result: Type) {
    let function = Arc::new(FunctionValue::primitive(name, params.clone(), result.clone(), 0));
    runtime
        .add_method_definition(
            name,
            FunctionType::new(params, result),
            DefinitionBody::Function(function),
        )
        .expect("definition must install");
}

fn engine_for(source: &str, runtime: Arc<Runtime>, interpreter: TestInterpreter) -> Engine {
    let scanner = Arc::new(LexicalScanner::new(
        Arc::new(SourceText::new("Test", source)),
        Arc::new(body_registry()),
    ));
    Engine::new(EngineConfig::new(
        runtime,
        scanner,
        Arc::new(interpreter),
        Arc::new(TestCodeGen),
    ))
}

/// All expression solutions at a state, in discovery order.
fn parse_all(engine: &Engine, state: ParseState) -> Vec<(ParseState, Arc<Phrase>)> {
    let solutions: Arc<Mutex<Vec<(ParseState, Arc<Phrase>)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&solutions);
    let action: SolutionAction = Arc::new(move |_engine, end, phrase| {
        sink.lock()
            .expect("sink poisoned")
            .push((end.clone(), Arc::clone(phrase)));
    });
    engine.schedule(move |e| e.parse_expression(state, action));
    engine.workshop().run(engine);
    let out = solutions.lock().expect("sink poisoned").clone();
    out
}

fn sends_in(
    solutions: &[(ParseState, Arc<Phrase>)],
    runtime: &Runtime,
    name: &str,
) -> Vec<(u32, Arc<Phrase>)> {
    let symbol = runtime.lookup_symbol(name).expect("message interned");
    solutions
        .iter()
        .filter(|(_, phrase)| {
            matches!(&**phrase, Phrase::Send { message, .. } if *message == symbol)
        })
        .map(|(state, phrase)| (state.position, Arc::clone(phrase)))
        .collect()
}

#[test]
fn infix_send_parses_alongside_its_prefixes() {
    let runtime = Runtime::new();
    define(&runtime, "_+_", vec![Type::integer(), Type::integer()], Type::integer());
    let engine = engine_for("1+2", Arc::clone(&runtime), TestInterpreter::default());

    let solutions = parse_all(&engine, ParseState::new(0, ScopeMap::empty()));
    // The bare literal is a solution, and so is the full send.
    assert!(
        solutions
            .iter()
            .any(|(s, p)| s.position == 1 && matches!(&**p, Phrase::Literal { .. }))
    );
    let sends = sends_in(&solutions, &runtime, "_+_");
    assert_eq!(sends.len(), 1);
    let (end, phrase) = &sends[0];
    assert_eq!(*end, 3);
    let Phrase::Send {
        arguments,
        return_type,
        ..
    } = &**phrase
    else {
        unreachable!()
    };
    assert_eq!(arguments.len(), 2);
    assert!(matches!(&*arguments[0], Phrase::Literal { value, .. }
        if *value == Value::Integer(1)));
    assert!(matches!(&*arguments[1], Phrase::Literal { value, .. }
        if *value == Value::Integer(2)));
    assert_eq!(*return_type, Type::integer());
}

#[test]
fn outermost_statement_is_unique_and_top_valued() {
    let runtime = Runtime::new();
    define(&runtime, "print_", vec![Type::Any], Type::Top);
    define(&runtime, "_+_", vec![Type::integer(), Type::integer()], Type::integer());
    let engine = engine_for("print 1+2;", Arc::clone(&runtime), TestInterpreter::default());

    let solution = engine
        .parse_outermost_statement(&ParseState::new(0, ScopeMap::empty()))
        .expect("one statement");
    assert_eq!(solution.end_state.position, 9);
    let Phrase::Send {
        message, arguments, ..
    } = &*solution.phrase
    else {
        panic!("expected a send, got {}", solution.phrase.kind_name());
    };
    assert_eq!(*message, runtime.lookup_symbol("print_").expect("interned"));
    assert!(matches!(&*arguments[0], Phrase::Send { .. }));
}

#[test]
fn repeated_group_builds_a_flat_list() {
    let runtime = Runtime::new();
    define(
        &runtime,
        "(«_‡,»)",
        vec![Type::list_of(Type::Any)],
        Type::list_of(Type::integer()),
    );
    let engine = engine_for("(1,2,3)", Arc::clone(&runtime), TestInterpreter::default());

    let solutions = parse_all(&engine, ParseState::new(0, ScopeMap::empty()));
    let sends = sends_in(&solutions, &runtime, "(«_‡,»)");
    assert_eq!(sends.len(), 1);
    let (end, phrase) = &sends[0];
    assert_eq!(*end, 7);
    let Phrase::Send { arguments, .. } = &**phrase else {
        unreachable!()
    };
    assert_eq!(arguments.len(), 1);
    let Phrase::List { elements } = &*arguments[0] else {
        panic!("expected a list argument");
    };
    assert_eq!(elements.len(), 3);
    assert!(
        elements
            .iter()
            .all(|e| matches!(&**e, Phrase::Literal { .. }))
    );
}

#[test]
fn counting_group_yields_its_iteration_count() {
    let runtime = Runtime::new();
    define(
        &runtime,
        "(«very‡,»# good)",
        vec![Type::whole_number()],
        Type::Top,
    );
    let engine = engine_for(
        "(very,very,very good)",
        Arc::clone(&runtime),
        TestInterpreter::default(),
    );

    let solution = engine
        .parse_outermost_statement(&ParseState::new(0, ScopeMap::empty()))
        .expect("one statement");
    let Phrase::Send { arguments, .. } = &*solution.phrase else {
        panic!("expected a send");
    };
    assert_eq!(arguments.len(), 1);
    assert!(matches!(&*arguments[0], Phrase::Literal { value, .. }
        if *value == Value::Integer(3)));
}

#[test]
fn optional_alternation_pushes_booleans() {
    let runtime = Runtime::new();
    define(
        &runtime,
        "«a|an»?_",
        vec![Type::Boolean, Type::Any],
        Type::Top,
    );
    let x = Arc::new(Declaration::new(
        "x",
        DeclarationKind::LocalVariable,
        Type::integer(),
    ));

    let engine = engine_for("an x", Arc::clone(&runtime), TestInterpreter::default());
    let scope = ScopeMap::empty().with(Arc::clone(&x));
    let solution = engine
        .parse_outermost_statement(&ParseState::new(0, scope.clone()))
        .expect("one statement");
    let Phrase::Send { arguments, .. } = &*solution.phrase else {
        panic!("expected a send");
    };
    assert!(matches!(&*arguments[0], Phrase::Literal { value, .. }
        if *value == Value::Boolean(true)));
    assert!(matches!(&*arguments[1], Phrase::VariableUse { .. }));

    let engine = engine_for("x", runtime, TestInterpreter::default());
    let solution = engine
        .parse_outermost_statement(&ParseState::new(0, scope))
        .expect("one statement");
    let Phrase::Send { arguments, .. } = &*solution.phrase else {
        panic!("expected a send");
    };
    assert!(matches!(&*arguments[0], Phrase::Literal { value, .. }
        if *value == Value::Boolean(false)));
}

#[test]
fn longest_form_wins_when_it_reaches_the_boundary() {
    let runtime = Runtime::new();
    define(&runtime, "if_then_", vec![Type::Boolean, Type::Any], Type::Top);
    define(
        &runtime,
        "if_then_else_",
        vec![Type::Boolean, Type::Any, Type::Any],
        Type::Top,
    );
    define(&runtime, "p", vec![], Type::Boolean);
    define(&runtime, "a", vec![], Type::integer());
    define(&runtime, "b", vec![], Type::integer());

    let engine = engine_for(
        "if p then a else b;",
        Arc::clone(&runtime),
        TestInterpreter::default(),
    );
    let solution = engine
        .parse_outermost_statement(&ParseState::new(0, ScopeMap::empty()))
        .expect("unambiguous");
    let Phrase::Send {
        message, arguments, ..
    } = &*solution.phrase
    else {
        panic!("expected a send");
    };
    assert_eq!(
        *message,
        runtime.lookup_symbol("if_then_else_").expect("interned")
    );
    assert_eq!(arguments.len(), 3);
}

#[test]
fn genuine_ambiguity_is_reported_with_discriminants() {
    let runtime = Runtime::new();
    define(&runtime, "hello world", vec![], Type::Top);
    define(&runtime, "hello_", vec![Type::Any], Type::Top);
    define(&runtime, "world", vec![], Type::integer());

    let engine = engine_for("hello world", Arc::clone(&runtime), TestInterpreter::default());
    let problem = engine
        .parse_outermost_statement(&ParseState::new(0, ScopeMap::empty()))
        .expect_err("must be ambiguous");
    let ParseProblem::Ambiguous { first, second, .. } = problem else {
        panic!("expected ambiguity, got {problem:?}");
    };
    let mut pair = [first, second];
    pair.sort();
    assert!(pair[0].contains("hello world") || pair[1].contains("hello world"));
    assert!(pair[0].contains("hello_") || pair[1].contains("hello_"));
}

#[test]
fn semantic_restriction_rejects_with_its_message() {
    let runtime = Runtime::new();
    define(&runtime, "print_", vec![Type::Any], Type::Top);
    define(&runtime, "_+_", vec![Type::integer(), Type::integer()], Type::integer());
    let restriction = SemanticRestriction {
        description: Arc::from("no zero sums"),
        function: Arc::new(FunctionValue::primitive(
            "_+_ restriction",
            vec![Type::Meta, Type::Meta],
            Type::Meta,
            7,
        )),
    };
    runtime
        .add_semantic_restriction("_+_", restriction)
        .expect("restriction installs");

    let zero = Type::exact_integer(0);
    let interpreter = TestInterpreter::default().with_primitive(7, move |args| {
        match args {
            [Value::Type(a), Value::Type(b)] if *a == zero && *b == zero => {
                Err(RunError::rejected("the sum of two zeroes to be avoided"))
            }
            _ => Ok(Value::Type(Type::integer())),
        }
    });

    let engine = engine_for("print 0+0;", Arc::clone(&runtime), interpreter);
    let problem = engine
        .parse_outermost_statement(&ParseState::new(0, ScopeMap::empty()))
        .expect_err("restriction must reject");
    let ParseProblem::NoSolution {
        position,
        expectations,
    } = problem
    else {
        panic!("expected a parse failure, got {problem:?}");
    };
    // The rejection lands on the `+`, the first token the send consumed.
    assert_eq!(position, 7);
    assert!(
        expectations
            .iter()
            .any(|e| e.contains("the sum of two zeroes to be avoided")),
        "expectations: {expectations:?}"
    );
}

#[test]
fn semantic_restrictions_narrow_the_return_type() {
    let runtime = Runtime::new();
    define(&runtime, "_+_", vec![Type::integer(), Type::integer()], Type::integer());
    let restriction = SemanticRestriction {
        description: Arc::from("whole sums"),
        function: Arc::new(FunctionValue::primitive(
            "_+_ restriction",
            vec![Type::Meta, Type::Meta],
            Type::Meta,
            8,
        )),
    };
    runtime
        .add_semantic_restriction("_+_", restriction)
        .expect("restriction installs");
    let interpreter = TestInterpreter::default()
        .with_primitive(8, |_| Ok(Value::Type(Type::whole_number())));

    let engine = engine_for("1+2", Arc::clone(&runtime), interpreter);
    let solutions = parse_all(&engine, ParseState::new(0, ScopeMap::empty()));
    let sends = sends_in(&solutions, &runtime, "_+_");
    assert_eq!(sends.len(), 1);
    let Phrase::Send { return_type, .. } = &*sends[0].1 else {
        unreachable!()
    };
    assert_eq!(*return_type, Type::whole_number());
}

#[test]
fn grammatical_restrictions_prune_at_the_argument() {
    let runtime = Runtime::new();
    define(&runtime, "_+_", vec![Type::integer(), Type::integer()], Type::integer());

    // Unrestricted, both associations of `1+2+3` parse.
    let engine = engine_for("1+2+3", Arc::clone(&runtime), TestInterpreter::default());
    let solutions = parse_all(&engine, ParseState::new(0, ScopeMap::empty()));
    let full: Vec<_> = sends_in(&solutions, &runtime, "_+_")
        .into_iter()
        .filter(|(end, _)| *end == 5)
        .collect();
    assert_eq!(full.len(), 2);

    // Excluding `_+_` from its own right operand leaves left association.
    runtime
        .add_grammatical_restriction("_+_", 2, &["_+_"])
        .expect("restriction installs");
    let engine = engine_for("1+2+3", Arc::clone(&runtime), TestInterpreter::default());
    let solutions = parse_all(&engine, ParseState::new(0, ScopeMap::empty()));
    let full: Vec<_> = sends_in(&solutions, &runtime, "_+_")
        .into_iter()
        .filter(|(end, _)| *end == 5)
        .collect();
    assert_eq!(full.len(), 1);
    let Phrase::Send { arguments, .. } = &*full[0].1 else {
        unreachable!()
    };
    assert!(matches!(&*arguments[0], Phrase::Send { .. }));
    assert!(matches!(&*arguments[1], Phrase::Literal { .. }));
}

#[test]
fn module_scope_arguments_are_isolated_and_evaluated() {
    let runtime = Runtime::new();
    define(&runtime, "fetch_†", vec![Type::integer()], Type::Top);
    let x = Arc::new(Declaration::new(
        "x",
        DeclarationKind::LocalVariable,
        Type::integer(),
    ));
    let scope = ScopeMap::empty().with(x);

    // A literal evaluates at parse time and lands as a literal argument.
    let engine = engine_for("fetch 5", Arc::clone(&runtime), TestInterpreter::default());
    let solution = engine
        .parse_outermost_statement(&ParseState::new(0, scope.clone()))
        .expect("one statement");
    let Phrase::Send { arguments, .. } = &*solution.phrase else {
        panic!("expected a send");
    };
    assert!(matches!(&*arguments[0], Phrase::Literal { value, .. }
        if *value == Value::Integer(5)));

    // A local variable is invisible to the empty evaluation scope.
    let engine = engine_for("fetch x", runtime, TestInterpreter::default());
    assert!(
        engine
            .parse_outermost_statement(&ParseState::new(0, scope))
            .is_err()
    );
}

#[test]
fn discriminant_walk_finds_the_smallest_difference() {
    use super::ambiguity::smallest_discriminant;

    let mut runtime_interner = parlance_core::Interner::new();
    let outer = runtime_interner.intern("wrap_");
    let a = Arc::new(Phrase::Send {
        message: outer,
        arguments: vec![integer_literal(1, 5)],
        return_type: Type::Top,
    });
    let b = Arc::new(Phrase::Send {
        message: outer,
        arguments: vec![integer_literal(2, 5)],
        return_type: Type::Top,
    });
    // Same message, one differing child: the walk descends to the child.
    let (x, y) = smallest_discriminant(&a, &b);
    assert!(matches!(&*x, Phrase::Literal { value, .. } if *value == Value::Integer(1)));
    assert!(matches!(&*y, Phrase::Literal { value, .. } if *value == Value::Integer(2)));
}

fn integer_literal(n: i64, position: u32) -> Arc<Phrase> {
    Arc::new(Phrase::synthetic_literal(Value::Integer(n), position, 1))
}

#[test]
fn memoization_replays_identical_solution_sets() {
    let runtime = Runtime::new();
    define(&runtime, "_+_", vec![Type::integer(), Type::integer()], Type::integer());
    let engine = engine_for("1+2+3", Arc::clone(&runtime), TestInterpreter::default());

    let state = ParseState::new(0, ScopeMap::empty());
    let first: Vec<_> = parse_all(&engine, state.clone());
    assert!(!engine.fragments.is_empty());
    let second: Vec<_> = parse_all(&engine, state);
    // The replayed set matches the originally discovered set exactly.
    assert_eq!(first.len(), second.len());
    for solution in &first {
        assert!(second.contains(solution));
    }
}
