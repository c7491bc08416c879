//! Tests for the work-unit executor.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use parlance_syntax::{LexicalScanner, SourceText, scanner::body_registry};

use super::engine::{Engine, EngineConfig};
use super::error::EngineError;
use super::interpreter::{CodeGenError, CodeGenerator, Interpreter, RunError};
use super::runtime::Runtime;
use super::work::EngineLimits;

struct InertInterpreter;

impl Interpreter for InertInterpreter {
    fn run(
        &self,
        _function: &parlance_syntax::FunctionValue,
        _arguments: &[parlance_syntax::Value],
        _runtime: &Runtime,
    ) -> Result<parlance_syntax::Value, RunError> {
        Err(RunError::failed("inert interpreter"))
    }
}

struct InertCodeGen;

impl CodeGenerator for InertCodeGen {
    fn generate(
        &self,
        _block: &std::sync::Arc<parlance_syntax::Phrase>,
    ) -> Result<std::sync::Arc<parlance_syntax::FunctionValue>, CodeGenError> {
        Err(CodeGenError::new("inert code generator"))
    }
}

fn engine_with_limits(limits: EngineLimits) -> Engine {
    let runtime = Runtime::new();
    let scanner = Arc::new(LexicalScanner::new(
        Arc::new(SourceText::new("Test", "")),
        Arc::new(body_registry()),
    ));
    Engine::new(
        EngineConfig::new(
            runtime,
            scanner,
            Arc::new(InertInterpreter),
            Arc::new(InertCodeGen),
        )
        .limits(limits),
    )
}

#[test]
fn scheduled_units_run_and_may_reschedule() {
    let engine = engine_with_limits(EngineLimits::default());
    let hits = Arc::new(AtomicU32::new(0));
    let hits2 = Arc::clone(&hits);
    engine.schedule(move |e| {
        hits2.fetch_add(1, Ordering::Relaxed);
        let hits3 = Arc::clone(&hits2);
        e.schedule(move |_| {
            hits3.fetch_add(1, Ordering::Relaxed);
        });
    });
    engine.workshop().run(&engine);
    assert_eq!(hits.load(Ordering::Relaxed), 2);
    let (queued, completed) = engine.workshop().counts();
    assert_eq!(queued, completed);
    assert_eq!(queued, 2);
}

#[test]
fn quiescence_callback_fires_exactly_once() {
    let engine = engine_with_limits(EngineLimits::default());
    let fired = Arc::new(AtomicU32::new(0));
    let fired2 = Arc::clone(&fired);
    engine.workshop().on_quiescence(Box::new(move |_| {
        fired2.fetch_add(1, Ordering::Relaxed);
    }));
    engine.schedule(|_| {});
    engine.workshop().run(&engine);
    assert_eq!(fired.load(Ordering::Relaxed), 1);
    // A second run with no callback installed is a no-op.
    engine.workshop().run(&engine);
    assert_eq!(fired.load(Ordering::Relaxed), 1);
}

#[test]
fn fuel_exhaustion_terminates() {
    let engine = engine_with_limits(EngineLimits::new().work_fuel(16));
    fn respawn(engine: &Engine) {
        engine.schedule(respawn);
    }
    engine.schedule(respawn);
    engine.workshop().run(&engine);
    assert!(matches!(
        engine.workshop().fatal_error(),
        Some(EngineError::WorkFuelExhausted(16))
    ));
}

#[test]
fn terminated_workshop_drops_new_units() {
    let engine = engine_with_limits(EngineLimits::default());
    engine
        .workshop()
        .terminate(EngineError::Invariant("test stop"));
    let hits = Arc::new(AtomicU32::new(0));
    let hits2 = Arc::clone(&hits);
    engine.schedule(move |_| {
        hits2.fetch_add(1, Ordering::Relaxed);
    });
    engine.workshop().run(&engine);
    assert_eq!(hits.load(Ordering::Relaxed), 0);
}
