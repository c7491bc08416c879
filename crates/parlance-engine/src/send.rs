//! Completed-send processing.
//!
//! When a plan's program runs dry the message has been fully parsed.
//! For ordinary methods the argument types select the applicable
//! definitions, the return types intersect, and every semantic
//! restriction runs as its own work unit, each able to narrow the type
//! further or reject the parse with an explanation. For macros the body
//! runs over the argument phrases and must return a phrase.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use parlance_syntax::{Phrase, Type, Value};

use crate::bundle::Bundle;
use crate::engine::{Engine, SolutionAction};
use crate::expectations::describe;
use crate::interpreter::RunError;
use crate::parse_state::ParseState;

/// A send whose program has completed, awaiting type processing.
pub(crate) struct CompletedSend {
    pub bundle: Arc<Bundle>,
    pub arguments: Vec<Arc<Phrase>>,
    pub end_state: ParseState,
    /// Start of the first region the send consumed; restriction
    /// rejections point here.
    pub first_token: Option<u32>,
    pub continuation: SolutionAction,
}

pub(crate) fn complete_send(engine: &Engine, completed: CompletedSend) {
    let message_name = engine.runtime.resolve(completed.bundle.message());
    engine
        .tracer
        .send_completed(&message_name, completed.arguments.len());

    if completed.bundle.method().has_macros() {
        complete_macro_send(engine, completed);
    } else {
        complete_method_send(engine, completed);
    }
}

/// Definition filtering, return-type intersection, and semantic
/// restrictions.
fn complete_method_send(engine: &Engine, completed: CompletedSend) {
    let CompletedSend {
        bundle,
        arguments,
        end_state,
        first_token,
        continuation,
    } = completed;
    let method = bundle.method();
    let argument_types: Vec<Type> = arguments.iter().map(|a| a.expression_type()).collect();

    let definitions = method.definitions();
    let applicable: Vec<_> = definitions
        .iter()
        .filter(|d| d.accepts(&argument_types))
        .collect();
    if applicable.is_empty() {
        let splitter = Arc::clone(bundle.splitter());
        let signatures: Vec<String> = definitions
            .iter()
            .map(|d| {
                Type::Function(d.signature.clone()).to_string()
            })
            .collect();
        let at = first_token.unwrap_or(end_state.position);
        engine.expectations.expect(
            at,
            Arc::new(move || {
                let tried = if signatures.is_empty() {
                    "no definitions exist".to_string()
                } else {
                    format!("definitions tried: {}", signatures.join(", "))
                };
                format!(
                    "no applicable definition for {} ({tried})",
                    splitter.print_with_types(&argument_types)
                )
            }),
        );
        return;
    }

    let return_type = applicable
        .iter()
        .fold(Type::Top, |acc, d| acc.intersection(&d.signature.result));

    let restrictions = method.restrictions();
    let message = bundle.message();
    if restrictions.is_empty() {
        deliver(engine, message, arguments, return_type, end_state, continuation);
        return;
    }

    // Every restriction runs as its own work unit; the last one standing
    // delivers the send with the fully narrowed type.
    let gather = Arc::new(RestrictionGather {
        remaining: Mutex::new(restrictions.len()),
        narrowed: Mutex::new(return_type),
        failed: AtomicBool::new(false),
    });
    for restriction in restrictions {
        let gather = Arc::clone(&gather);
        let types = argument_types.clone();
        let arguments = arguments.clone();
        let end_state = end_state.clone();
        let continuation = Arc::clone(&continuation);
        let message_name = engine.runtime.resolve(message);
        engine.schedule(move |engine| {
            let inputs: Vec<Value> = types.iter().cloned().map(Value::Type).collect();
            let outcome = engine
                .interpreter
                .run(&restriction.function, &inputs, &engine.runtime);
            match outcome {
                Ok(Value::Type(narrowing)) => {
                    engine.tracer.restriction_ran(&message_name, true);
                    {
                        let mut narrowed =
                            gather.narrowed.lock().expect("restriction gather poisoned");
                        *narrowed = narrowed.intersection(&narrowing);
                    }
                }
                Ok(other) => {
                    engine.tracer.restriction_ran(&message_name, false);
                    gather.failed.store(true, Ordering::Release);
                    let at = first_token.unwrap_or(end_state.position);
                    engine.expectations.expect(
                        at,
                        describe(format!(
                            "semantic restriction on {message_name} to produce a type, \
                             not a value of {}",
                            other.type_of()
                        )),
                    );
                }
                Err(RunError::Rejected { message }) => {
                    engine.tracer.restriction_ran(&message_name, false);
                    gather.failed.store(true, Ordering::Release);
                    let at = first_token.unwrap_or(end_state.position);
                    engine.expectations.expect(at, describe(message));
                }
                Err(RunError::Failed { message }) => {
                    engine.tracer.restriction_ran(&message_name, false);
                    gather.failed.store(true, Ordering::Release);
                    let at = first_token.unwrap_or(end_state.position);
                    engine.expectations.expect(
                        at,
                        describe(format!(
                            "semantic restriction on {message_name} failed: {message}"
                        )),
                    );
                }
            }

            let last = {
                let mut remaining =
                    gather.remaining.lock().expect("restriction gather poisoned");
                *remaining -= 1;
                *remaining == 0
            };
            if last && !gather.failed.load(Ordering::Acquire) {
                let narrowed = gather
                    .narrowed
                    .lock()
                    .expect("restriction gather poisoned")
                    .clone();
                deliver(
                    engine,
                    message,
                    arguments.clone(),
                    narrowed,
                    end_state.clone(),
                    continuation,
                );
            }
        });
    }
}

struct RestrictionGather {
    remaining: Mutex<usize>,
    narrowed: Mutex<Type>,
    failed: AtomicBool,
}

fn deliver(
    engine: &Engine,
    message: parlance_core::Symbol,
    arguments: Vec<Arc<Phrase>>,
    return_type: Type,
    end_state: ParseState,
    continuation: SolutionAction,
) {
    if return_type.is_bottom() {
        // The definitions agree on no type at all; nothing can come of
        // this send.
        let name = engine.runtime.resolve(message);
        engine.expectations.expect(
            end_state.position,
            describe(format!("the send of {name} to have a nonvacuous type")),
        );
        return;
    }
    let phrase = Arc::new(Phrase::Send {
        message,
        arguments,
        return_type,
    });
    engine.schedule(move |engine| continuation(engine, &end_state, &phrase));
}

/// Run the macro body over the argument phrases; the result must be a
/// phrase.
fn complete_macro_send(engine: &Engine, completed: CompletedSend) {
    let CompletedSend {
        bundle,
        arguments,
        end_state,
        first_token,
        continuation,
    } = completed;
    let message = bundle.message();
    let message_name = engine.runtime.resolve(message);

    for definition in bundle.method().macros() {
        if definition.signature.params.len() != arguments.len() {
            continue;
        }
        let inputs: Vec<Value> = arguments
            .iter()
            .map(|phrase| Value::Phrase(Arc::clone(phrase)))
            .collect();
        let outcome = engine
            .interpreter
            .run(&definition.body, &inputs, &engine.runtime);
        match outcome {
            Ok(Value::Phrase(replacement)) => {
                let phrase = Arc::new(Phrase::MacroSubstitution {
                    message,
                    replacement,
                });
                let end_state = end_state.clone();
                let continuation = Arc::clone(&continuation);
                engine.schedule(move |engine| continuation(engine, &end_state, &phrase));
            }
            Ok(_) => {
                let at = first_token.unwrap_or(end_state.position);
                engine.expectations.expect(
                    at,
                    describe(format!("macro {message_name} to return a phrase")),
                );
            }
            Err(RunError::Rejected { message }) => {
                let at = first_token.unwrap_or(end_state.position);
                engine.expectations.expect(at, describe(message));
            }
            Err(RunError::Failed { message }) => {
                let at = first_token.unwrap_or(end_state.position);
                engine.expectations.expect(
                    at,
                    describe(format!("macro {message_name} failed: {message}")),
                );
            }
        }
    }
}
