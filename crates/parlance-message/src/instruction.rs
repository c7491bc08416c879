//! The parsing instruction set.
//!
//! A message name compiles into a short program over these operations.
//! Programs are addressed one-based, matching how plans record their
//! progress through the bundle trie. Branch targets are indices into the
//! same program; `Branch` forks (both paths are explored), `Jump` is
//! unconditional.

use std::fmt;

use parlance_core::{Interner, Symbol};

/// How `Convert` rewrites the top of the argument stack.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ConversionRule {
    /// Leave the value alone.
    NoConversion,
    /// Replace a list with a literal of its size (counting groups).
    ListToSize,
    /// Replace a list with a literal of whether it is nonempty.
    ListToNonemptiness,
    /// Evaluate the phrase at parse time and replace it with a literal of
    /// its value (module-scope arguments).
    EvaluateExpression,
}

impl fmt::Display for ConversionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConversionRule::NoConversion => "none",
            ConversionRule::ListToSize => "list→size",
            ConversionRule::ListToNonemptiness => "list→nonempty",
            ConversionRule::EvaluateExpression => "evaluate",
        };
        write!(f, "{name}")
    }
}

/// One parsing instruction.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ParsingOperation {
    /// Match the next token against a part, exactly.
    ParsePart { part: Symbol },
    /// Match the next token against a lowercase part, case-folded.
    ParsePartCaseInsensitive { part: Symbol },
    /// Parse one argument expression and push it.
    ParseArgument,
    /// Parse one expression in a pristine module scope, to be evaluated.
    ParseArgumentInModuleScope,
    /// Accept whatever token comes next, pushed as a literal phrase.
    ParseRawToken,
    /// Parse a reference (`↑`) to an assignable variable.
    ParseVariableReference,
    /// Push an empty list under construction.
    NewList,
    /// Pop a value and append it to the list now on top.
    AppendArgument,
    /// Discard the top of the argument stack.
    Pop,
    /// Push the current position onto the mark stack.
    SavePosition,
    /// Pop the mark stack.
    DiscardSavedPosition,
    /// Fail this path unless the position advanced past the top mark,
    /// then move the mark up to the current position.
    EnsureProgress,
    /// Snapshot the argument stack into the parse state.
    ArgumentsCheckpoint,
    /// Fork: continue both at the next instruction and at `target`.
    Branch { target: u32 },
    /// Continue at `target` only.
    Jump { target: u32 },
    /// Record that the most recent argument fills the numbered slot, for
    /// grammatical-restriction prefiltering.
    CheckArgument { index: u32 },
    /// Rewrite the top of the argument stack.
    Convert { rule: ConversionRule },
    /// Push a true literal (optional group present).
    PushTrue,
    /// Push a false literal (optional group absent).
    PushFalse,
    /// Push an integer literal (numbered choices).
    PushIntegerLiteral { value: i64 },
    /// Gather the partial lists around a section checkpoint into the
    /// prefix-function argument list.
    PrepareToRunPrefixFunction { list_count: u32 },
    /// Run the enclosing macro's numbered prefix function.
    RunPrefixFunction { section: u32 },
}

impl ParsingOperation {
    /// Program counters reachable after this instruction at `pc`.
    pub fn successors(&self, pc: u32) -> Vec<u32> {
        match self {
            ParsingOperation::Branch { target } => vec![pc + 1, *target],
            ParsingOperation::Jump { target } => vec![*target],
            _ => vec![pc + 1],
        }
    }

    /// The part to match, with whether matching is case-folded.
    pub fn keyword_edge(&self) -> Option<(Symbol, bool)> {
        match self {
            ParsingOperation::ParsePart { part } => Some((*part, false)),
            ParsingOperation::ParsePartCaseInsensitive { part } => Some((*part, true)),
            _ => None,
        }
    }

    /// Render with parts resolved through the interner.
    pub fn describe(&self, interner: &Interner) -> String {
        match self {
            ParsingOperation::ParsePart { part } => {
                format!("parse-part {:?}", &**interner.resolve(*part))
            }
            ParsingOperation::ParsePartCaseInsensitive { part } => {
                format!("parse-part~ {:?}", &**interner.resolve(*part))
            }
            ParsingOperation::ParseArgument => "parse-argument".to_string(),
            ParsingOperation::ParseArgumentInModuleScope => {
                "parse-argument-in-module-scope".to_string()
            }
            ParsingOperation::ParseRawToken => "parse-raw-token".to_string(),
            ParsingOperation::ParseVariableReference => "parse-variable-reference".to_string(),
            ParsingOperation::NewList => "new-list".to_string(),
            ParsingOperation::AppendArgument => "append-argument".to_string(),
            ParsingOperation::Pop => "pop".to_string(),
            ParsingOperation::SavePosition => "save-position".to_string(),
            ParsingOperation::DiscardSavedPosition => "discard-saved-position".to_string(),
            ParsingOperation::EnsureProgress => "ensure-progress".to_string(),
            ParsingOperation::ArgumentsCheckpoint => "arguments-checkpoint".to_string(),
            ParsingOperation::Branch { target } => format!("branch {target}"),
            ParsingOperation::Jump { target } => format!("jump {target}"),
            ParsingOperation::CheckArgument { index } => format!("check-argument {index}"),
            ParsingOperation::Convert { rule } => format!("convert {rule}"),
            ParsingOperation::PushTrue => "push-true".to_string(),
            ParsingOperation::PushFalse => "push-false".to_string(),
            ParsingOperation::PushIntegerLiteral { value } => {
                format!("push-integer {value}")
            }
            ParsingOperation::PrepareToRunPrefixFunction { list_count } => {
                format!("prepare-prefix-function {list_count}")
            }
            ParsingOperation::RunPrefixFunction { section } => {
                format!("run-prefix-function {section}")
            }
        }
    }
}

/// A compiled parsing program, addressed one-based.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct ParsingProgram {
    ops: Vec<ParsingOperation>,
}

impl ParsingProgram {
    pub fn new(ops: Vec<ParsingOperation>) -> Self {
        Self { ops }
    }

    /// The instruction at a one-based program counter, or `None` once the
    /// program has run off the end (a completed plan).
    pub fn op_at(&self, pc: u32) -> Option<&ParsingOperation> {
        if pc == 0 {
            return None;
        }
        self.ops.get(pc as usize - 1)
    }

    pub fn len(&self) -> u32 {
        self.ops.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[ParsingOperation] {
        &self.ops
    }

    /// Numbered disassembly.
    pub fn dump(&self, interner: &Interner) -> String {
        let mut out = String::new();
        for (i, op) in self.ops.iter().enumerate() {
            out.push_str(&format!("{:>3}. {}\n", i + 1, op.describe(interner)));
        }
        out
    }
}
