//! Parsing-program emission from the message expression tree.
//!
//! Emission is two-pass: instructions are laid down against fresh labels,
//! then every branch and jump is resolved to a one-based program index.

use crate::expression::{GroupExpr, MessageExpr};
use crate::instruction::{ConversionRule, ParsingOperation, ParsingProgram};

/// An unresolved branch target.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Label(u32);

/// Builds a program, resolving labels at the end.
#[derive(Default)]
pub struct ProgramBuilder {
    ops: Vec<ParsingOperation>,
    /// Instruction slots whose targets await resolution.
    patches: Vec<(usize, Label)>,
    /// Label bindings, as one-based program counters.
    bindings: Vec<Option<u32>>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, op: ParsingOperation) {
        self.ops.push(op);
    }

    pub fn new_label(&mut self) -> Label {
        self.bindings.push(None);
        Label(self.bindings.len() as u32 - 1)
    }

    /// Bind a label to the next instruction to be emitted.
    pub fn bind(&mut self, label: Label) {
        self.bindings[label.0 as usize] = Some(self.ops.len() as u32 + 1);
    }

    pub fn branch_to(&mut self, label: Label) {
        self.patches.push((self.ops.len(), label));
        self.ops.push(ParsingOperation::Branch { target: 0 });
    }

    pub fn jump_to(&mut self, label: Label) {
        self.patches.push((self.ops.len(), label));
        self.ops.push(ParsingOperation::Jump { target: 0 });
    }

    /// Resolve every label and produce the final encoding.
    pub fn finish(mut self) -> ParsingProgram {
        for (slot, label) in self.patches {
            let target = self.bindings[label.0 as usize].expect("label left unbound");
            match &mut self.ops[slot] {
                ParsingOperation::Branch { target: t } | ParsingOperation::Jump { target: t } => {
                    *t = target;
                }
                other => unreachable!("patched a non-branch instruction {other:?}"),
            }
        }
        ParsingProgram::new(self.ops)
    }
}

/// Mutable emission context threaded through the tree walk.
pub struct EmitState {
    /// Inside a `~` decoration, keyword matches are case-folded.
    case_insensitive: bool,
    /// One-based ordinal of the next leaf argument.
    next_ordinal: u32,
    /// Lists currently under construction around the emission point.
    open_lists: u32,
}

impl EmitState {
    pub fn new() -> Self {
        Self {
            case_insensitive: false,
            next_ordinal: 0,
            open_lists: 0,
        }
    }
}

impl Default for EmitState {
    fn default() -> Self {
        Self::new()
    }
}

/// Compile a message-level sequence into a program.
pub fn emit_sequence(sequence: &[MessageExpr]) -> ParsingProgram {
    let mut builder = ProgramBuilder::new();
    let mut state = EmitState::new();
    for expr in sequence {
        expr.emit_on(&mut builder, &mut state);
    }
    builder.finish()
}

impl MessageExpr {
    /// Emit this expression's instructions.
    pub(crate) fn emit_on(&self, b: &mut ProgramBuilder, st: &mut EmitState) {
        match self {
            MessageExpr::Simple { symbol, .. } => {
                if st.case_insensitive {
                    b.emit(ParsingOperation::ParsePartCaseInsensitive { part: *symbol });
                } else {
                    b.emit(ParsingOperation::ParsePart { part: *symbol });
                }
            }
            MessageExpr::Argument => {
                b.emit(ParsingOperation::ParseArgument);
                st.next_ordinal += 1;
                b.emit(ParsingOperation::CheckArgument {
                    index: st.next_ordinal,
                });
            }
            MessageExpr::ModuleScopeArgument => {
                b.emit(ParsingOperation::ParseArgumentInModuleScope);
                st.next_ordinal += 1;
                b.emit(ParsingOperation::CheckArgument {
                    index: st.next_ordinal,
                });
                b.emit(ParsingOperation::Convert {
                    rule: ConversionRule::EvaluateExpression,
                });
            }
            MessageExpr::RawToken => {
                b.emit(ParsingOperation::ParseRawToken);
                st.next_ordinal += 1;
            }
            MessageExpr::VariableQuote => {
                b.emit(ParsingOperation::ParseVariableReference);
                st.next_ordinal += 1;
            }
            MessageExpr::Group(group) => {
                if group.needs_double_wrapping() {
                    emit_double_wrapped(group, b, st);
                } else {
                    emit_single_wrapped(group, b, st);
                }
            }
            MessageExpr::Counter(group) => emit_counter(group, b, st),
            MessageExpr::Optional(group) => emit_optional(&group.before, b, st, true),
            MessageExpr::CompletelyOptional(inner) => {
                emit_optional(std::slice::from_ref(&**inner), b, st, false)
            }
            MessageExpr::CaseInsensitive(inner) => {
                let saved = st.case_insensitive;
                st.case_insensitive = true;
                inner.emit_on(b, st);
                st.case_insensitive = saved;
            }
            MessageExpr::Alternation(branches) => emit_alternation(branches, b, st, false),
            MessageExpr::NumberedChoice(group) => {
                // The splitter guarantees the group's sole content is an
                // alternation.
                match group.before.as_slice() {
                    [MessageExpr::Alternation(branches)] => {
                        emit_alternation(branches, b, st, true)
                    }
                    other => unreachable!("numbered choice over {other:?}"),
                }
            }
            MessageExpr::SectionCheckpoint { number } => {
                b.emit(ParsingOperation::PrepareToRunPrefixFunction {
                    list_count: st.open_lists + 1,
                });
                b.emit(ParsingOperation::RunPrefixFunction { section: *number });
            }
        }
    }
}

fn emit_body_item(item: &MessageExpr, b: &mut ProgramBuilder, st: &mut EmitState) {
    item.emit_on(b, st);
    if item.yield_count() == 1 {
        b.emit(ParsingOperation::AppendArgument);
    }
}

/// `«_‡,»` and friends: one yielder per iteration, flat result list.
fn emit_single_wrapped(group: &GroupExpr, b: &mut ProgramBuilder, st: &mut EmitState) {
    b.emit(ParsingOperation::SavePosition);
    b.emit(ParsingOperation::NewList);
    st.open_lists += 1;

    let loop_skip = b.new_label();
    let loop_start = b.new_label();
    let loop_exit = b.new_label();

    b.branch_to(loop_skip);
    b.bind(loop_start);
    for item in &group.before {
        emit_body_item(item, b, st);
    }
    b.branch_to(loop_exit);
    for item in group.after_items() {
        emit_body_item(item, b, st);
    }
    b.emit(ParsingOperation::EnsureProgress);
    b.jump_to(loop_start);
    b.bind(loop_exit);
    b.emit(ParsingOperation::EnsureProgress);
    b.bind(loop_skip);
    st.open_lists -= 1;
    b.emit(ParsingOperation::DiscardSavedPosition);
}

/// Groups yielding several arguments per iteration: each iteration is
/// wrapped into its own fixed-length list. The exit branch at the dagger
/// appends the partial inner list.
fn emit_double_wrapped(group: &GroupExpr, b: &mut ProgramBuilder, st: &mut EmitState) {
    b.emit(ParsingOperation::SavePosition);
    b.emit(ParsingOperation::NewList);
    st.open_lists += 1;

    let loop_skip = b.new_label();
    let loop_start = b.new_label();
    let at_exit = b.new_label();

    b.branch_to(loop_skip);
    b.bind(loop_start);
    b.emit(ParsingOperation::NewList);
    st.open_lists += 1;
    for item in &group.before {
        emit_body_item(item, b, st);
    }
    b.branch_to(at_exit);
    for item in group.after_items() {
        emit_body_item(item, b, st);
    }
    st.open_lists -= 1;
    b.emit(ParsingOperation::AppendArgument);
    b.emit(ParsingOperation::EnsureProgress);
    b.jump_to(loop_start);
    b.bind(at_exit);
    b.emit(ParsingOperation::AppendArgument);
    b.emit(ParsingOperation::EnsureProgress);
    b.bind(loop_skip);
    st.open_lists -= 1;
    b.emit(ParsingOperation::DiscardSavedPosition);
}

/// `«…»#`: the body runs without pushing arguments; every iteration
/// appends an empty marker list, and the whole list converts to its size.
fn emit_counter(group: &GroupExpr, b: &mut ProgramBuilder, st: &mut EmitState) {
    b.emit(ParsingOperation::SavePosition);
    b.emit(ParsingOperation::NewList);
    st.open_lists += 1;

    let skip = b.new_label();
    let loop_start = b.new_label();
    let exit = b.new_label();

    b.branch_to(skip);
    b.bind(loop_start);
    b.emit(ParsingOperation::NewList);
    st.open_lists += 1;
    for item in &group.before {
        item.emit_on(b, st);
    }
    st.open_lists -= 1;
    b.emit(ParsingOperation::AppendArgument);
    b.branch_to(exit);
    for item in group.after_items() {
        item.emit_on(b, st);
    }
    b.emit(ParsingOperation::EnsureProgress);
    b.jump_to(loop_start);
    b.bind(exit);
    b.emit(ParsingOperation::EnsureProgress);
    b.bind(skip);
    st.open_lists -= 1;
    b.emit(ParsingOperation::DiscardSavedPosition);
    b.emit(ParsingOperation::Convert {
        rule: ConversionRule::ListToSize,
    });
}

/// `«…»?` and `…??`: the body either parses (consuming at least one
/// token) or is skipped; only the boolean form pushes a value.
fn emit_optional(
    body: &[MessageExpr],
    b: &mut ProgramBuilder,
    st: &mut EmitState,
    push_boolean: bool,
) {
    let absent = b.new_label();
    b.branch_to(absent);
    b.emit(ParsingOperation::SavePosition);
    for item in body {
        item.emit_on(b, st);
    }
    b.emit(ParsingOperation::EnsureProgress);
    b.emit(ParsingOperation::DiscardSavedPosition);
    if push_boolean {
        let skip = b.new_label();
        b.emit(ParsingOperation::PushTrue);
        b.jump_to(skip);
        b.bind(absent);
        b.emit(ParsingOperation::PushFalse);
        b.bind(skip);
    } else {
        b.bind(absent);
    }
}

/// `a|b|c`, optionally pushing the one-based branch number.
fn emit_alternation(
    branches: &[MessageExpr],
    b: &mut ProgramBuilder,
    st: &mut EmitState,
    numbered: bool,
) {
    let done = b.new_label();
    let last = branches.len() - 1;
    for (i, branch) in branches.iter().enumerate() {
        if i < last {
            let next = b.new_label();
            b.branch_to(next);
            branch.emit_on(b, st);
            if numbered {
                b.emit(ParsingOperation::PushIntegerLiteral {
                    value: i as i64 + 1,
                });
            }
            b.jump_to(done);
            b.bind(next);
        } else {
            branch.emit_on(b, st);
            if numbered {
                b.emit(ParsingOperation::PushIntegerLiteral {
                    value: i as i64 + 1,
                });
            }
        }
    }
    b.bind(done);
}
