//! Tests for the instruction set itself.

use parlance_core::Interner;

use super::instruction::{ConversionRule, ParsingOperation as Op, ParsingProgram};

#[test]
fn successors_of_straight_line_ops() {
    assert_eq!(Op::ParseArgument.successors(3), vec![4]);
    assert_eq!(Op::NewList.successors(1), vec![2]);
    assert_eq!(Op::Pop.successors(9), vec![10]);
    assert_eq!(Op::ArgumentsCheckpoint.successors(5), vec![6]);
}

#[test]
fn branch_forks_and_jump_redirects() {
    assert_eq!(Op::Branch { target: 12 }.successors(3), vec![4, 12]);
    assert_eq!(Op::Jump { target: 4 }.successors(10), vec![4]);
}

#[test]
fn keyword_edges_carry_their_folding() {
    let mut interner = Interner::new();
    let part = interner.intern("then");
    assert_eq!(Op::ParsePart { part }.keyword_edge(), Some((part, false)));
    assert_eq!(
        Op::ParsePartCaseInsensitive { part }.keyword_edge(),
        Some((part, true))
    );
    assert_eq!(Op::SavePosition.keyword_edge(), None);
}

#[test]
fn one_based_addressing() {
    let program = ParsingProgram::new(vec![Op::NewList, Op::Pop]);
    assert!(program.op_at(0).is_none());
    assert_eq!(program.op_at(1), Some(&Op::NewList));
    assert_eq!(program.op_at(2), Some(&Op::Pop));
    assert!(program.op_at(3).is_none());
}

#[test]
fn descriptions_render_operands() {
    let mut interner = Interner::new();
    let part = interner.intern("+");
    assert_eq!(
        Op::ParsePart { part }.describe(&interner),
        "parse-part \"+\""
    );
    assert_eq!(Op::Branch { target: 7 }.describe(&interner), "branch 7");
    assert_eq!(
        Op::Convert {
            rule: ConversionRule::ListToSize
        }
        .describe(&interner),
        "convert list→size"
    );
    assert_eq!(
        Op::PrepareToRunPrefixFunction { list_count: 2 }.describe(&interner),
        "prepare-prefix-function 2"
    );
    assert_eq!(
        Op::RunPrefixFunction { section: 1 }.describe(&interner),
        "run-prefix-function 1"
    );
}
