//! Tests for message-name parsing into expression trees.

use parlance_core::Interner;

use super::error::MessageError;
use super::expression::MessageExpr;
use super::splitter::MessageSplitter;

fn split(name: &str) -> MessageSplitter {
    let mut interner = Interner::new();
    MessageSplitter::split(name, &mut interner).expect("name must split")
}

fn split_err(name: &str) -> MessageError {
    let mut interner = Interner::new();
    MessageSplitter::split(name, &mut interner).expect_err("name must be rejected")
}

#[test]
fn infix_arguments() {
    let splitter = split("_+_");
    assert_eq!(splitter.argument_count(), 2);
    assert_eq!(splitter.underscore_count(), 2);
    assert!(matches!(splitter.root()[0], MessageExpr::Argument));
    assert!(matches!(splitter.root()[1], MessageExpr::Simple { .. }));
    assert!(matches!(splitter.root()[2], MessageExpr::Argument));
}

#[test]
fn repeated_group_counts_as_one_argument() {
    let splitter = split("«_‡,»");
    assert_eq!(splitter.argument_count(), 1);
    assert_eq!(splitter.underscore_count(), 1);
    let MessageExpr::Group(group) = &splitter.root()[0] else {
        panic!("expected a group, got {:?}", splitter.root());
    };
    assert!(group.has_dagger());
    assert!(!group.needs_double_wrapping());
}

#[test]
fn multi_argument_group_needs_double_wrapping() {
    let splitter = split("«_:_‡,»");
    let MessageExpr::Group(group) = &splitter.root()[0] else {
        panic!("expected a group");
    };
    assert!(group.needs_double_wrapping());
    assert_eq!(group.before_yield_count(), 2);
}

#[test]
fn counter_group() {
    let splitter = split("«very‡,»# good");
    assert_eq!(splitter.argument_count(), 1);
    assert!(matches!(splitter.root()[0], MessageExpr::Counter(_)));
    assert!(matches!(splitter.root()[1], MessageExpr::Simple { .. }));
}

#[test]
fn optional_alternation() {
    let splitter = split("«a|an»?_");
    assert_eq!(splitter.argument_count(), 2);
    let MessageExpr::Optional(group) = &splitter.root()[0] else {
        panic!("expected an optional group");
    };
    assert!(matches!(
        group.before.as_slice(),
        [MessageExpr::Alternation(branches)] if branches.len() == 2
    ));
}

#[test]
fn numbered_choice() {
    let splitter = split("«red|green|blue»!");
    assert_eq!(splitter.argument_count(), 1);
    assert!(matches!(splitter.root()[0], MessageExpr::NumberedChoice(_)));
}

#[test]
fn module_scope_and_variable_arguments() {
    let splitter = split("alias_†to_↑");
    assert!(matches!(
        splitter.root()[1],
        MessageExpr::ModuleScopeArgument
    ));
    assert!(matches!(splitter.root()[3], MessageExpr::VariableQuote));
}

#[test]
fn raw_token_argument() {
    let splitter = split("quote…");
    assert_eq!(splitter.argument_count(), 1);
    assert!(matches!(splitter.root()[1], MessageExpr::RawToken));
}

#[test]
fn case_insensitive_keyword() {
    let splitter = split("print~_");
    assert!(matches!(
        splitter.root()[0],
        MessageExpr::CaseInsensitive(_)
    ));
}

#[test]
fn completely_optional_keyword() {
    let splitter = split("a??b");
    assert_eq!(splitter.argument_count(), 0);
    assert!(matches!(
        splitter.root()[0],
        MessageExpr::CompletelyOptional(_)
    ));
}

#[test]
fn section_checkpoints_number_in_order() {
    let splitter = split("for_§do_§end");
    assert_eq!(splitter.section_checkpoint_count(), 2);
    let mut numbers = Vec::new();
    for expr in splitter.root() {
        expr.collect_section_checkpoints(&mut numbers);
    }
    assert_eq!(numbers, vec![1, 2]);
}

#[test]
fn escaped_operators_are_keywords() {
    let splitter = split("`«_`»");
    assert_eq!(splitter.argument_count(), 1);
    assert!(matches!(splitter.root()[0], MessageExpr::Simple { .. }));
    assert!(matches!(splitter.root()[2], MessageExpr::Simple { .. }));
}

#[test]
fn unbalanced_guillemets() {
    assert_eq!(split_err("«a"), MessageError::UnbalancedGuillemets);
    assert_eq!(split_err("a»b"), MessageError::UnbalancedGuillemets);
}

#[test]
fn stray_double_dagger() {
    assert_eq!(split_err("a‡b"), MessageError::IncorrectUseOfDoubleDagger);
    assert_eq!(
        split_err("«a‡b‡c»"),
        MessageError::IncorrectUseOfDoubleDagger
    );
}

#[test]
fn octothorp_requires_argument_free_group() {
    assert_eq!(
        split_err("«_»#"),
        MessageError::OctothorpMustFollowSimpleGroup
    );
    assert_eq!(split_err("#"), MessageError::OctothorpMustFollowSimpleGroup);
}

#[test]
fn question_mark_requires_simple_group() {
    assert_eq!(
        split_err("«_»?"),
        MessageError::QuestionMarkMustFollowSimpleGroup
    );
    assert_eq!(
        split_err("«a‡,»?"),
        MessageError::QuestionMarkMustFollowSimpleGroup
    );
}

#[test]
fn double_question_mark_requires_simple_shape() {
    assert_eq!(
        split_err("_??"),
        MessageError::DoubleQuestionMarkMustFollowSimpleOrSimpleGroup
    );
}

#[test]
fn exclamation_requires_alternation_group() {
    assert_eq!(
        split_err("«a»!"),
        MessageError::ExclamationMarkMustFollowAlternationGroup
    );
}

#[test]
fn tilde_rejects_arguments_and_uppercase() {
    assert_eq!(split_err("_~"), MessageError::TildeMustNotFollowArgument);
    assert_eq!(split_err("Print~"), MessageError::CaseInsensitiveCanonization);
}

#[test]
fn alternation_branches_must_be_simple() {
    assert_eq!(
        split_err("«a|_»"),
        MessageError::AlternativeMustNotContainArguments
    );
    assert_eq!(
        split_err("«a b|c»"),
        MessageError::VerticalBarMustFollowSimpleOrSimpleGroup
    );
    assert_eq!(
        split_err("a|b"),
        MessageError::VerticalBarMustFollowSimpleOrSimpleGroup
    );
}

#[test]
fn up_arrow_requires_argument() {
    assert_eq!(split_err("a↑"), MessageError::UpArrowMustFollowArgument);
}

#[test]
fn expression_classification() {
    let splitter = split("take«_‡,»or_");
    let root = splitter.root();
    assert!(!root[0].is_argument_or_group());
    assert!(root[1].is_group());
    assert!(root[1].is_argument_or_group());
    assert!(root[3].is_leaf_argument());
    assert!(root[3].is_argument_or_group());
    assert_eq!(root[1].yield_count(), 1);
    assert_eq!(root[2].yield_count(), 0);
}

#[test]
fn print_with_arguments_substitutes_slots() {
    let splitter = split("if_then_else_");
    let rendered = splitter.print_with_arguments(&[
        "p".to_string(),
        "a".to_string(),
        "b".to_string(),
    ]);
    assert_eq!(rendered, "if p then a else b");
}
