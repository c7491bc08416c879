//! Tests for bundle-trie expansion.

use std::sync::Arc;

use parlance_message::ParsingOperation;
use parlance_syntax::{FunctionType, FunctionValue, Type};

use super::bundle_tree::BundleTree;
use super::method::DefinitionBody;
use super::runtime::Runtime;

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

#[test]
fn expansion_sorts_keywords_and_actions() {
    let runtime = Runtime::new();
    define(
        &runtime,
        "if_then_",
        vec![Type::Boolean, Type::Any],
        Type::Top,
    );
    define(&runtime, "_+_", vec![Type::integer(), Type::integer()], Type::integer());

    let root = BundleTree::root_for(runtime.all_bundles());
    let expansion = root.expand();

    let if_symbol = runtime.lookup_symbol("if").expect("interned");
    assert!(expansion.exact.contains_key(&if_symbol));
    // `_+_` starts with an argument, which is an action edge.
    assert!(
        expansion
            .actions
            .keys()
            .any(|op| matches!(op, ParsingOperation::ParseArgument))
    );
    assert!(expansion.complete.is_empty());
}

#[test]
fn expansion_is_idempotent() {
    let runtime = Runtime::new();
    define(&runtime, "go", vec![], Type::Top);
    let root = BundleTree::root_for(runtime.all_bundles());
    let first = root.expand();
    let second = root.expand();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.exact.len(), 1);
}

#[test]
fn plans_with_a_shared_prefix_merge() {
    let runtime = Runtime::new();
    define(&runtime, "if_then_", vec![Type::Boolean, Type::Any], Type::Top);
    define(
        &runtime,
        "if_then_else_",
        vec![Type::Boolean, Type::Any, Type::Any],
        Type::Top,
    );

    let root = BundleTree::root_for(runtime.all_bundles());
    let expansion = root.expand();
    let if_symbol = runtime.lookup_symbol("if").expect("interned");
    let after_if = expansion.exact.get(&if_symbol).expect("if edge");
    // Both plans advanced through the shared `if` keyword.
    assert_eq!(after_if.plan_count(), 2);
}

#[test]
fn adding_a_plan_invalidates_the_expansion() {
    let runtime = Runtime::new();
    define(&runtime, "left", vec![], Type::Top);
    let root = BundleTree::root_for(runtime.all_bundles());
    let before = root.expand();
    assert_eq!(before.exact.len(), 1);

    define(&runtime, "right", vec![], Type::Top);
    let bundle = runtime
        .bundle_named(runtime.lookup_symbol("right").expect("interned"))
        .expect("bundle");
    root.add_plan(super::bundle::PlanInProgress::start(bundle));
    let after = root.expand();
    assert_eq!(after.exact.len(), 2);
}

#[test]
fn branch_actions_get_one_child_per_successor() {
    let runtime = Runtime::new();
    define(
        &runtime,
        "say«loudly»?_",
        vec![Type::Boolean, Type::Any],
        Type::Top,
    );
    let root = BundleTree::root_for(runtime.all_bundles());
    let say = runtime.lookup_symbol("say").expect("interned");
    let after_say = root.expand().exact.get(&say).cloned().expect("say edge");
    let expansion = after_say.expand();
    let branch = expansion
        .actions
        .iter()
        .find(|(op, _)| matches!(op, ParsingOperation::Branch { .. }))
        .expect("branch action");
    assert_eq!(branch.1.len(), 2);
}

#[test]
fn prefilter_drops_restricted_plans() {
    let runtime = Runtime::new();
    define(&runtime, "_+_", vec![Type::integer(), Type::integer()], Type::integer());
    runtime
        .add_grammatical_restriction("_+_", 2, &["_+_"])
        .expect("restriction installs");

    let plus = runtime.lookup_symbol("_+_").expect("interned");
    let bundle = runtime.bundle_named(plus).expect("bundle");
    let tree = BundleTree::root_for([Arc::clone(&bundle)]);

    let other = runtime.intern("not-plus");
    let unrestricted = tree.prefiltered(2, other);
    assert_eq!(unrestricted.plan_count(), 1);
    let restricted = tree.prefiltered(2, plus);
    assert_eq!(restricted.plan_count(), 0);
    // Filtered children are cached per inner message.
    assert!(Arc::ptr_eq(&restricted, &tree.prefiltered(2, plus)));
}
