//! Tests for the type lattice.

use super::types::{IntegerRange, SizeRange, TupleType, Type};

#[test]
fn top_and_bottom_bracket_everything() {
    let samples = [
        Type::Boolean,
        Type::integer(),
        Type::Str,
        Type::tuple_of(vec![Type::Boolean]),
        Type::function(vec![Type::integer()], Type::Str),
    ];
    for t in &samples {
        assert!(t.is_subtype_of(&Type::Top));
        assert!(Type::Bottom.is_subtype_of(t));
        assert!(!Type::Top.is_subtype_of(t));
        assert!(!t.is_subtype_of(&Type::Bottom));
    }
}

#[test]
fn integer_ranges_nest() {
    let singleton = Type::exact_integer(0);
    let whole = Type::whole_number();
    let all = Type::integer();
    assert!(singleton.is_subtype_of(&whole));
    assert!(whole.is_subtype_of(&all));
    assert!(!all.is_subtype_of(&whole));
    assert!(!whole.is_subtype_of(&singleton));
}

#[test]
fn integer_intersection_narrows() {
    let a = Type::Integer(IntegerRange::inclusive(0, 10));
    let b = Type::Integer(IntegerRange::inclusive(5, 20));
    assert_eq!(
        a.intersection(&b),
        Type::Integer(IntegerRange::inclusive(5, 10))
    );
    let disjoint = Type::Integer(IntegerRange::inclusive(30, 40));
    assert_eq!(a.intersection(&disjoint), Type::Bottom);
}

#[test]
fn integer_union_joins() {
    let a = Type::Integer(IntegerRange::inclusive(0, 3));
    let b = Type::Integer(IntegerRange::inclusive(7, 9));
    assert_eq!(a.union(&b), Type::Integer(IntegerRange::inclusive(0, 9)));
}

#[test]
fn tuple_subtyping_checks_sizes_and_elements() {
    let three_ints = Type::Tuple(TupleType::counted(
        Type::integer(),
        SizeRange::exact(3),
    ));
    let any_ints = Type::list_of(Type::integer());
    let any_top = Type::list_of(Type::Top);
    assert!(three_ints.is_subtype_of(&any_ints));
    assert!(any_ints.is_subtype_of(&any_top));
    assert!(!any_ints.is_subtype_of(&three_ints));
}

#[test]
fn fixed_tuple_positions_are_covariant() {
    let pair = Type::tuple_of(vec![Type::exact_integer(1), Type::Str]);
    let wider = Type::tuple_of(vec![Type::integer(), Type::Str]);
    assert!(pair.is_subtype_of(&wider));
    assert!(!wider.is_subtype_of(&pair));
}

#[test]
fn function_parameters_are_contravariant() {
    let takes_integer = Type::function(vec![Type::integer()], Type::Str);
    let takes_singleton = Type::function(vec![Type::exact_integer(0)], Type::Str);
    // A function accepting all integers may stand in where one accepting
    // only zero is needed, not the other way round.
    assert!(takes_integer.is_subtype_of(&takes_singleton));
    assert!(!takes_singleton.is_subtype_of(&takes_integer));
}

#[test]
fn phrase_types_are_covariant() {
    let yields_singleton = Type::phrase_yielding(Type::exact_integer(3));
    let yields_integer = Type::phrase_yielding(Type::integer());
    assert!(yields_singleton.is_subtype_of(&yields_integer));
    assert!(!yields_integer.is_subtype_of(&yields_singleton));
}

#[test]
fn size_range_operations() {
    assert!(SizeRange::ANY.contains(&SizeRange::exact(7)));
    assert!(!SizeRange::exact(7).contains(&SizeRange::ANY));
    assert!(SizeRange::at_least(2).permits(2));
    assert!(!SizeRange::at_least(2).permits(1));
    assert!(SizeRange::inclusive(1, 3).permits(3));
    assert!(!SizeRange::inclusive(1, 3).permits(4));
}

#[test]
fn display_forms() {
    assert_eq!(Type::Top.to_string(), "⊤");
    assert_eq!(Type::exact_integer(3).to_string(), "3's type");
    assert_eq!(Type::whole_number().to_string(), "[0..∞)");
    assert_eq!(
        Type::function(vec![Type::integer()], Type::Boolean).to_string(),
        "[integer]→boolean"
    );
}
