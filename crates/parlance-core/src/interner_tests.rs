//! Tests for the string interner.

use super::interner::Interner;

#[test]
fn intern_deduplicates() {
    let mut interner = Interner::new();
    let a = interner.intern("plus");
    let b = interner.intern("minus");
    let c = interner.intern("plus");
    assert_eq!(a, c);
    assert_ne!(a, b);
    assert_eq!(interner.len(), 2);
}

#[test]
fn resolve_round_trips() {
    let mut interner = Interner::new();
    let sym = interner.intern("«");
    assert_eq!(&**interner.resolve(sym), "«");
}

#[test]
fn get_does_not_intern() {
    let mut interner = Interner::new();
    assert_eq!(interner.get("if"), None);
    let sym = interner.intern("if");
    assert_eq!(interner.get("if"), Some(sym));
    assert_eq!(interner.len(), 1);
}

#[test]
fn symbols_order_by_insertion() {
    let mut interner = Interner::new();
    let first = interner.intern("zebra");
    let second = interner.intern("aardvark");
    assert!(first < second);
}

#[test]
fn iter_yields_all_entries() {
    let mut interner = Interner::new();
    interner.intern("a");
    interner.intern("b");
    let collected: Vec<_> = interner
        .iter()
        .map(|(sym, text)| (sym.as_u32(), text.to_string()))
        .collect();
    assert_eq!(collected, vec![(0, "a".to_string()), (1, "b".to_string())]);
}
