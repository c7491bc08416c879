//! Tests for rightmost-failure bookkeeping.

use super::expectations::{ExpectationSink, describe};

#[test]
fn rightmost_position_wins() {
    let sink = ExpectationSink::new();
    sink.reset(0);
    sink.expect(3, describe("a"));
    sink.expect(7, describe("b"));
    sink.expect(5, describe("ignored"));
    let (position, expectations) = sink.report();
    assert_eq!(position, 7);
    assert_eq!(expectations, vec!["b".to_string()]);
}

#[test]
fn equal_positions_accumulate() {
    let sink = ExpectationSink::new();
    sink.reset(0);
    sink.expect(4, describe("first"));
    sink.expect(4, describe("second"));
    let (_, expectations) = sink.report();
    assert_eq!(
        expectations,
        vec!["first".to_string(), "second".to_string()]
    );
}

#[test]
fn duplicates_vanish_at_report_time() {
    let sink = ExpectationSink::new();
    sink.reset(0);
    sink.expect(2, describe("keyword `then`"));
    sink.expect(2, describe("keyword `then`"));
    sink.expect(2, describe("keyword `else`"));
    let (_, expectations) = sink.report();
    assert_eq!(expectations.len(), 2);
}

#[test]
fn a_new_position_clears_the_list() {
    let sink = ExpectationSink::new();
    sink.reset(0);
    sink.expect(2, describe("early"));
    sink.expect(9, describe("late"));
    let (position, expectations) = sink.report();
    assert_eq!(position, 9);
    assert_eq!(expectations, vec!["late".to_string()]);
}

#[test]
fn reset_restarts_accounting() {
    let sink = ExpectationSink::new();
    sink.expect(12, describe("stale"));
    sink.reset(20);
    // Positions left of the restart are ignored outright.
    sink.expect(12, describe("older than the reset"));
    let (position, expectations) = sink.report();
    assert_eq!(position, 20);
    assert!(expectations.is_empty());
}

#[test]
fn describers_are_lazy() {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    let sink = ExpectationSink::new();
    sink.reset(0);
    let evaluations = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&evaluations);
    sink.expect(
        1,
        Arc::new(move || {
            counter.fetch_add(1, Ordering::Relaxed);
            "expensive".to_string()
        }),
    );
    assert_eq!(evaluations.load(Ordering::Relaxed), 0);
    let _ = sink.report();
    assert_eq!(evaluations.load(Ordering::Relaxed), 1);
}
