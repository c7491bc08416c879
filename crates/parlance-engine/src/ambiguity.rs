//! Ambiguity reporting.
//!
//! When two complete interpretations of one statement survive, the most
//! useful report is not the two whole trees but the smallest place they
//! disagree: walk both in lockstep until the nodes differ in kind, in
//! message, or in more than one child, and show that pair.

use std::sync::Arc;

use parlance_syntax::{Phrase, PhrasePrinter};

use crate::runtime::Runtime;

/// The smallest discriminating subtrees of two differing phrases.
pub fn smallest_discriminant(a: &Arc<Phrase>, b: &Arc<Phrase>) -> (Arc<Phrase>, Arc<Phrase>) {
    if std::mem::discriminant(&**a) != std::mem::discriminant(&**b) {
        return (Arc::clone(a), Arc::clone(b));
    }
    if let (Phrase::Send { message: ma, .. }, Phrase::Send { message: mb, .. }) = (&**a, &**b)
        && ma != mb
    {
        return (Arc::clone(a), Arc::clone(b));
    }

    let children_a = a.children();
    let children_b = b.children();
    if children_a.len() != children_b.len() {
        return (Arc::clone(a), Arc::clone(b));
    }
    let differing: Vec<usize> = children_a
        .iter()
        .zip(&children_b)
        .enumerate()
        .filter(|(_, (x, y))| x != y)
        .map(|(i, _)| i)
        .collect();
    match differing.as_slice() {
        // A single differing child localizes the ambiguity further down.
        [index] => smallest_discriminant(children_a[*index], children_b[*index]),
        _ => (Arc::clone(a), Arc::clone(b)),
    }
}

/// Render the discriminating pair of two ambiguous interpretations.
pub fn discriminate(
    a: &Arc<Phrase>,
    b: &Arc<Phrase>,
    runtime: &Arc<Runtime>,
) -> (String, String) {
    let (x, y) = smallest_discriminant(a, b);
    let resolve = {
        let runtime = Arc::clone(runtime);
        move |symbol: parlance_core::Symbol| runtime.resolve(symbol)
    };
    let first = PhrasePrinter {
        phrase: &x,
        resolve: &resolve,
    }
    .to_string();
    let second = PhrasePrinter {
        phrase: &y,
        resolve: &resolve,
    }
    .to_string();
    (first, second)
}
