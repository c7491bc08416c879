//! Rightmost-failure bookkeeping.
//!
//! Every failed path records what it expected at the position it died.
//! Only the rightmost position matters: a strictly greater position
//! resets the list, an equal one appends. Descriptions are lazy closures
//! so a successful parse never pays for their construction; duplicates
//! are removed at report time.

use std::sync::{Arc, Mutex};

use indexmap::IndexSet;

/// A deferred expectation description.
pub type Describer = Arc<dyn Fn() -> String + Send + Sync>;

/// Build a describer from a fixed string.
pub fn describe(text: impl Into<String>) -> Describer {
    let text = text.into();
    Arc::new(move || text.clone())
}

#[derive(Default)]
struct SinkInner {
    position: u32,
    describers: Vec<Describer>,
}

/// The per-compilation record of the rightmost failure position and what
/// was expected there. Shared by every concurrent work unit.
#[derive(Default)]
pub struct ExpectationSink {
    inner: Mutex<SinkInner>,
}

impl ExpectationSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything and restart accounting at `position`.
    pub fn reset(&self, position: u32) {
        let mut inner = self.inner.lock().expect("expectation sink poisoned");
        inner.position = position;
        inner.describers.clear();
    }

    /// Record an expectation at a position.
    pub fn expect(&self, position: u32, describer: Describer) {
        let mut inner = self.inner.lock().expect("expectation sink poisoned");
        if position > inner.position {
            inner.position = position;
            inner.describers.clear();
        }
        if position == inner.position {
            inner.describers.push(describer);
        }
    }

    /// The rightmost position reached by any attempt.
    pub fn greatest_position(&self) -> u32 {
        self.inner.lock().expect("expectation sink poisoned").position
    }

    /// Evaluate and deduplicate the recorded expectations.
    pub fn report(&self) -> (u32, Vec<String>) {
        let inner = self.inner.lock().expect("expectation sink poisoned");
        let mut seen = IndexSet::new();
        for describer in &inner.describers {
            seen.insert(describer());
        }
        (inner.position, seen.into_iter().collect())
    }
}
