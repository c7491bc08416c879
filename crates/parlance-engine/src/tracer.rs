//! Optional engine instrumentation.
//!
//! The default `NoopTracer` does nothing; `PrintTracer` narrates the
//! exploration for debugging grammars.

use parlance_syntax::Token;

/// Hooks called as the engine explores.
pub trait Tracer: Send + Sync {
    /// A bundle-tree node is being executed at a position.
    fn tree_node(&self, _position: u32, _plans: usize) {}

    /// A token was matched against a keyword edge.
    fn token_consumed(&self, _token: &Token) {}

    /// A send completed and is being type-checked.
    fn send_completed(&self, _message: &str, _arguments: usize) {}

    /// A semantic restriction ran; `narrowed` is false on rejection.
    fn restriction_ran(&self, _message: &str, _narrowed: bool) {}

    /// The work window drained; counts are (queued, completed).
    fn quiescence(&self, _queued: u64, _completed: u64) {}
}

/// The zero-cost default.
#[derive(Default, Clone, Copy, Debug)]
pub struct NoopTracer;

impl Tracer for NoopTracer {}

/// Narrates exploration to standard error.
#[derive(Default, Clone, Copy, Debug)]
pub struct PrintTracer;

impl Tracer for PrintTracer {
    fn tree_node(&self, position: u32, plans: usize) {
        eprintln!("· node @{position} ({plans} plans)");
    }

    fn token_consumed(&self, token: &Token) {
        eprintln!("· consumed {token} @{}", token.start());
    }

    fn send_completed(&self, message: &str, arguments: usize) {
        eprintln!("· send {message} /{arguments}");
    }

    fn restriction_ran(&self, message: &str, narrowed: bool) {
        eprintln!(
            "· restriction on {message}: {}",
            if narrowed { "narrowed" } else { "rejected" }
        );
    }

    fn quiescence(&self, queued: u64, completed: u64) {
        eprintln!("· quiescent ({queued} queued, {completed} completed)");
    }
}
