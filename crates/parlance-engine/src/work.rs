//! The work-unit executor.
//!
//! Parsing proceeds as zero-argument closures that may schedule further
//! closures. Queued and completed counters drive quiescence: when they
//! meet, the one-shot quiescence callback fires and the ambiguity window
//! is decided. A terminator flag set by the first fatal error makes every
//! remaining unit exit before running.
//!
//! Units may run in any order; this executor is deterministic FIFO, but
//! nothing in the engine depends on that.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::engine::Engine;
use crate::error::EngineError;

/// One scheduled unit of parsing work.
pub type WorkUnit = Box<dyn FnOnce(&Engine) + Send>;

/// Execution limits for one ambiguity window.
#[derive(Clone, Copy, Debug)]
pub struct EngineLimits {
    /// Maximum work units per window (default: 4,000,000).
    work_fuel: u64,
    /// Maximum expression nesting depth (default: 512).
    recursion_limit: u32,
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self {
            work_fuel: 4_000_000,
            recursion_limit: 512,
        }
    }
}

impl EngineLimits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn work_fuel(mut self, fuel: u64) -> Self {
        self.work_fuel = fuel;
        self
    }

    pub fn recursion_limit(mut self, limit: u32) -> Self {
        self.recursion_limit = limit;
        self
    }

    pub fn get_work_fuel(&self) -> u64 {
        self.work_fuel
    }

    pub fn get_recursion_limit(&self) -> u32 {
        self.recursion_limit
    }
}

/// The cooperative scheduler for one compilation.
pub struct Workshop {
    queue: Mutex<VecDeque<WorkUnit>>,
    queued: AtomicU64,
    completed: AtomicU64,
    /// Completed count when the current window opened; fuel is measured
    /// from here.
    window_base: AtomicU64,
    terminated: AtomicBool,
    fatal: Mutex<Option<EngineError>>,
    quiescence: Mutex<Option<WorkUnit>>,
    limits: EngineLimits,
}

impl Workshop {
    pub fn new(limits: EngineLimits) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            queued: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            window_base: AtomicU64::new(0),
            terminated: AtomicBool::new(false),
            fatal: Mutex::new(None),
            quiescence: Mutex::new(None),
            limits,
        }
    }

    /// Enqueue a unit. Units scheduled after termination are dropped.
    pub fn schedule(&self, unit: WorkUnit) {
        if self.terminated.load(Ordering::Acquire) {
            return;
        }
        self.queued.fetch_add(1, Ordering::Relaxed);
        self.queue.lock().expect("work queue poisoned").push_back(unit);
    }

    /// Install the one-shot callback fired when queued equals completed.
    pub fn on_quiescence(&self, callback: WorkUnit) {
        *self.quiescence.lock().expect("quiescence poisoned") = Some(callback);
    }

    /// Start a fresh ambiguity window: fuel accounting restarts here.
    pub fn begin_window(&self) {
        self.window_base
            .store(self.completed.load(Ordering::Relaxed), Ordering::Relaxed);
    }

    /// Record a fatal error and stop executing queued units.
    pub fn terminate(&self, error: EngineError) {
        let mut fatal = self.fatal.lock().expect("fatal slot poisoned");
        if fatal.is_none() {
            *fatal = Some(error);
        }
        self.terminated.store(true, Ordering::Release);
    }

    pub fn fatal_error(&self) -> Option<EngineError> {
        self.fatal.lock().expect("fatal slot poisoned").clone()
    }

    /// (queued, completed) unit counts.
    pub fn counts(&self) -> (u64, u64) {
        (
            self.queued.load(Ordering::Relaxed),
            self.completed.load(Ordering::Relaxed),
        )
    }

    /// Run units until quiescence. The callback, if any, fires exactly
    /// once, after which any stragglers it scheduled are drained too.
    pub fn run(&self, engine: &Engine) {
        loop {
            let next = self.queue.lock().expect("work queue poisoned").pop_front();
            match next {
                Some(unit) => {
                    if !self.terminated.load(Ordering::Acquire) {
                        let spent = self.completed.load(Ordering::Relaxed)
                            - self.window_base.load(Ordering::Relaxed);
                        if spent >= self.limits.work_fuel {
                            self.terminate(EngineError::WorkFuelExhausted(
                                self.limits.work_fuel,
                            ));
                        } else {
                            unit(engine);
                        }
                    }
                    self.completed.fetch_add(1, Ordering::Relaxed);
                }
                None => {
                    let callback = self
                        .quiescence
                        .lock()
                        .expect("quiescence poisoned")
                        .take();
                    match callback {
                        Some(callback) => callback(engine),
                        None => break,
                    }
                }
            }
        }
    }

    pub fn limits(&self) -> &EngineLimits {
        &self.limits
    }
}
