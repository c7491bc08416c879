//! The set of lexers visible to a scanner.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::lexer::{Lexer, LexerBody, LexerFailure};

/// Errors raised when mutating a registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("the lexer set is frozen and cannot be extended")]
    Frozen,
}

/// The lexers visible to one scanner, with the shared applicability cache
/// for supplementary codepoints.
pub struct LexerRegistry {
    lexers: Mutex<Vec<Arc<Lexer>>>,
    frozen: bool,
    /// Filter verdicts for codepoints above Latin-1, keyed by lexer slot.
    wide_cache: Mutex<HashMap<(usize, char), bool>>,
}

impl LexerRegistry {
    /// An extensible registry seeded with the given lexers.
    pub fn extensible(lexers: Vec<Arc<Lexer>>) -> Self {
        Self {
            lexers: Mutex::new(lexers),
            frozen: false,
            wide_cache: Mutex::new(HashMap::new()),
        }
    }

    /// A frozen registry; `add_lexer` always fails.
    pub fn frozen(lexers: Vec<Arc<Lexer>>) -> Self {
        Self {
            lexers: Mutex::new(lexers),
            frozen: true,
            wide_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Install another lexer. Takes effect for positions scanned after the
    /// caller resets its scanner cache.
    pub fn add_lexer(&self, lexer: Arc<Lexer>) -> Result<(), RegistryError> {
        if self.frozen {
            return Err(RegistryError::Frozen);
        }
        self.lexers.lock().expect("lexer registry poisoned").push(lexer);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.lexers.lock().expect("lexer registry poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The lexers whose filters accept `c`, plus any filter failures.
    ///
    /// Latin-1 verdicts come from the per-lexer cache; supplementary
    /// codepoints from the shared map. A failed filter caches nothing and
    /// the lexer is treated as inapplicable for this position only.
    pub fn applicable(&self, c: char) -> (Vec<Arc<Lexer>>, Vec<LexerFailure>) {
        let lexers = self.lexers.lock().expect("lexer registry poisoned").clone();
        let mut applicable = Vec::new();
        let mut failures = Vec::new();
        let wide = (c as u32) >= 256;
        for (slot, lexer) in lexers.iter().enumerate() {
            let cached = if wide {
                self.wide_cache
                    .lock()
                    .expect("wide cache poisoned")
                    .get(&(slot, c))
                    .copied()
            } else {
                lexer.cached_latin1(c)
            };
            let verdict = match cached {
                Some(verdict) => verdict,
                None => match lexer.run_filter(c) {
                    Ok(verdict) => {
                        if wide {
                            self.wide_cache
                                .lock()
                                .expect("wide cache poisoned")
                                .insert((slot, c), verdict);
                        }
                        verdict
                    }
                    Err(failure) => {
                        failures.push(failure);
                        continue;
                    }
                },
            };
            if verdict {
                applicable.push(Arc::clone(lexer));
            }
        }
        (applicable, failures)
    }

    /// Convenience for tests and bootstrap wiring.
    pub fn add_body(&self, name: &str, body: Arc<dyn LexerBody>) -> Result<(), RegistryError> {
        self.add_lexer(Lexer::new(name, body))
    }
}

impl std::fmt::Debug for LexerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lexers = self.lexers.lock().expect("lexer registry poisoned");
        f.debug_struct("LexerRegistry")
            .field("lexers", &lexers.len())
            .field("frozen", &self.frozen)
            .finish()
    }
}
