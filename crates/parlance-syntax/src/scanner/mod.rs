//! The lazy, user-extensible lexical scanner.
//!
//! Tokenization is driven by the visible lexer set: for each position the
//! scanner asks every lexer whose filter accepts the codepoint to produce
//! candidate tokens, and the union of candidates is the set of possible
//! tokens there. Multiple candidates form a lexical fork that the parser
//! explores as alternatives. Results are memoized per position and shared
//! by every parse attempt.

mod bootstrap;
mod lexer;
mod registry;


pub use bootstrap::{body_registry, bootstrap_lexers, header_registry};
pub use lexer::{Lexer, LexerBody, LexerFailure};
pub use registry::{LexerRegistry, RegistryError};

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::source::SourceText;
use crate::token::Token;

/// The possible tokens at one position, with any lexer failures met while
/// producing them.
#[derive(Clone, Debug, Default)]
pub struct CandidateSet {
    pub tokens: Vec<Token>,
    pub failures: Vec<LexerFailure>,
}

/// Scanner over one source text.
pub struct LexicalScanner {
    source: Arc<SourceText>,
    registry: Arc<LexerRegistry>,
    /// Raw candidates per position.
    raw: Mutex<HashMap<u32, Arc<CandidateSet>>>,
    /// Candidates with trivia (whitespace, comments) skipped through.
    cooked: Mutex<HashMap<u32, Arc<CandidateSet>>>,
}

impl LexicalScanner {
    pub fn new(source: Arc<SourceText>, registry: Arc<LexerRegistry>) -> Self {
        Self {
            source,
            registry,
            raw: Mutex::new(HashMap::new()),
            cooked: Mutex::new(HashMap::new()),
        }
    }

    pub fn source(&self) -> &Arc<SourceText> {
        &self.source
    }

    pub fn registry(&self) -> &Arc<LexerRegistry> {
        &self.registry
    }

    /// Drop all memoized results. Required after the lexer set changes.
    pub fn reset(&self) {
        self.raw.lock().expect("scanner cache poisoned").clear();
        self.cooked.lock().expect("scanner cache poisoned").clear();
    }

    /// All candidate tokens starting exactly at `position`.
    pub fn candidates_at(&self, position: u32) -> Arc<CandidateSet> {
        if let Some(cached) = self.raw.lock().expect("scanner cache poisoned").get(&position) {
            return Arc::clone(cached);
        }
        let computed = Arc::new(self.scan_position(position));
        self.raw
            .lock()
            .expect("scanner cache poisoned")
            .insert(position, Arc::clone(&computed));
        computed
    }

    /// Candidate tokens visible to the parser at `position`: trivia
    /// candidates are followed through to the tokens after them, per fork.
    pub fn tokens_at(&self, position: u32) -> Arc<CandidateSet> {
        if let Some(cached) = self
            .cooked
            .lock()
            .expect("scanner cache poisoned")
            .get(&position)
        {
            return Arc::clone(cached);
        }

        let mut tokens: Vec<Token> = Vec::new();
        let mut failures = Vec::new();
        let mut visited = HashSet::new();
        let mut worklist = vec![position];
        while let Some(at) = worklist.pop() {
            if !visited.insert(at) {
                continue;
            }
            let raw = self.candidates_at(at);
            failures.extend(raw.failures.iter().cloned());
            for token in &raw.tokens {
                if token.is_trivia() {
                    worklist.push(token.end());
                } else if !tokens.contains(token) {
                    tokens.push(token.clone());
                }
            }
        }

        let computed = Arc::new(CandidateSet { tokens, failures });
        self.cooked
            .lock()
            .expect("scanner cache poisoned")
            .insert(position, Arc::clone(&computed));
        computed
    }

    fn scan_position(&self, position: u32) -> CandidateSet {
        let Some(c) = self.source.char_at(position) else {
            let line = self.source.line_of(position.min(self.source.len()));
            return CandidateSet {
                tokens: vec![Token::end_of_input(self.source.len(), line)],
                failures: Vec::new(),
            };
        };

        let line = self.source.line_of(position);
        let (lexers, mut failures) = self.registry.applicable(c);
        let mut tokens: Vec<Token> = Vec::new();
        for lexer in lexers {
            match lexer.run_body(&self.source, position, line) {
                Ok(candidates) => {
                    for token in candidates {
                        if !tokens.contains(&token) {
                            tokens.push(token);
                        }
                    }
                }
                Err(failure) => failures.push(failure),
            }
        }
        CandidateSet { tokens, failures }
    }
}
