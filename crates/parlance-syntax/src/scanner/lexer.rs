//! User-installable lexers.
//!
//! Every lexer pairs a cheap per-codepoint filter with a body that produces
//! candidate tokens. Filter verdicts for Latin-1 codepoints are cached on
//! the lexer itself in atomic slots; verdicts for supplementary codepoints
//! go through the registry's shared map. A filter failure skips the cache
//! so a transient error cannot freeze into a stale verdict.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::source::SourceText;
use crate::token::Token;

/// A lexer filter or body failed; collected and reported by the compiler.
#[derive(Clone, Debug, thiserror::Error)]
#[error("lexer {lexer}: {message}")]
pub struct LexerFailure {
    pub lexer: Arc<str>,
    pub message: String,
}

impl LexerFailure {
    pub fn new(lexer: &Arc<str>, message: impl Into<String>) -> Self {
        Self {
            lexer: Arc::clone(lexer),
            message: message.into(),
        }
    }
}

/// Behavior of a lexer: the applicability filter and the scanning body.
pub trait LexerBody: Send + Sync {
    /// Whether this lexer might produce a token starting with `c`.
    fn filter(&self, c: char) -> Result<bool, String>;

    /// Produce zero or more candidate tokens at `start`. More than one
    /// token is a lexical fork; the parser explores each alternative.
    fn scan(&self, source: &SourceText, start: u32, line: u32) -> Result<Vec<Token>, String>;
}

const VERDICT_UNKNOWN: u8 = 0;
const VERDICT_YES: u8 = 1;
const VERDICT_NO: u8 = 2;

/// A registered lexer with its per-codepoint applicability cache.
pub struct Lexer {
    name: Arc<str>,
    body: Arc<dyn LexerBody>,
    /// Cached filter verdicts for Latin-1 codepoints.
    latin1: [AtomicU8; 256],
}

impl Lexer {
    pub fn new(name: &str, body: Arc<dyn LexerBody>) -> Arc<Self> {
        Arc::new(Self {
            name: Arc::from(name),
            body,
            latin1: std::array::from_fn(|_| AtomicU8::new(VERDICT_UNKNOWN)),
        })
    }

    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    /// The cached Latin-1 verdict, if one has been recorded.
    pub(crate) fn cached_latin1(&self, c: char) -> Option<bool> {
        let code = c as u32;
        if code >= 256 {
            return None;
        }
        match self.latin1[code as usize].load(Ordering::Relaxed) {
            VERDICT_YES => Some(true),
            VERDICT_NO => Some(false),
            _ => None,
        }
    }

    /// Run the filter for `c`, recording the verdict for Latin-1
    /// codepoints. Failures record nothing.
    pub(crate) fn run_filter(&self, c: char) -> Result<bool, LexerFailure> {
        match self.body.filter(c) {
            Ok(verdict) => {
                let code = c as u32;
                if code < 256 {
                    let encoded = if verdict { VERDICT_YES } else { VERDICT_NO };
                    self.latin1[code as usize].store(encoded, Ordering::Relaxed);
                }
                Ok(verdict)
            }
            Err(message) => Err(LexerFailure::new(&self.name, message)),
        }
    }

    /// Run the body at `start`; tokens that fail to advance are dropped.
    pub(crate) fn run_body(
        &self,
        source: &SourceText,
        start: u32,
        line: u32,
    ) -> Result<Vec<Token>, LexerFailure> {
        match self.body.scan(source, start, line) {
            Ok(tokens) => Ok(tokens
                .into_iter()
                .filter(|token| token.start() == start && token.end() > start)
                .collect()),
            Err(message) => Err(LexerFailure::new(&self.name, message)),
        }
    }
}

impl std::fmt::Debug for Lexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lexer").field("name", &self.name).finish()
    }
}
