//! The immutable scanned token.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::value::Value;

/// What kind of lexical element a token is.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TokenKind {
    /// Synthetic end-of-input marker.
    End,
    /// An alphanumeric run.
    Keyword,
    /// A literal with an attached value (string, number).
    Literal,
    /// A single operator character.
    Operator,
    /// A comment; trivia to the parser.
    Comment,
    /// A whitespace run; trivia to the parser.
    Whitespace,
}

/// One scanned token. Immutable once produced; shared by every parse
/// attempt that reaches its position.
#[derive(Clone, Debug)]
pub struct Token {
    kind: TokenKind,
    lexeme: Arc<str>,
    /// Code-point offset of the first character.
    start: u32,
    /// Length in code points.
    length: u32,
    /// One-based line number.
    line: u32,
    /// Value carried by a `Literal` token.
    literal: Option<Value>,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<Arc<str>>, start: u32, line: u32) -> Self {
        let lexeme = lexeme.into();
        let length = lexeme.chars().count() as u32;
        Self {
            kind,
            lexeme,
            start,
            length,
            line,
            literal: None,
        }
    }

    /// A literal token carrying its parsed value.
    pub fn literal(
        lexeme: impl Into<Arc<str>>,
        start: u32,
        line: u32,
        value: Value,
    ) -> Self {
        let mut token = Self::new(TokenKind::Literal, lexeme, start, line);
        token.literal = Some(value);
        token
    }

    /// The synthetic end-of-input token.
    pub fn end_of_input(position: u32, line: u32) -> Self {
        Self::new(TokenKind::End, "", position, line)
    }

    #[inline]
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    #[inline]
    pub fn lexeme(&self) -> &Arc<str> {
        &self.lexeme
    }

    #[inline]
    pub fn start(&self) -> u32 {
        self.start
    }

    /// Code-point offset just past the token.
    #[inline]
    pub fn end(&self) -> u32 {
        self.start + self.length
    }

    #[inline]
    pub fn line(&self) -> u32 {
        self.line
    }

    #[inline]
    pub fn value(&self) -> Option<&Value> {
        self.literal.as_ref()
    }

    /// Whitespace and comments are invisible to the parser.
    #[inline]
    pub fn is_trivia(&self) -> bool {
        matches!(self.kind, TokenKind::Comment | TokenKind::Whitespace)
    }

    /// Whether the parser may match this token against a message part.
    #[inline]
    pub fn is_part_candidate(&self) -> bool {
        matches!(self.kind, TokenKind::Keyword | TokenKind::Operator)
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        // Kind, position, and lexeme determine the literal value as well.
        self.kind == other.kind && self.start == other.start && self.lexeme == other.lexeme
    }
}

impl Eq for Token {}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.start.hash(state);
        self.lexeme.hash(state);
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::End => write!(f, "end of input"),
            _ => write!(f, "{}", self.lexeme),
        }
    }
}
