//! Bootstrap lexers.
//!
//! A module body starts with these six lexers visible; statements executed
//! during compilation may install more. The module-header scanner uses a
//! frozen subset (no number lexer) shared process-wide.

use std::sync::Arc;

use crate::source::SourceText;
use crate::token::{Token, TokenKind};
use crate::value::Value;

use super::lexer::{Lexer, LexerBody};
use super::registry::LexerRegistry;

/// Whitespace runs.
struct WhitespaceLexer;

impl LexerBody for WhitespaceLexer {
    fn filter(&self, c: char) -> Result<bool, String> {
        Ok(c.is_whitespace())
    }

    fn scan(&self, source: &SourceText, start: u32, line: u32) -> Result<Vec<Token>, String> {
        let mut end = start;
        while source.char_at(end).is_some_and(char::is_whitespace) {
            end += 1;
        }
        Ok(vec![Token::new(
            TokenKind::Whitespace,
            source.slice(start, end),
            start,
            line,
        )])
    }
}

/// Nestable block comments: `/* outer /* inner */ outer */`.
struct BlockCommentLexer;

impl LexerBody for BlockCommentLexer {
    fn filter(&self, c: char) -> Result<bool, String> {
        Ok(c == '/')
    }

    fn scan(&self, source: &SourceText, start: u32, line: u32) -> Result<Vec<Token>, String> {
        if source.char_at(start + 1) != Some('*') {
            return Ok(Vec::new());
        }
        let mut depth = 1u32;
        let mut i = start + 2;
        while depth > 0 {
            match (source.char_at(i), source.char_at(i + 1)) {
                (Some('/'), Some('*')) => {
                    depth += 1;
                    i += 2;
                }
                (Some('*'), Some('/')) => {
                    depth -= 1;
                    i += 2;
                }
                (Some(_), _) => i += 1,
                (None, _) => return Err("unterminated block comment".to_string()),
            }
        }
        Ok(vec![Token::new(
            TokenKind::Comment,
            source.slice(start, i),
            start,
            line,
        )])
    }
}

/// Double-quoted string literals with backslash escapes.
struct StringLexer;

impl LexerBody for StringLexer {
    fn filter(&self, c: char) -> Result<bool, String> {
        Ok(c == '"')
    }

    fn scan(&self, source: &SourceText, start: u32, line: u32) -> Result<Vec<Token>, String> {
        let mut content = String::new();
        let mut i = start + 1;
        loop {
            match source.char_at(i) {
                Some('"') => {
                    i += 1;
                    break;
                }
                Some('\\') => {
                    let escaped = match source.char_at(i + 1) {
                        Some('"') => '"',
                        Some('\\') => '\\',
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some(other) => {
                            return Err(format!("invalid escape sequence `\\{other}`"));
                        }
                        None => return Err("unterminated string literal".to_string()),
                    };
                    content.push(escaped);
                    i += 2;
                }
                Some(c) => {
                    content.push(c);
                    i += 1;
                }
                None => return Err("unterminated string literal".to_string()),
            }
        }
        Ok(vec![Token::literal(
            source.slice(start, i),
            start,
            line,
            Value::Str(Arc::from(content)),
        )])
    }
}

/// Whole-number literals.
struct WholeNumberLexer;

impl LexerBody for WholeNumberLexer {
    fn filter(&self, c: char) -> Result<bool, String> {
        Ok(c.is_ascii_digit())
    }

    fn scan(&self, source: &SourceText, start: u32, line: u32) -> Result<Vec<Token>, String> {
        let mut end = start;
        while source.char_at(end).is_some_and(|c| c.is_ascii_digit()) {
            end += 1;
        }
        let text = source.slice(start, end);
        let value: i64 = text
            .parse()
            .map_err(|_| format!("integer literal `{text}` is out of range"))?;
        Ok(vec![Token::literal(
            text,
            start,
            line,
            Value::Integer(value),
        )])
    }
}

/// Alphanumeric runs starting with a letter.
struct KeywordLexer;

impl LexerBody for KeywordLexer {
    fn filter(&self, c: char) -> Result<bool, String> {
        Ok(c.is_alphabetic())
    }

    fn scan(&self, source: &SourceText, start: u32, line: u32) -> Result<Vec<Token>, String> {
        let mut end = start;
        while source.char_at(end).is_some_and(char::is_alphanumeric) {
            end += 1;
        }
        Ok(vec![Token::new(
            TokenKind::Keyword,
            source.slice(start, end),
            start,
            line,
        )])
    }
}

/// Any single non-alphanumeric, non-whitespace codepoint.
struct OperatorLexer;

impl LexerBody for OperatorLexer {
    fn filter(&self, c: char) -> Result<bool, String> {
        Ok(!c.is_whitespace() && !c.is_alphanumeric())
    }

    fn scan(&self, source: &SourceText, start: u32, line: u32) -> Result<Vec<Token>, String> {
        match source.char_at(start) {
            Some(c) => Ok(vec![Token::new(
                TokenKind::Operator,
                c.to_string(),
                start,
                line,
            )]),
            None => Ok(Vec::new()),
        }
    }
}

/// The six lexers visible at the start of every module body.
pub fn bootstrap_lexers() -> Vec<Arc<Lexer>> {
    vec![
        Lexer::new("whitespace lexer", Arc::new(WhitespaceLexer)),
        Lexer::new("comment lexer", Arc::new(BlockCommentLexer)),
        Lexer::new("string lexer", Arc::new(StringLexer)),
        Lexer::new("whole number lexer", Arc::new(WholeNumberLexer)),
        Lexer::new("keyword lexer", Arc::new(KeywordLexer)),
        Lexer::new("operator lexer", Arc::new(OperatorLexer)),
    ]
}

/// The frozen lexer set used by the module-header scanner: the bootstrap
/// set minus numbers. Shared and immutable.
pub fn header_registry() -> Arc<LexerRegistry> {
    use std::sync::OnceLock;
    static HEADER: OnceLock<Arc<LexerRegistry>> = OnceLock::new();
    Arc::clone(HEADER.get_or_init(|| {
        let lexers = vec![
            Lexer::new("whitespace lexer", Arc::new(WhitespaceLexer)),
            Lexer::new("comment lexer", Arc::new(BlockCommentLexer)),
            Lexer::new("string lexer", Arc::new(StringLexer)),
            Lexer::new("keyword lexer", Arc::new(KeywordLexer)),
            Lexer::new("operator lexer", Arc::new(OperatorLexer)),
        ];
        Arc::new(LexerRegistry::frozen(lexers))
    }))
}

/// A fresh, extensible registry holding the bootstrap set.
pub fn body_registry() -> LexerRegistry {
    LexerRegistry::extensible(bootstrap_lexers())
}
