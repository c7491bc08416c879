//! The module header grammar.
//!
//! `Module <string>`, then any of `Versions`, `Extends`, `Uses`, `Names`,
//! `Pragma` - each at most once, in any order - terminated by `Body`.
//! `Extends` and `Uses` carry comma-separated imports: a string module
//! name, an optional parenthesized version set, and an optional `= ( … )`
//! filtered name set. The header is scanned with the frozen bootstrap
//! lexer set; nothing a module defines can change it.

use std::sync::Arc;

use indexmap::IndexSet;
use parlance_syntax::{
    LexicalScanner, SourceText, Token, TokenKind, Value, scanner::header_registry,
};

/// One `Extends`/`Uses` entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleImport {
    pub name: Arc<str>,
    /// Acceptable versions; empty means any.
    pub versions: Vec<Arc<str>>,
    /// Imported names; `None` means all public names.
    pub filtered_names: Option<Vec<Arc<str>>>,
}

/// A parsed module header.
#[derive(Clone, Debug, Default)]
pub struct ModuleHeader {
    pub name: Arc<str>,
    pub versions: Vec<Arc<str>>,
    pub extends: Vec<ModuleImport>,
    pub uses: Vec<ModuleImport>,
    pub names: Vec<Arc<str>>,
    pub pragmas: Vec<Arc<str>>,
    /// Code-point offset just past the `Body` keyword.
    pub body_start: u32,
}

/// A header-parse failure, positioned for the error banner.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct HeaderError {
    pub message: String,
    pub position: u32,
}

impl HeaderError {
    fn new(message: impl Into<String>, position: u32) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

/// Deterministic cursor over the frozen header scanner: at each position
/// the most specific candidate wins (literal, then keyword, then
/// operator).
struct HeaderCursor {
    scanner: LexicalScanner,
    position: u32,
}

impl HeaderCursor {
    fn new(source: Arc<SourceText>) -> Self {
        Self {
            scanner: LexicalScanner::new(source, header_registry()),
            position: 0,
        }
    }

    fn peek(&self) -> Result<Token, HeaderError> {
        let candidates = self.scanner.tokens_at(self.position);
        if let Some(failure) = candidates.failures.first() {
            return Err(HeaderError::new(failure.to_string(), self.position));
        }
        for kind in [TokenKind::Literal, TokenKind::Keyword, TokenKind::Operator] {
            if let Some(token) = candidates.tokens.iter().find(|t| t.kind() == kind) {
                return Ok(token.clone());
            }
        }
        candidates
            .tokens
            .iter()
            .find(|t| t.kind() == TokenKind::End)
            .cloned()
            .ok_or_else(|| HeaderError::new("unrecognized header text", self.position))
    }

    fn bump(&mut self) -> Result<Token, HeaderError> {
        let token = self.peek()?;
        self.position = token.end();
        Ok(token)
    }

    fn expect_keyword(&mut self, word: &str) -> Result<Token, HeaderError> {
        let token = self.bump()?;
        if token.kind() == TokenKind::Keyword && &**token.lexeme() == word {
            Ok(token)
        } else {
            Err(HeaderError::new(
                format!("expected the keyword `{word}`, found `{token}`"),
                token.start(),
            ))
        }
    }

    fn expect_string(&mut self) -> Result<(Arc<str>, Token), HeaderError> {
        let token = self.bump()?;
        match token.value() {
            Some(Value::Str(text)) => Ok((Arc::clone(text), token)),
            _ => Err(HeaderError::new(
                format!("expected a string literal, found `{token}`"),
                token.start(),
            )),
        }
    }

    fn eat_operator(&mut self, lexeme: &str) -> Result<bool, HeaderError> {
        let token = self.peek()?;
        if token.kind() == TokenKind::Operator && &**token.lexeme() == lexeme {
            self.position = token.end();
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect_operator(&mut self, lexeme: &str) -> Result<(), HeaderError> {
        if self.eat_operator(lexeme)? {
            Ok(())
        } else {
            let token = self.peek()?;
            Err(HeaderError::new(
                format!("expected `{lexeme}`, found `{token}`"),
                token.start(),
            ))
        }
    }
}

/// Parse the module header of `source`.
pub fn parse_header(source: &Arc<SourceText>) -> Result<ModuleHeader, HeaderError> {
    let mut cursor = HeaderCursor::new(Arc::clone(source));
    let mut header = ModuleHeader::default();

    cursor.expect_keyword("Module")?;
    let (name, _) = cursor.expect_string()?;
    header.name = name;

    let mut seen: IndexSet<&'static str> = IndexSet::new();
    loop {
        let token = cursor.bump()?;
        if token.kind() != TokenKind::Keyword {
            return Err(HeaderError::new(
                format!("expected a header section keyword, found `{token}`"),
                token.start(),
            ));
        }
        let section = match &**token.lexeme() {
            "Body" => {
                header.body_start = token.end();
                return Ok(header);
            }
            "Versions" => "Versions",
            "Extends" => "Extends",
            "Uses" => "Uses",
            "Names" => "Names",
            "Pragma" => "Pragma",
            other => {
                return Err(HeaderError::new(
                    format!("unknown header section `{other}`"),
                    token.start(),
                ));
            }
        };
        if !seen.insert(section) {
            return Err(HeaderError::new(
                format!("the `{section}` section may appear at most once"),
                token.start(),
            ));
        }
        match section {
            "Versions" => header.versions = string_list(&mut cursor)?,
            "Names" => header.names = string_list(&mut cursor)?,
            "Pragma" => header.pragmas = string_list(&mut cursor)?,
            "Extends" => header.extends = import_list(&mut cursor)?,
            "Uses" => header.uses = import_list(&mut cursor)?,
            _ => unreachable!(),
        }
    }
}

/// Comma-separated string literals.
fn string_list(cursor: &mut HeaderCursor) -> Result<Vec<Arc<str>>, HeaderError> {
    let mut out = Vec::new();
    loop {
        let (text, _) = cursor.expect_string()?;
        out.push(text);
        if !cursor.eat_operator(",")? {
            return Ok(out);
        }
    }
}

/// Comma-separated imports.
fn import_list(cursor: &mut HeaderCursor) -> Result<Vec<ModuleImport>, HeaderError> {
    let mut out = Vec::new();
    loop {
        let (name, _) = cursor.expect_string()?;
        let mut import = ModuleImport {
            name,
            versions: Vec::new(),
            filtered_names: None,
        };
        if cursor.eat_operator("(")? {
            import.versions = string_list(cursor)?;
            cursor.expect_operator(")")?;
        }
        if cursor.eat_operator("=")? {
            cursor.expect_operator("(")?;
            import.filtered_names = Some(string_list(cursor)?);
            cursor.expect_operator(")")?;
        }
        out.push(import);
        if !cursor.eat_operator(",")? {
            return Ok(out);
        }
    }
}
