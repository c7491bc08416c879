//! Tokenization of message names into parts.
//!
//! Letters and digits accumulate into alphanumeric runs; every operator
//! character is its own part; a single space separates runs. A backquote
//! escapes the operator character after it, turning it into an ordinary
//! keyword part.

use std::sync::Arc;

use logos::Logos;

use crate::error::MessageError;

/// The operator characters with grammatical meaning.
pub mod metachar {
    pub const OPEN_GROUP: char = '«';
    pub const CLOSE_GROUP: char = '»';
    pub const DOUBLE_DAGGER: char = '‡';
    pub const UNDERSCORE: char = '_';
    pub const ELLIPSIS: char = '…';
    pub const SINGLE_DAGGER: char = '†';
    pub const UP_ARROW: char = '↑';
    pub const OCTOTHORP: char = '#';
    pub const QUESTION_MARK: char = '?';
    pub const EXCLAMATION_MARK: char = '!';
    pub const TILDE: char = '~';
    pub const VERTICAL_BAR: char = '|';
    pub const SECTION_SIGN: char = '§';
    pub const BACKQUOTE: char = '`';
}

/// Raw lexical classes of the pattern notation.
#[derive(Logos, Clone, Copy, PartialEq, Eq, Debug)]
enum RawPart {
    #[regex(r"[\p{L}\p{N}]+")]
    Word,

    #[token(" ")]
    Space,

    #[token("`")]
    Backquote,

    /// Any other single character: operator characters, both grammatical
    /// and ordinary.
    #[regex(r"[^ \p{L}\p{N}]", priority = 1)]
    Operator,
}

/// One part of a message name.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Part {
    /// An alphanumeric run, matched verbatim against keyword tokens.
    Word(Arc<str>),
    /// An operator character. When `escaped`, it has no grammatical
    /// meaning and is matched verbatim.
    Operator { c: char, escaped: bool },
}

impl Part {
    /// The text a token must carry to match this part.
    pub fn text(&self) -> String {
        match self {
            Part::Word(text) => text.to_string(),
            Part::Operator { c, .. } => c.to_string(),
        }
    }
}

/// Split a message name into parts, validating canonical form.
pub fn tokenize(name: &str) -> Result<Vec<Part>, MessageError> {
    if name.is_empty() {
        return Err(MessageError::MethodNameNotCanonical(
            "name is empty".to_string(),
        ));
    }

    #[derive(Clone, Copy, PartialEq)]
    enum Last {
        Start,
        Space,
        Other,
    }

    let mut parts = Vec::new();
    let mut lexer = RawPart::lexer(name);
    let mut last = Last::Start;
    while let Some(raw) = lexer.next() {
        let raw = raw.map_err(|()| {
            MessageError::MethodNameNotCanonical(format!(
                "unrecognized text at byte {}",
                lexer.span().start
            ))
        })?;
        match raw {
            RawPart::Word => {
                parts.push(Part::Word(Arc::from(lexer.slice())));
                last = Last::Other;
            }
            RawPart::Space => {
                match last {
                    Last::Start => {
                        return Err(MessageError::MethodNameNotCanonical(
                            "name must not start with a space".to_string(),
                        ));
                    }
                    Last::Space => {
                        return Err(MessageError::MethodNameNotCanonical(
                            "two consecutive spaces".to_string(),
                        ));
                    }
                    Last::Other => {}
                }
                last = Last::Space;
            }
            RawPart::Backquote => {
                let c = match lexer.next() {
                    Some(Ok(RawPart::Operator)) => {
                        lexer.slice().chars().next().expect("operator slice")
                    }
                    Some(Ok(RawPart::Backquote)) => metachar::BACKQUOTE,
                    _ => return Err(MessageError::ExpectedOperatorAfterBackquote),
                };
                parts.push(Part::Operator { c, escaped: true });
                last = Last::Other;
            }
            RawPart::Operator => {
                let c = lexer.slice().chars().next().expect("operator slice");
                if c.is_whitespace() {
                    return Err(MessageError::MethodNameNotCanonical(
                        "only plain spaces may separate parts".to_string(),
                    ));
                }
                parts.push(Part::Operator { c, escaped: false });
                last = Last::Other;
            }
        }
    }
    if last == Last::Space {
        return Err(MessageError::MethodNameNotCanonical(
            "name must not end with a space".to_string(),
        ));
    }
    Ok(parts)
}
