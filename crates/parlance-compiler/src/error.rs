//! The structured compilation error and its banner.
//!
//! Every failure carries the module name and, where one exists, the
//! code-point position with its line and column. The banner for a parse
//! failure lists every distinct expectation at the rightmost position
//! any attempt reached.

use annotate_snippets::{Level, Renderer, Snippet};
use parlance_syntax::{DecodeError, SourceText};

/// Why a module failed to compile.
#[derive(Debug, thiserror::Error)]
pub enum CompilationError {
    #[error("{module}: {source}")]
    Decode {
        module: String,
        #[source]
        source: DecodeError,
    },

    #[error("{module}:{line}:{column}: {message}")]
    Header {
        module: String,
        message: String,
        position: u32,
        line: u32,
        column: u32,
    },

    #[error("{module}: import failed: {message}")]
    Import { module: String, message: String },

    #[error("{module}: {message}")]
    Pragma { module: String, message: String },

    #[error("{module}:{line}:{column}: {}", render_expectations(.expectations))]
    Parse {
        module: String,
        position: u32,
        line: u32,
        column: u32,
        expectations: Vec<String>,
    },

    #[error(
        "{module}:{line}:{column}: the statement is ambiguous; it can be read as {first} or as {second}"
    )]
    Ambiguity {
        module: String,
        position: u32,
        line: u32,
        column: u32,
        first: String,
        second: String,
    },

    #[error("{module}: statement execution failed: {message}")]
    Execution { module: String, message: String },

    #[error("{module}: unresolved forward declarations: {}", .names.join(", "))]
    UnresolvedForwards { module: String, names: Vec<String> },

    #[error("{module}: {message}")]
    Serialize { module: String, message: String },

    #[error("{module}: {message}")]
    Internal { module: String, message: String },
}

fn render_expectations(expectations: &[String]) -> String {
    if expectations.is_empty() {
        return "the statement could not be parsed".to_string();
    }
    format!("expected {}", expectations.join("\n          or "))
}

impl CompilationError {
    /// The code-point position the error is anchored to, if any.
    pub fn position(&self) -> Option<u32> {
        match self {
            CompilationError::Header { position, .. }
            | CompilationError::Parse { position, .. }
            | CompilationError::Ambiguity { position, .. } => Some(*position),
            _ => None,
        }
    }

    /// A source-annotated banner for terminal display.
    pub fn banner(&self, source: &SourceText) -> String {
        let Some(position) = self.position() else {
            return self.to_string();
        };
        let text = source.slice(0, source.len());
        if text.is_empty() {
            return self.to_string();
        }

        // Code-point position to byte span over one character.
        let byte_start: usize = text
            .chars()
            .take(position as usize)
            .map(char::len_utf8)
            .sum();
        let byte_end = text[byte_start..]
            .chars()
            .next()
            .map(|c| byte_start + c.len_utf8())
            .unwrap_or(byte_start);

        let title = self.to_string();
        let origin = source.module_name().to_string();
        let message = Level::Error.title(&title).snippet(
            Snippet::source(&text)
                .origin(&origin)
                .line_start(1)
                .fold(true)
                .annotation(Level::Error.span(byte_start..byte_end)),
        );
        Renderer::plain().render(message).to_string()
    }
}
