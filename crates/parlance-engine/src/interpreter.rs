//! Collaborator seams for parse-time evaluation.
//!
//! The engine never interprets function bodies itself: semantic
//! restrictions, macro bodies, prefix functions, and module-scope
//! argument evaluation all go through an injected `Interpreter`, and
//! blocks become functions through an injected `CodeGenerator`.

use std::sync::Arc;

use parlance_syntax::{FunctionValue, Phrase, Value};

use crate::runtime::Runtime;

/// Why running a function at parse time did not produce a value.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RunError {
    /// The function explicitly rejected the current parse; the message is
    /// threaded into the expectations at the send's position.
    #[error("{message}")]
    Rejected { message: String },

    /// The function failed; the raw error text is surfaced.
    #[error("{message}")]
    Failed { message: String },
}

impl RunError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// Runs function values on behalf of the engine.
pub trait Interpreter: Send + Sync {
    /// Apply `function` to `arguments`, returning its value.
    fn run(
        &self,
        function: &FunctionValue,
        arguments: &[Value],
        runtime: &Runtime,
    ) -> Result<Value, RunError>;
}

/// Code generation failed.
#[derive(Debug, Clone, thiserror::Error)]
#[error("code generation failed: {message}")]
pub struct CodeGenError {
    pub message: String,
}

impl CodeGenError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Compiles block phrases into function values.
pub trait CodeGenerator: Send + Sync {
    /// Compile a block phrase (or a bare expression wrapped as a
    /// zero-argument block) into a function value.
    fn generate(&self, block: &Arc<Phrase>) -> Result<Arc<FunctionValue>, CodeGenError>;
}
