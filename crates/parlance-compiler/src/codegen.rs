//! Block-to-function compilation.
//!
//! The front end hands block phrases to a `CodeGenerator` collaborator;
//! this one packages the block as a phrase-bodied function value, which
//! the bootstrap evaluator can run directly.

use std::sync::Arc;

use parlance_engine::{CodeGenError, CodeGenerator};
use parlance_syntax::{FunctionBody, FunctionValue, Phrase};

/// The provided code generator: no lowering, just a callable wrapper
/// around the block phrase.
#[derive(Default, Clone, Copy, Debug)]
pub struct PhraseCodeGenerator;

impl CodeGenerator for PhraseCodeGenerator {
    fn generate(&self, block: &Arc<Phrase>) -> Result<Arc<FunctionValue>, CodeGenError> {
        let Phrase::Block {
            arguments,
            result_type,
            ..
        } = &**block
        else {
            return Err(CodeGenError::new(format!(
                "expected a block phrase, found a {}",
                block.kind_name()
            )));
        };
        Ok(Arc::new(FunctionValue {
            name: Arc::from("compiled block"),
            params: arguments
                .iter()
                .map(|argument| argument.declared_type.clone())
                .collect(),
            result: result_type.clone(),
            body: FunctionBody::Phrase {
                parameters: arguments.clone(),
                body: Arc::clone(block),
            },
        }))
    }
}
