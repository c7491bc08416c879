//! Signature checking against the message shape.
//!
//! A definition's function type must structurally match the message it is
//! offered for: the arity equals the message's argument count, group slots
//! take tuple types with the right size range, counters take whole
//! numbers, optionals take booleans, numbered choices cover exactly their
//! branch count.

use parlance_syntax::{FunctionType, SizeRange, Type};

use crate::error::MessageError;
use crate::expression::{GroupExpr, MessageExpr};
use crate::splitter::MessageSplitter;

impl MessageSplitter {
    /// Validate a proposed method or macro-body signature.
    ///
    /// With `section` set, validates the signature of the numbered prefix
    /// function instead: prefix functions receive the partial argument
    /// list assembled at their checkpoint as a single tuple-typed value.
    pub fn check_implementation_signature(
        &self,
        signature: &FunctionType,
        section: Option<u32>,
    ) -> Result<(), MessageError> {
        if let Some(section) = section {
            return self.check_prefix_signature(signature, section);
        }

        let yielders: Vec<&MessageExpr> = self
            .root()
            .iter()
            .filter(|expr| expr.yield_count() == 1)
            .collect();
        if yielders.len() as u32 != signature.params.len() as u32 {
            return Err(MessageError::IncorrectNumberOfArguments {
                expected: yielders.len() as u32,
                given: signature.params.len() as u32,
            });
        }
        for (expr, param) in yielders.iter().zip(&signature.params) {
            check_slot(expr, param)?;
        }
        Ok(())
    }

    fn check_prefix_signature(
        &self,
        signature: &FunctionType,
        section: u32,
    ) -> Result<(), MessageError> {
        if section == 0 || section > self.section_checkpoint_count() {
            return Err(MessageError::IncorrectNumberOfArguments {
                expected: self.section_checkpoint_count(),
                given: section,
            });
        }
        if signature.params.len() != 1 {
            return Err(MessageError::IncorrectNumberOfArguments {
                expected: 1,
                given: signature.params.len() as u32,
            });
        }
        match &signature.params[0] {
            Type::Tuple(_) => Ok(()),
            _ => Err(MessageError::IncorrectArgumentType),
        }
    }
}

/// Check one argument slot's type against the expression that fills it.
fn check_slot(expr: &MessageExpr, t: &Type) -> Result<(), MessageError> {
    match expr {
        MessageExpr::Argument
        | MessageExpr::ModuleScopeArgument
        | MessageExpr::VariableQuote
        | MessageExpr::RawToken => {
            if t.is_top() || t.is_bottom() {
                Err(MessageError::IncorrectArgumentType)
            } else {
                Ok(())
            }
        }
        MessageExpr::CaseInsensitive(inner) => check_slot(inner, t),
        MessageExpr::Group(group) => check_group_slot(group, t),
        MessageExpr::Counter(_) => match t {
            Type::Integer(range) if range.low.is_some_and(|low| low >= 0) => Ok(()),
            _ => Err(MessageError::IncorrectTypeForCountingGroup),
        },
        MessageExpr::Optional(_) => match t {
            Type::Boolean => Ok(()),
            _ => Err(MessageError::IncorrectTypeForBooleanGroup),
        },
        MessageExpr::NumberedChoice(group) => {
            let choices = match group.before.as_slice() {
                [MessageExpr::Alternation(branches)] => branches.len() as i64,
                _ => 0,
            };
            match t {
                Type::Integer(range)
                    if range.low == Some(1) && range.high == Some(choices) =>
                {
                    Ok(())
                }
                _ => Err(MessageError::IncorrectTypeForNumberedChoice),
            }
        }
        // Non-yielding expressions fill no slot; reaching one is a caller
        // error, treated as a mismatch.
        _ => Err(MessageError::IncorrectArgumentType),
    }
}

fn check_group_slot(group: &GroupExpr, t: &Type) -> Result<(), MessageError> {
    let double = group.needs_double_wrapping();
    let Type::Tuple(tuple) = t else {
        return Err(if double {
            MessageError::IncorrectTypeForComplexGroup
        } else {
            MessageError::IncorrectTypeForGroup
        });
    };

    if double {
        // Every iteration produces a fixed-length inner tuple; the exit
        // branch at the dagger may deliver a partial one.
        let before = group.before_yield_count();
        let total = group.iteration_yield_count();
        let iteration_sizes = SizeRange::inclusive(before, total);
        let inner_yielders: Vec<&MessageExpr> = group
            .before
            .iter()
            .chain(group.after_items())
            .filter(|e| e.yield_count() == 1)
            .collect();

        let span = tuple.leading.len() + 1;
        for position in 0..span {
            let element = tuple.type_at(position);
            if element.is_bottom() {
                continue;
            }
            let Type::Tuple(inner) = element else {
                return Err(MessageError::IncorrectTypeForComplexGroup);
            };
            if !inner.sizes.contains(&iteration_sizes) {
                return Err(MessageError::IncorrectTypeForComplexGroup);
            }
            for (i, yielder) in inner_yielders.iter().enumerate() {
                check_slot(yielder, inner.type_at(i))?;
            }
        }
        Ok(())
    } else {
        let yielder = group
            .before
            .iter()
            .chain(group.after_items())
            .find(|e| e.yield_count() == 1)
            .ok_or(MessageError::IncorrectTypeForGroup)?;
        for position in 0..=tuple.leading.len() {
            let element = tuple.type_at(position);
            if element.is_bottom() {
                continue;
            }
            check_slot(yielder, element)?;
        }
        Ok(())
    }
}
