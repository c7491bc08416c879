//! The message expression tree.
//!
//! Parsing a message name produces a sequence of these expressions; each
//! knows how many arguments it yields, whether its keywords are lowercase,
//! and (in `emit`) how to compile itself into parsing instructions.

use std::sync::Arc;

use parlance_core::{Symbol, is_lower_case};

/// The body of a guillemet group, split at the double dagger when present.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct GroupExpr {
    pub before: Vec<MessageExpr>,
    pub after: Option<Vec<MessageExpr>>,
}

impl GroupExpr {
    pub fn has_dagger(&self) -> bool {
        self.after.is_some()
    }

    /// Expressions on the far side of the dagger, or none.
    pub fn after_items(&self) -> &[MessageExpr] {
        self.after.as_deref().unwrap_or(&[])
    }

    /// Arguments yielded by one iteration, before the dagger.
    pub fn before_yield_count(&self) -> u32 {
        sequence_yield_count(&self.before)
    }

    /// Arguments yielded by one iteration, after the dagger.
    pub fn after_yield_count(&self) -> u32 {
        sequence_yield_count(self.after_items())
    }

    /// Total arguments yielded by one full iteration.
    pub fn iteration_yield_count(&self) -> u32 {
        self.before_yield_count() + self.after_yield_count()
    }

    /// A group builds a flat list when each iteration yields exactly one
    /// argument before the dagger and none after; otherwise every
    /// iteration is wrapped into its own fixed-length list.
    pub fn needs_double_wrapping(&self) -> bool {
        !(self.before_yield_count() == 1 && self.after_yield_count() == 0)
    }

    pub fn is_lower_case(&self) -> bool {
        self.before.iter().all(MessageExpr::is_lower_case)
            && self.after_items().iter().all(MessageExpr::is_lower_case)
    }

    pub fn underscore_count(&self) -> u32 {
        self.before
            .iter()
            .chain(self.after_items())
            .map(MessageExpr::underscore_count)
            .sum()
    }

    fn collect_section_checkpoints(&self, out: &mut Vec<u32>) {
        for item in self.before.iter().chain(self.after_items()) {
            item.collect_section_checkpoints(out);
        }
    }
}

/// One expression within a message name.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum MessageExpr {
    /// A keyword or ordinary operator part, matched verbatim.
    Simple { text: Arc<str>, symbol: Symbol },
    /// `_` - parse one argument expression.
    Argument,
    /// `_†` - parse in module scope and evaluate at parse time.
    ModuleScopeArgument,
    /// `_↑` - parse a reference to an assignable variable.
    VariableQuote,
    /// `…` - accept any single token, delivered as a literal.
    RawToken,
    /// `«…»` - a repeating group.
    Group(Box<GroupExpr>),
    /// `«…»#` - a repeating group yielding its iteration count.
    Counter(Box<GroupExpr>),
    /// `«…»?` - an optional group yielding a boolean.
    Optional(Box<GroupExpr>),
    /// `…??` - optionally present, yielding nothing.
    CompletelyOptional(Box<MessageExpr>),
    /// `…~` - match the decorated expression case-insensitively.
    CaseInsensitive(Box<MessageExpr>),
    /// `a|b|c` - exactly one branch, yielding nothing.
    Alternation(Vec<MessageExpr>),
    /// `«a|b|c»!` - exactly one branch, yielding its one-based number.
    NumberedChoice(Box<GroupExpr>),
    /// `§` - run the enclosing macro's next prefix function here.
    SectionCheckpoint { number: u32 },
}

impl MessageExpr {
    /// How many arguments this expression pushes (0 or 1).
    pub fn yield_count(&self) -> u32 {
        match self {
            MessageExpr::Argument
            | MessageExpr::ModuleScopeArgument
            | MessageExpr::VariableQuote
            | MessageExpr::RawToken
            | MessageExpr::Group(_)
            | MessageExpr::Counter(_)
            | MessageExpr::Optional(_)
            | MessageExpr::NumberedChoice(_) => 1,
            MessageExpr::CaseInsensitive(inner) => inner.yield_count(),
            MessageExpr::Simple { .. }
            | MessageExpr::CompletelyOptional(_)
            | MessageExpr::Alternation(_)
            | MessageExpr::SectionCheckpoint { .. } => 0,
        }
    }

    /// Whether this is one of the leaf argument markers.
    pub fn is_leaf_argument(&self) -> bool {
        matches!(
            self,
            MessageExpr::Argument
                | MessageExpr::ModuleScopeArgument
                | MessageExpr::VariableQuote
                | MessageExpr::RawToken
        )
    }

    pub fn is_group(&self) -> bool {
        matches!(
            self,
            MessageExpr::Group(_)
                | MessageExpr::Counter(_)
                | MessageExpr::Optional(_)
                | MessageExpr::NumberedChoice(_)
        )
    }

    pub fn is_argument_or_group(&self) -> bool {
        self.is_leaf_argument() || self.is_group()
    }

    /// Count of leaf argument markers in this subtree.
    pub fn underscore_count(&self) -> u32 {
        match self {
            MessageExpr::Argument
            | MessageExpr::ModuleScopeArgument
            | MessageExpr::VariableQuote
            | MessageExpr::RawToken => 1,
            MessageExpr::Group(group)
            | MessageExpr::Counter(group)
            | MessageExpr::Optional(group)
            | MessageExpr::NumberedChoice(group) => group.underscore_count(),
            MessageExpr::CompletelyOptional(inner) | MessageExpr::CaseInsensitive(inner) => {
                inner.underscore_count()
            }
            MessageExpr::Alternation(branches) => {
                branches.iter().map(MessageExpr::underscore_count).sum()
            }
            MessageExpr::Simple { .. } | MessageExpr::SectionCheckpoint { .. } => 0,
        }
    }

    /// Whether every keyword in this subtree is lowercase.
    pub fn is_lower_case(&self) -> bool {
        match self {
            MessageExpr::Simple { text, .. } => is_lower_case(text),
            MessageExpr::Group(group)
            | MessageExpr::Counter(group)
            | MessageExpr::Optional(group)
            | MessageExpr::NumberedChoice(group) => group.is_lower_case(),
            MessageExpr::CompletelyOptional(inner) | MessageExpr::CaseInsensitive(inner) => {
                inner.is_lower_case()
            }
            MessageExpr::Alternation(branches) => {
                branches.iter().all(MessageExpr::is_lower_case)
            }
            _ => true,
        }
    }

    /// Section checkpoint numbers in this subtree, in order.
    pub fn collect_section_checkpoints(&self, out: &mut Vec<u32>) {
        match self {
            MessageExpr::SectionCheckpoint { number } => out.push(*number),
            MessageExpr::Group(group)
            | MessageExpr::Counter(group)
            | MessageExpr::Optional(group)
            | MessageExpr::NumberedChoice(group) => group.collect_section_checkpoints(out),
            MessageExpr::CompletelyOptional(inner) | MessageExpr::CaseInsensitive(inner) => {
                inner.collect_section_checkpoints(out)
            }
            MessageExpr::Alternation(branches) => {
                for branch in branches {
                    branch.collect_section_checkpoints(out);
                }
            }
            _ => {}
        }
    }
}

/// Total arguments yielded by a sequence of expressions.
pub fn sequence_yield_count(sequence: &[MessageExpr]) -> u32 {
    sequence.iter().map(MessageExpr::yield_count).sum()
}
