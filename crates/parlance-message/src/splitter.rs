//! The message splitter.
//!
//! Splits a message name into parts, parses the parts into an expression
//! tree by recursive descent, and compiles the tree into a parsing
//! program. Modifier characters attach to the expression just parsed and
//! carry strict preconditions; violations surface as `MessageError`s.

use std::sync::Arc;

use parlance_core::{Interner, Symbol};

use crate::emit::emit_sequence;
use crate::error::MessageError;
use crate::expression::{GroupExpr, MessageExpr, sequence_yield_count};
use crate::instruction::ParsingProgram;
use crate::part::{Part, metachar, tokenize};

/// A split message name: its expression tree and parsing program.
#[derive(Clone, Debug)]
pub struct MessageSplitter {
    name: Arc<str>,
    root: Vec<MessageExpr>,
    argument_count: u32,
    underscore_count: u32,
    section_checkpoint_count: u32,
    program: Arc<ParsingProgram>,
}

impl MessageSplitter {
    /// Split a message name. Keyword parts are interned as they are found.
    pub fn split(name: &str, interner: &mut Interner) -> Result<Self, MessageError> {
        let parts = tokenize(name)?;
        let mut parser = NameParser {
            parts: &parts,
            pos: 0,
            sections: 0,
            interner,
        };
        let root = parser.parse_top()?;
        let sections = parser.sections;
        let program = emit_sequence(&root);
        Ok(Self {
            name: Arc::from(name),
            argument_count: sequence_yield_count(&root),
            underscore_count: root.iter().map(MessageExpr::underscore_count).sum(),
            section_checkpoint_count: sections,
            root,
            program: Arc::new(program),
        })
    }

    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    /// The top-level expression sequence.
    pub fn root(&self) -> &[MessageExpr] {
        &self.root
    }

    /// Number of arguments a send of this message carries.
    pub fn argument_count(&self) -> u32 {
        self.argument_count
    }

    /// Number of leaf argument markers anywhere in the name.
    pub fn underscore_count(&self) -> u32 {
        self.underscore_count
    }

    /// Number of `§` markers in the name.
    pub fn section_checkpoint_count(&self) -> u32 {
        self.section_checkpoint_count
    }

    pub fn program(&self) -> &Arc<ParsingProgram> {
        &self.program
    }

    /// Render the name with argument renderings substituted for its
    /// argument positions, for banners and traces.
    pub fn print_with_arguments(&self, arguments: &[String]) -> String {
        let mut remaining = arguments.iter();
        let rendered: Vec<String> = self
            .root
            .iter()
            .map(|expr| print_expr(expr, &mut remaining))
            .collect();
        rendered.join(" ")
    }

    /// Render the name with the given argument types filled in.
    pub fn print_with_types(&self, types: &[parlance_syntax::Type]) -> String {
        let strings: Vec<String> = types.iter().map(|t| t.to_string()).collect();
        self.print_with_arguments(&strings)
    }
}

fn print_expr<'a>(
    expr: &MessageExpr,
    args: &mut dyn Iterator<Item = &'a String>,
) -> String {
    match expr {
        MessageExpr::Simple { text, .. } => text.to_string(),
        MessageExpr::Argument
        | MessageExpr::ModuleScopeArgument
        | MessageExpr::VariableQuote
        | MessageExpr::RawToken
        | MessageExpr::Group(_)
        | MessageExpr::Counter(_)
        | MessageExpr::Optional(_)
        | MessageExpr::NumberedChoice(_) => match args.next() {
            Some(rendering) => rendering.clone(),
            None => "_".to_string(),
        },
        MessageExpr::CaseInsensitive(inner) => print_expr(inner, args),
        MessageExpr::CompletelyOptional(inner) => format!("{}??", print_expr(inner, args)),
        MessageExpr::Alternation(branches) => branches
            .iter()
            .map(|branch| print_expr(branch, args))
            .collect::<Vec<_>>()
            .join("|"),
        MessageExpr::SectionCheckpoint { .. } => "§".to_string(),
    }
}

/// Recursive-descent parser over the part stream.
struct NameParser<'a> {
    parts: &'a [Part],
    pos: usize,
    sections: u32,
    interner: &'a mut Interner,
}

impl<'a> NameParser<'a> {
    fn at_end(&self) -> bool {
        self.pos >= self.parts.len()
    }

    /// The next unescaped operator character, if that is what comes next.
    fn peek_operator(&self) -> Option<char> {
        match self.parts.get(self.pos) {
            Some(Part::Operator { c, escaped: false }) => Some(*c),
            _ => None,
        }
    }

    fn bump(&mut self) -> Option<&'a Part> {
        let part = self.parts.get(self.pos);
        if part.is_some() {
            self.pos += 1;
        }
        part
    }

    fn parse_top(&mut self) -> Result<Vec<MessageExpr>, MessageError> {
        let sequence = self.parse_sequence()?;
        if !self.at_end() {
            return Err(match self.peek_operator() {
                Some(metachar::CLOSE_GROUP) => MessageError::UnbalancedGuillemets,
                Some(metachar::DOUBLE_DAGGER) => MessageError::IncorrectUseOfDoubleDagger,
                Some(metachar::VERTICAL_BAR) => {
                    MessageError::VerticalBarMustFollowSimpleOrSimpleGroup
                }
                _ => MessageError::MethodNameNotCanonical("unexpected trailing part".to_string()),
            });
        }
        if sequence.is_empty() {
            return Err(MessageError::MethodNameNotCanonical(
                "name has no parts".to_string(),
            ));
        }
        Ok(sequence)
    }

    /// Parse until end of input or a group-level delimiter (`»`, `‡`, `|`),
    /// which is left for the caller.
    fn parse_sequence(&mut self) -> Result<Vec<MessageExpr>, MessageError> {
        let mut sequence = Vec::new();
        loop {
            if self.at_end() {
                break;
            }
            if matches!(
                self.peek_operator(),
                Some(metachar::CLOSE_GROUP)
                    | Some(metachar::DOUBLE_DAGGER)
                    | Some(metachar::VERTICAL_BAR)
            ) {
                break;
            }
            let element = self.parse_element()?;
            let element = self.apply_modifiers(element)?;
            sequence.push(element);
        }
        Ok(sequence)
    }

    fn parse_element(&mut self) -> Result<MessageExpr, MessageError> {
        let part = self.bump().expect("checked not at end");
        match part {
            Part::Word(text) => Ok(self.simple(text)),
            Part::Operator { c, escaped: true } => {
                let text: Arc<str> = Arc::from(c.to_string());
                Ok(self.simple(&text))
            }
            Part::Operator { c, escaped: false } => match *c {
                metachar::UNDERSCORE => Ok(MessageExpr::Argument),
                metachar::ELLIPSIS => Ok(MessageExpr::RawToken),
                metachar::SECTION_SIGN => {
                    self.sections += 1;
                    Ok(MessageExpr::SectionCheckpoint {
                        number: self.sections,
                    })
                }
                metachar::OPEN_GROUP => self.parse_group(),
                metachar::OCTOTHORP => Err(MessageError::OctothorpMustFollowSimpleGroup),
                metachar::QUESTION_MARK => Err(MessageError::QuestionMarkMustFollowSimpleGroup),
                metachar::EXCLAMATION_MARK => {
                    Err(MessageError::ExclamationMarkMustFollowAlternationGroup)
                }
                metachar::UP_ARROW => Err(MessageError::UpArrowMustFollowArgument),
                metachar::TILDE | metachar::SINGLE_DAGGER => Err(
                    MessageError::MethodNameNotCanonical(format!("stray modifier `{c}`")),
                ),
                _ => {
                    let text: Arc<str> = Arc::from(c.to_string());
                    Ok(self.simple(&text))
                }
            },
        }
    }

    fn simple(&mut self, text: &str) -> MessageExpr {
        MessageExpr::Simple {
            text: Arc::from(text),
            symbol: self.interner.intern(text),
        }
    }

    /// Parse a group body; the `«` has been consumed.
    fn parse_group(&mut self) -> Result<MessageExpr, MessageError> {
        let mut branches: Vec<MessageExpr> = Vec::new();
        loop {
            let sequence = self.parse_sequence()?;
            match self.peek_operator() {
                Some(metachar::VERTICAL_BAR) => {
                    self.bump();
                    branches.push(validate_branch(sequence)?);
                }
                Some(metachar::DOUBLE_DAGGER) => {
                    if !branches.is_empty() {
                        return Err(MessageError::IncorrectUseOfDoubleDagger);
                    }
                    self.bump();
                    let after = self.parse_sequence()?;
                    return match self.peek_operator() {
                        Some(metachar::CLOSE_GROUP) => {
                            self.bump();
                            Ok(MessageExpr::Group(Box::new(GroupExpr {
                                before: sequence,
                                after: Some(after),
                            })))
                        }
                        Some(metachar::DOUBLE_DAGGER) => {
                            Err(MessageError::IncorrectUseOfDoubleDagger)
                        }
                        Some(metachar::VERTICAL_BAR) => {
                            Err(MessageError::VerticalBarMustFollowSimpleOrSimpleGroup)
                        }
                        _ => Err(MessageError::UnbalancedGuillemets),
                    };
                }
                Some(metachar::CLOSE_GROUP) => {
                    self.bump();
                    if branches.is_empty() {
                        return Ok(MessageExpr::Group(Box::new(GroupExpr {
                            before: sequence,
                            after: None,
                        })));
                    }
                    branches.push(validate_branch(sequence)?);
                    return Ok(MessageExpr::Group(Box::new(GroupExpr {
                        before: vec![MessageExpr::Alternation(branches)],
                        after: None,
                    })));
                }
                _ => return Err(MessageError::UnbalancedGuillemets),
            }
        }
    }

    /// Attach postfix modifiers to the expression just parsed.
    fn apply_modifiers(&mut self, mut expr: MessageExpr) -> Result<MessageExpr, MessageError> {
        loop {
            let Some(c) = self.peek_operator() else { break };
            match c {
                metachar::TILDE => {
                    self.bump();
                    if expr.is_leaf_argument() {
                        return Err(MessageError::TildeMustNotFollowArgument);
                    }
                    if !expr.is_lower_case() {
                        return Err(MessageError::CaseInsensitiveCanonization);
                    }
                    expr = MessageExpr::CaseInsensitive(Box::new(expr));
                }
                metachar::QUESTION_MARK => {
                    self.bump();
                    if self.peek_operator() == Some(metachar::QUESTION_MARK) {
                        self.bump();
                        expr = match expr {
                            simple @ MessageExpr::Simple { .. } => {
                                MessageExpr::CompletelyOptional(Box::new(simple))
                            }
                            ci @ MessageExpr::CaseInsensitive(_) => {
                                MessageExpr::CompletelyOptional(Box::new(ci))
                            }
                            MessageExpr::Group(group)
                                if group.iteration_yield_count() == 0
                                    && !group.has_dagger() =>
                            {
                                MessageExpr::CompletelyOptional(Box::new(MessageExpr::Group(
                                    group,
                                )))
                            }
                            _ => {
                                return Err(
                                    MessageError::DoubleQuestionMarkMustFollowSimpleOrSimpleGroup,
                                );
                            }
                        };
                    } else {
                        expr = match expr {
                            MessageExpr::Group(group)
                                if group.iteration_yield_count() == 0
                                    && !group.has_dagger() =>
                            {
                                MessageExpr::Optional(group)
                            }
                            _ => return Err(MessageError::QuestionMarkMustFollowSimpleGroup),
                        };
                    }
                }
                metachar::OCTOTHORP => {
                    self.bump();
                    expr = match expr {
                        MessageExpr::Group(group) if group.iteration_yield_count() == 0 => {
                            MessageExpr::Counter(group)
                        }
                        _ => return Err(MessageError::OctothorpMustFollowSimpleGroup),
                    };
                }
                metachar::EXCLAMATION_MARK => {
                    self.bump();
                    expr = match expr {
                        MessageExpr::Group(group)
                            if !group.has_dagger()
                                && matches!(
                                    group.before.as_slice(),
                                    [MessageExpr::Alternation(_)]
                                ) =>
                        {
                            MessageExpr::NumberedChoice(group)
                        }
                        _ => {
                            return Err(MessageError::ExclamationMarkMustFollowAlternationGroup);
                        }
                    };
                }
                metachar::SINGLE_DAGGER => {
                    self.bump();
                    expr = match expr {
                        MessageExpr::Argument => MessageExpr::ModuleScopeArgument,
                        _ => {
                            return Err(MessageError::MethodNameNotCanonical(
                                "† must follow an argument".to_string(),
                            ));
                        }
                    };
                }
                metachar::UP_ARROW => {
                    self.bump();
                    expr = match expr {
                        MessageExpr::Argument => MessageExpr::VariableQuote,
                        _ => return Err(MessageError::UpArrowMustFollowArgument),
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }
}

/// Each alternation branch must be a single keyword or argument-free
/// group.
fn validate_branch(mut sequence: Vec<MessageExpr>) -> Result<MessageExpr, MessageError> {
    if sequence.len() != 1 {
        return Err(MessageError::VerticalBarMustFollowSimpleOrSimpleGroup);
    }
    let branch = sequence.remove(0);
    if branch.underscore_count() > 0 {
        return Err(MessageError::AlternativeMustNotContainArguments);
    }
    match &branch {
        MessageExpr::Simple { .. }
        | MessageExpr::Group(_)
        | MessageExpr::CaseInsensitive(_) => Ok(branch),
        _ => Err(MessageError::VerticalBarMustFollowSimpleOrSimpleGroup),
    }
}
