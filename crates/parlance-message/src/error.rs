//! The closed enumeration of message-name and signature problems.
//!
//! Everything a malformed message pattern or an ill-shaped definition can
//! be rejected for is one of these; nothing else is representable.

/// A problem with a message name, or with a definition offered for one.
#[derive(Clone, PartialEq, Eq, Debug, thiserror::Error)]
pub enum MessageError {
    #[error("message name has unbalanced guillemets («»)")]
    UnbalancedGuillemets,

    #[error("double dagger (‡) may only occur once, inside a group")]
    IncorrectUseOfDoubleDagger,

    #[error("an alternative must not contain arguments")]
    AlternativeMustNotContainArguments,

    #[error("octothorp (#) must follow a group with no arguments")]
    OctothorpMustFollowSimpleGroup,

    #[error("question mark (?) must follow a group with no arguments and no double dagger")]
    QuestionMarkMustFollowSimpleGroup,

    #[error("double question mark (??) must follow a keyword or a simple group")]
    DoubleQuestionMarkMustFollowSimpleOrSimpleGroup,

    #[error("exclamation mark (!) must follow an alternation group")]
    ExclamationMarkMustFollowAlternationGroup,

    #[error("tilde (~) must not follow an argument")]
    TildeMustNotFollowArgument,

    #[error("vertical bar (|) must separate keywords or simple groups")]
    VerticalBarMustFollowSimpleOrSimpleGroup,

    #[error("case-insensitive keywords must be specified in lower case")]
    CaseInsensitiveCanonization,

    #[error("expected an operator character after backquote")]
    ExpectedOperatorAfterBackquote,

    #[error("up arrow (↑) must follow an argument")]
    UpArrowMustFollowArgument,

    #[error("method name is not canonical: {0}")]
    MethodNameNotCanonical(String),

    #[error("group argument should be a tuple type")]
    IncorrectTypeForGroup,

    #[error("complex group argument should be a tuple type of fixed-size tuples")]
    IncorrectTypeForComplexGroup,

    #[error("counting group argument should be a whole-number type")]
    IncorrectTypeForCountingGroup,

    #[error("optional group argument should be the boolean type")]
    IncorrectTypeForBooleanGroup,

    #[error("numbered choice argument should cover exactly the choice range")]
    IncorrectTypeForNumberedChoice,

    #[error("argument type is unsuitable for this argument position")]
    IncorrectArgumentType,

    #[error("signature has the wrong number of arguments (expected {expected}, given {given})")]
    IncorrectNumberOfArguments { expected: u32, given: u32 },

    #[error("method is already defined with the same argument types")]
    RedefinedWithSameArgumentTypes,

    #[error("result type should covary with argument types")]
    ResultTypeShouldCovaryWithArguments,

    #[error("method return type disagrees with its forward declaration")]
    MethodReturnTypeNotAsForwardDeclared,

    #[error("a macro body must return a phrase")]
    MacroMustReturnAPhrase,
}
