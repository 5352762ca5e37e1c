use thiserror::Error;

/// The reason a pattern failed to compile.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CompileErrorKind {
    /// The pattern text was empty.
    EmptyRegex,
    /// The pattern text is not valid UTF-8.
    InvalidUtf8,
    /// A quantifier (`+`, `*`, `-` or `?`) follows nothing it could repeat.
    ExpectedSimpleExpr,
    /// A `-` inside a character class has no endpoint before it, or no
    /// endpoint after it. A literal hyphen must be written as `\-`.
    ExpectedEscapeBeforeDashInRange,
    /// A `)` without a matching `(`, or a `(` that is never closed.
    UnbalancedGroupBrackets,
    /// A `\` at the very end of the pattern.
    ExpectedEscapeChar,
    /// A `[` that is never closed by a `]`.
    UnclosedCharClass,
    /// The instruction list could not grow.
    OutOfMemory,
}

impl CompileErrorKind {
    fn description(&self) -> &'static str {
        match self {
            CompileErrorKind::EmptyRegex => "empty pattern",
            CompileErrorKind::InvalidUtf8 => "invalid UTF-8 in pattern",
            CompileErrorKind::ExpectedSimpleExpr => {
                "quantifier without a preceding expression"
            }
            CompileErrorKind::ExpectedEscapeBeforeDashInRange => {
                "expected `\\-` for a literal dash in a character class"
            }
            CompileErrorKind::UnbalancedGroupBrackets => {
                "unbalanced group brackets"
            }
            CompileErrorKind::ExpectedEscapeChar => {
                "expected a character after `\\`"
            }
            CompileErrorKind::UnclosedCharClass => "unclosed character class",
            CompileErrorKind::OutOfMemory => "out of memory",
        }
    }
}

/// An error produced while compiling pattern text.
///
/// `offset` is a byte offset into the pattern text, suitable for reporting
/// a position inside the configuration file the pattern came from.
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
#[error("{} at offset {offset}", .kind.description())]
pub struct CompileError {
    pub kind: CompileErrorKind,
    pub offset: usize,
}

impl CompileError {
    pub(crate) fn new(kind: CompileErrorKind, offset: usize) -> Self {
        CompileError { kind, offset }
    }
}

/// An error produced while parsing a flag code string such as `"m"`.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum FlagsError {
    #[error("unknown pattern flag `{flag}` at offset {offset}")]
    ExpectedRegexFlag { flag: char, offset: usize },
}

/// An error produced while executing a compiled pattern.
///
/// A negative match is not an error: it is reported through
/// [`MatchResult::fully_matched`](crate::MatchResult).
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
pub enum ExecError {
    /// The text contains a malformed UTF-8 sequence at `offset`.
    #[error("invalid UTF-8 in text at offset {offset}")]
    InvalidUtf8 { offset: usize },
    /// The capture output slice does not have one slot per group.
    #[error("expected {expected} capture groups, got {actual}")]
    InvalidGroupSize { expected: usize, actual: usize },
    /// The thread stack could not grow.
    #[error("out of memory")]
    OutOfMemory,
}
