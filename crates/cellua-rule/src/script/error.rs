//! Rule-script load errors.

use std::fmt;

/// A byte range in the script source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Span {
    /// First byte (inclusive).
    pub start: usize,
    /// Last byte (exclusive).
    pub end: usize,
}

impl Span {
    /// Span covering `start..end`.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Smallest span covering both.
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Errors raised while loading a rule script.
///
/// Runtime failures during a transition are reported as
/// [`RuleError`](cellua_core::RuleError)s instead.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScriptError {
    /// A header line is malformed or has an invalid value.
    Header {
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        reason: String,
    },
    /// The script has no `transition:` section.
    MissingTransition,
    /// A character sequence that is not a token.
    UnknownSymbol {
        /// Where it occurs.
        span: Span,
        /// The offending text.
        symbol: String,
    },
    /// A token other than the one the grammar requires.
    Unexpected {
        /// Where it occurs.
        span: Span,
        /// What the parser wanted.
        expected: &'static str,
        /// What it found.
        found: String,
    },
    /// The transition ended early.
    UnexpectedEnd {
        /// What the parser wanted.
        expected: &'static str,
    },
    /// A name that is neither a builtin nor a `let` binding.
    UnknownName {
        /// Where it occurs.
        span: Span,
        /// The name.
        name: String,
    },
    /// `let` tried to shadow a builtin or an earlier binding.
    Redefined {
        /// Where it occurs.
        span: Span,
        /// The name.
        name: String,
    },
    /// `pos` or `gen` used by a script that is not declared `aware: true`.
    NotAware {
        /// Where it occurs.
        span: Span,
        /// The name.
        name: String,
    },
    /// A function called with the wrong number of arguments.
    Arity {
        /// Where it occurs.
        span: Span,
        /// Function name.
        name: String,
        /// Arguments the function takes.
        expected: usize,
        /// Arguments supplied.
        found: usize,
    },
    /// A literal too large to represent.
    LiteralTooLarge {
        /// Where it occurs.
        span: Span,
    },
    /// Expressions nested deeper than the parser allows.
    TooDeep {
        /// Where the limit was hit.
        span: Span,
    },
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Header { line, reason } => write!(f, "line {line}: {reason}"),
            Self::MissingTransition => write!(f, "missing `transition:` section"),
            Self::UnknownSymbol { span, symbol } => {
                write!(f, "{span}: unknown symbol {symbol:?}")
            }
            Self::Unexpected {
                span,
                expected,
                found,
            } => write!(f, "{span}: expected {expected}, found {found:?}"),
            Self::UnexpectedEnd { expected } => {
                write!(f, "unexpected end of transition, expected {expected}")
            }
            Self::UnknownName { span, name } => write!(f, "{span}: unknown name `{name}`"),
            Self::Redefined { span, name } => write!(f, "{span}: `{name}` is already defined"),
            Self::NotAware { span, name } => {
                write!(f, "{span}: `{name}` requires `aware: true`")
            }
            Self::Arity {
                span,
                name,
                expected,
                found,
            } => write!(
                f,
                "{span}: `{name}` takes {expected} argument(s), {found} given"
            ),
            Self::LiteralTooLarge { span } => write!(f, "{span}: integer literal too large"),
            Self::TooDeep { span } => write!(f, "{span}: expression nested too deeply"),
        }
    }
}

impl std::error::Error for ScriptError {}
