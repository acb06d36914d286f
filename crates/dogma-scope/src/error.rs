//! Error types for configuration scopes
//!
//! Two layers:
//! - [`ScopeError`]: what a caller of [`ConfigScope`](crate::ConfigScope) sees
//!   (bad block shape, premature access, bad input documents, and block
//!   failures tagged with their line)
//! - [`EvalError`]: what the block's own logic raised while running

use dogma_core::UnsupportedOperation;
use dogma_lang::ParseError;

/// Main scope error type
#[derive(Debug, thiserror::Error)]
pub enum ScopeError {
    /// The block declares parameters
    #[error("configuration block must take no arguments, found ({0})")]
    InvalidSignature(String),

    /// The block source does not parse
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Fixed or preset tree is not a mapping
    #[error("{which} must be a mapping, got {found}")]
    InvalidBaseline {
        /// `fixed` or `preset`
        which: &'static str,
        /// JSON type that was supplied
        found: &'static str,
    },

    /// Result read before a successful evaluation
    #[error("configuration scope has not been evaluated")]
    NotEvaluated,

    /// Key missing from the configuration
    #[error("configuration has no key `{0}`")]
    NotFound(String),

    /// The block raised an error
    #[error("line {line}: {source}")]
    Eval {
        /// Line of the failing statement
        line: usize,
        /// What the block raised
        source: EvalError,
    },

    /// Options document could not be read
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    /// JSON or YAML document could not be read or written
    #[error("invalid document: {0}")]
    InvalidDocument(String),
}

impl ScopeError {
    /// Check if the error came from running the block
    #[inline]
    #[must_use]
    pub fn is_eval(&self) -> bool {
        matches!(self, Self::Eval { .. })
    }

    /// The evaluation error, if the block raised one
    #[inline]
    #[must_use]
    pub fn eval_error(&self) -> Option<&EvalError> {
        match self {
            Self::Eval { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Errors raised by block logic
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    /// Unbound name
    #[error("name `{0}` is not defined")]
    Name(String),

    /// Operation applied to a value of the wrong type
    #[error("type error: {0}")]
    Type(String),

    /// Missing mapping key
    #[error("key error: {0}")]
    Key(String),

    /// Sequence index out of range
    #[error("index error: {0}")]
    Index(String),

    /// Right type, unacceptable value
    #[error("value error: {0}")]
    Value(String),

    /// Division or modulo by zero
    #[error("division by zero")]
    ZeroDivision,

    /// Integer result outside 64 bits, or a sequence past the length limit
    #[error("result of `{0}` is too large")]
    Overflow(&'static str),

    /// Too many nested calls, or containers nested too deeply to compare
    #[error("maximum recursion depth of {0} exceeded")]
    RecursionLimit(usize),

    /// Raised by an injected native function
    #[error("{0}")]
    Host(String),

    /// Refused mutation of a fixed container
    #[error(transparent)]
    Unsupported(#[from] UnsupportedOperation),
}

impl EvalError {
    /// Type error with a message
    #[inline]
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::Type(message.into())
    }

    /// Value error with a message
    #[inline]
    pub fn value_error(message: impl Into<String>) -> Self {
        Self::Value(message.into())
    }

    /// Error for a host function to return
    #[inline]
    pub fn host(message: impl Into<String>) -> Self {
        Self::Host(message.into())
    }
}
