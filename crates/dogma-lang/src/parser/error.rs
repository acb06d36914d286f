//! Parse error types.

use std::ops::Range;

use crate::lexer::Token;

/// Parse error with source location.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}, column {column}: {message}")]
pub struct ParseError {
    /// Kind of parse error
    pub kind: ParseErrorKind,
    /// Line (1-based)
    pub line: usize,
    /// Column (1-based, in characters)
    pub column: usize,
    /// Human-readable error message
    pub message: String,
}

/// Category of parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Input the lexer does not recognise
    InvalidToken,
    /// Unexpected token (found X, expected Y)
    UnexpectedToken,
    /// Unexpected end of input
    UnexpectedEof,
    /// Well-formed tokens in an unsupported arrangement
    InvalidSyntax,
    /// Expressions nested past the parser's limit
    NestingTooDeep,
}

/// 1-based line and column of a byte offset
#[must_use]
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}

impl ParseError {
    fn at(kind: ParseErrorKind, source: &str, offset: usize, message: String) -> Self {
        let (line, column) = line_col(source, offset);
        Self {
            kind,
            line,
            column,
            message,
        }
    }

    /// Unrecognised input at `span`.
    #[must_use]
    pub fn invalid_token(source: &str, span: Range<usize>) -> Self {
        let text = source.get(span.clone()).unwrap_or_default();
        Self::at(
            ParseErrorKind::InvalidToken,
            source,
            span.start,
            format!("invalid token `{text}`"),
        )
    }

    /// Create an "unexpected token" error.
    #[must_use]
    pub fn unexpected(source: &str, found: Option<(&Token, usize)>, context: &str) -> Self {
        match found {
            Some((token, offset)) => Self::at(
                ParseErrorKind::UnexpectedToken,
                source,
                offset,
                format!("unexpected {} {context}", token.describe()),
            ),
            None => Self::at(
                ParseErrorKind::UnexpectedEof,
                source,
                source.len(),
                format!("unexpected end of input {context}"),
            ),
        }
    }

    /// Create an "invalid syntax" error.
    #[must_use]
    pub fn invalid_syntax(source: &str, offset: usize, message: impl Into<String>) -> Self {
        Self::at(ParseErrorKind::InvalidSyntax, source, offset, message.into())
    }

    /// Nesting limit reached at `offset`.
    #[must_use]
    pub fn too_deep(source: &str, offset: usize, limit: usize) -> Self {
        Self::at(
            ParseErrorKind::NestingTooDeep,
            source,
            offset,
            format!("expression nested more than {limit} levels deep"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_col_counts_from_one() {
        let source = "a = 1\nbb = 2";
        assert_eq!(line_col(source, 0), (1, 1));
        assert_eq!(line_col(source, 6), (2, 1));
        assert_eq!(line_col(source, 9), (2, 4));
    }

    #[test]
    fn message_includes_location() {
        let err = ParseError::invalid_syntax("x", 0, "bad");
        assert_eq!(err.to_string(), "line 1, column 1: bad");
    }
}
