//! Token stream wrapper for the hand-written parser.

use crate::lexer::{Spanned, Token};

use super::ParseError;

/// Deepest expression nesting the parser accepts
pub(crate) const MAX_NESTING: usize = 200;

/// Token stream with lookahead and position tracking.
pub(crate) struct TokenStream<'src> {
    source: &'src str,
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
}

impl<'src> TokenStream<'src> {
    /// Create a new token stream.
    pub(crate) fn new(source: &'src str, tokens: Vec<Spanned>) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    /// Source text, for error locations.
    pub(crate) fn source(&self) -> &'src str {
        self.source
    }

    /// Peek at the current token without consuming it.
    pub(crate) fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    /// Peek at the nth token ahead without consuming.
    pub(crate) fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n).map(|s| &s.token)
    }

    /// Advance to the next token and return the current one.
    pub(crate) fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|s| s.token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Check if the current token matches the expected token.
    pub(crate) fn check(&self, expected: &Token) -> bool {
        matches!(self.peek(), Some(t) if std::mem::discriminant(t) == std::mem::discriminant(expected))
    }

    /// Consume the current token if it matches.
    pub(crate) fn eat(&mut self, expected: &Token) -> bool {
        if self.check(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Expect a specific token and advance if it matches.
    pub(crate) fn expect(&mut self, expected: &Token, context: &str) -> Result<(), ParseError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.unexpected(context))
        }
    }

    /// Expect an identifier and return its name.
    pub(crate) fn expect_ident(&mut self, context: &str) -> Result<String, ParseError> {
        if let Some(Token::Ident(name)) = self.peek() {
            let name = name.clone();
            self.pos += 1;
            Ok(name)
        } else {
            Err(self.unexpected(context))
        }
    }

    /// Check if we've reached the end of the token stream.
    pub(crate) fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Byte offset of the current token (end of input when exhausted).
    pub(crate) fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.source.len(), |s| s.span.start)
    }

    /// Line of the current token.
    pub(crate) fn line(&self) -> usize {
        super::error::line_col(self.source, self.offset()).0
    }

    /// Error for the current token.
    pub(crate) fn unexpected(&self, context: &str) -> ParseError {
        let found = self
            .tokens
            .get(self.pos)
            .map(|s| (&s.token, s.span.start));
        ParseError::unexpected(self.source, found, context)
    }

    /// Run `parse` one nesting level deeper.
    ///
    /// Fails once [`MAX_NESTING`] levels are open, so that deeply nested
    /// input is rejected instead of exhausting the stack.
    pub(crate) fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(ParseError::too_deep(self.source, self.offset(), MAX_NESTING));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Skip statement separators.
    pub(crate) fn skip_separators(&mut self) {
        while matches!(self.peek(), Some(Token::Newline | Token::Semi)) {
            self.pos += 1;
        }
    }
}
