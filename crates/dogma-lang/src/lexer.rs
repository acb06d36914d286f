//! Lexical analysis for configuration blocks.
//!
//! Tokenization uses logos. Comments, blanks and line continuations are
//! skipped; newlines are tokens because they end statements, except inside
//! brackets where [`tokenize`] drops them.
//!
//! # Examples
//!
//! ```
//! # use dogma_lang::lexer::{tokenize, Token};
//! let tokens = tokenize("lr = 0.1  # learning rate").unwrap();
//! assert_eq!(tokens[0].token, Token::Ident("lr".into()));
//! assert_eq!(tokens[2].token, Token::Float(0.1));
//! ```

use std::ops::Range;

use logos::{Lexer, Logos};

use crate::parser::ParseError;

/// Block token.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\f]+")] // Skip blanks
#[logos(skip r"#[^\n]*")] // Skip comments
#[logos(skip r"\\\r?\n")] // Skip line continuations
pub enum Token {
    // === Keywords ===
    /// Keyword `def`
    #[token("def")]
    Def,
    /// Keyword `lambda`
    #[token("lambda")]
    Lambda,
    /// Keyword `if`
    #[token("if")]
    If,
    /// Keyword `else`
    #[token("else")]
    Else,
    /// Keyword `and`
    #[token("and")]
    And,
    /// Keyword `or`
    #[token("or")]
    Or,
    /// Keyword `not`
    #[token("not")]
    Not,
    /// Keyword `in`
    #[token("in")]
    In,
    /// Keyword `for`
    #[token("for")]
    For,
    /// Keyword `del`
    #[token("del")]
    Del,
    /// Keyword `pass`
    #[token("pass")]
    Pass,
    /// `True` or `true`
    #[token("True")]
    #[token("true")]
    True,
    /// `False` or `false`
    #[token("False")]
    #[token("false")]
    False,
    /// `None` or `null`
    #[token("None")]
    #[token("null")]
    Null,

    // === Literals ===
    /// Identifier
    #[regex("[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),
    /// Integer literal
    #[regex("[0-9][0-9_]*", parse_int)]
    Int(i64),
    /// Float literal
    #[regex(r"[0-9][0-9_]*\.[0-9_]*([eE][+-]?[0-9]+)?", parse_float)]
    #[regex(r"[0-9][0-9_]*[eE][+-]?[0-9]+", parse_float)]
    #[regex(r"\.[0-9][0-9_]*([eE][+-]?[0-9]+)?", parse_float)]
    Float(f64),
    /// String literal (escapes resolved)
    #[regex(r#""([^"\\\n]|\\.)*""#, unescape)]
    #[regex(r"'([^'\\\n]|\\.)*'", unescape)]
    Str(String),

    // === Delimiters ===
    /// `(`
    #[token("(")]
    LParen,
    /// `)`
    #[token(")")]
    RParen,
    /// `[`
    #[token("[")]
    LBracket,
    /// `]`
    #[token("]")]
    RBracket,
    /// `{`
    #[token("{")]
    LBrace,
    /// `}`
    #[token("}")]
    RBrace,
    /// `,`
    #[token(",")]
    Comma,
    /// `:`
    #[token(":")]
    Colon,
    /// `;`
    #[token(";")]
    Semi,
    /// `.`
    #[token(".")]
    Dot,
    /// Line break
    #[token("\n")]
    Newline,

    // === Operators ===
    /// `=`
    #[token("=")]
    Assign,
    /// `+=`
    #[token("+=")]
    PlusAssign,
    /// `-=`
    #[token("-=")]
    MinusAssign,
    /// `*=`
    #[token("*=")]
    StarAssign,
    /// `/=`
    #[token("/=")]
    SlashAssign,
    /// `==`
    #[token("==")]
    EqEq,
    /// `!=`
    #[token("!=")]
    NotEq,
    /// `<`
    #[token("<")]
    Lt,
    /// `<=`
    #[token("<=")]
    LtEq,
    /// `>`
    #[token(">")]
    Gt,
    /// `>=`
    #[token(">=")]
    GtEq,
    /// `+`
    #[token("+")]
    Plus,
    /// `-`
    #[token("-")]
    Minus,
    /// `*`
    #[token("*")]
    Star,
    /// `**`
    #[token("**")]
    DoubleStar,
    /// `/`
    #[token("/")]
    Slash,
    /// `//`
    #[token("//")]
    DoubleSlash,
    /// `%`
    #[token("%")]
    Percent,
}

fn parse_int(lex: &mut Lexer<'_, Token>) -> Option<i64> {
    lex.slice().replace('_', "").parse().ok()
}

fn parse_float(lex: &mut Lexer<'_, Token>) -> Option<f64> {
    lex.slice().replace('_', "").parse().ok()
}

fn unescape(lex: &mut Lexer<'_, Token>) -> Option<String> {
    let raw = lex.slice();
    let body = &raw[1..raw.len() - 1];
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0' => out.push('\0'),
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            _ => return None,
        }
    }
    Some(out)
}

impl Token {
    /// Short description used in error messages
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Ident(name) => format!("identifier `{name}`"),
            Self::Int(i) => format!("integer `{i}`"),
            Self::Float(x) => format!("float `{x}`"),
            Self::Str(s) => format!("string {s:?}"),
            Self::Newline => "end of line".to_string(),
            other => format!("`{}`", other.symbol()),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Self::Def => "def",
            Self::Lambda => "lambda",
            Self::If => "if",
            Self::Else => "else",
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
            Self::In => "in",
            Self::For => "for",
            Self::Del => "del",
            Self::Pass => "pass",
            Self::True => "True",
            Self::False => "False",
            Self::Null => "None",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::LBrace => "{",
            Self::RBrace => "}",
            Self::Comma => ",",
            Self::Colon => ":",
            Self::Semi => ";",
            Self::Dot => ".",
            Self::Assign => "=",
            Self::PlusAssign => "+=",
            Self::MinusAssign => "-=",
            Self::StarAssign => "*=",
            Self::SlashAssign => "/=",
            Self::EqEq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::DoubleStar => "**",
            Self::Slash => "/",
            Self::DoubleSlash => "//",
            Self::Percent => "%",
            Self::Ident(_) | Self::Int(_) | Self::Float(_) | Self::Str(_) | Self::Newline => "",
        }
    }
}

/// Token with its byte range in the source
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    /// The token
    pub token: Token,
    /// Byte range
    pub span: Range<usize>,
}

/// Tokenize a block, dropping newlines nested inside brackets
///
/// # Errors
/// Returns a [`ParseError`] at the first unrecognised input.
pub fn tokenize(source: &str) -> Result<Vec<Spanned>, ParseError> {
    let mut tokens = Vec::new();
    let mut depth = 0usize;

    for (result, span) in Token::lexer(source).spanned() {
        let Ok(token) = result else {
            return Err(ParseError::invalid_token(source, span));
        };
        match token {
            Token::LParen | Token::LBracket | Token::LBrace => depth += 1,
            Token::RParen | Token::RBracket | Token::RBrace => depth = depth.saturating_sub(1),
            Token::Newline if depth > 0 => continue,
            _ => {}
        }
        tokens.push(Spanned { token, span });
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(
            kinds("define = None"),
            vec![Token::Ident("define".into()), Token::Assign, Token::Null]
        );
    }

    #[test]
    fn numbers() {
        assert_eq!(
            kinds("1_000 2.5 1e3 .5"),
            vec![
                Token::Int(1000),
                Token::Float(2.5),
                Token::Float(1000.0),
                Token::Float(0.5)
            ]
        );
    }

    #[test]
    fn strings_resolve_escapes() {
        assert_eq!(
            kinds(r#""a\"b" 'c\nd'"#),
            vec![Token::Str("a\"b".into()), Token::Str("c\nd".into())]
        );
    }

    #[test]
    fn operators_prefer_longest_match() {
        assert_eq!(
            kinds("a ** b // c += 1"),
            vec![
                Token::Ident("a".into()),
                Token::DoubleStar,
                Token::Ident("b".into()),
                Token::DoubleSlash,
                Token::Ident("c".into()),
                Token::PlusAssign,
                Token::Int(1),
            ]
        );
    }

    #[test]
    fn newlines_inside_brackets_are_dropped() {
        let tokens = kinds("x = [1,\n 2]\ny = 3");
        let newlines = tokens.iter().filter(|t| **t == Token::Newline).count();
        assert_eq!(newlines, 1);
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(kinds("# only a comment"), Vec::<Token>::new());
    }

    #[test]
    fn unknown_input_is_an_error() {
        let err = tokenize("a = $").unwrap_err();
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 5);
    }

    #[test]
    fn integer_overflow_is_an_error() {
        assert!(tokenize("x = 99999999999999999999").is_err());
    }
}
