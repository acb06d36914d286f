//! Recursive descent parser for configuration blocks.
//!
//! A block is an optional `def name(params):` header followed by statements
//! separated by newlines or `;`. Indentation carries no meaning because the
//! language has no compound statements.

mod error;
mod expr;
mod stream;

pub use error::{line_col, ParseError, ParseErrorKind};

use crate::ast::{Block, Expr, Param, Signature, Stmt, StmtKind, Target};
use crate::lexer::{tokenize, Token};
use stream::TokenStream;

/// Parse a complete block.
///
/// # Errors
/// Returns the first lexical or syntax error.
///
/// # Examples
///
/// ```
/// # use dogma_lang::parse_block;
/// let block = parse_block("def cfg():\n    lr = 0.1\n    epochs = 10\n").unwrap();
/// assert_eq!(block.name.as_deref(), Some("cfg"));
/// assert_eq!(block.body.len(), 2);
/// assert!(block.signature.is_zero_argument());
/// ```
pub fn parse_block(source: &str) -> Result<Block, ParseError> {
    let tokens = tokenize(source)?;
    let mut stream = TokenStream::new(source, tokens);

    stream.skip_separators();
    let (name, signature) = if stream.check(&Token::Def) {
        let (name, signature) = parse_header(&mut stream)?;
        (Some(name), signature)
    } else {
        (None, Signature::default())
    };

    let mut body = Vec::new();
    stream.skip_separators();
    while !stream.at_end() {
        body.push(parse_stmt(&mut stream)?);
        if !stream.at_end() && !matches!(stream.peek(), Some(Token::Newline | Token::Semi)) {
            return Err(stream.unexpected("after statement"));
        }
        stream.skip_separators();
    }

    Ok(Block {
        name,
        signature,
        body,
    })
}

fn parse_header(stream: &mut TokenStream<'_>) -> Result<(String, Signature), ParseError> {
    stream.expect(&Token::Def, "at block header")?;
    let name = stream.expect_ident("as block name")?;
    stream.expect(&Token::LParen, "after block name")?;

    let mut signature = Signature::default();
    while !stream.check(&Token::RParen) {
        if stream.eat(&Token::DoubleStar) {
            signature.kwargs = Some(stream.expect_ident("after `**`")?);
        } else if stream.eat(&Token::Star) {
            signature.varargs = Some(stream.expect_ident("after `*`")?);
        } else {
            let name = stream.expect_ident("in parameter list")?;
            let default = if stream.eat(&Token::Assign) {
                Some(expr::parse_expr(stream)?)
            } else {
                None
            };
            signature.params.push(Param { name, default });
        }
        if !stream.eat(&Token::Comma) {
            break;
        }
    }
    stream.expect(&Token::RParen, "to close parameter list")?;
    stream.expect(&Token::Colon, "after block header")?;
    Ok((name, signature))
}

fn parse_stmt(stream: &mut TokenStream<'_>) -> Result<Stmt, ParseError> {
    let line = stream.line();
    let kind = match stream.peek() {
        Some(Token::Pass) => {
            stream.advance();
            StmtKind::Pass
        }
        Some(Token::Del) => {
            stream.advance();
            let offset = stream.offset();
            let targets = match expr::parse_expr_list(stream)? {
                Expr::Tuple(items) => items,
                single => vec![single],
            };
            let targets = targets
                .into_iter()
                .map(|e| to_target(stream, e, offset))
                .collect::<Result<_, _>>()?;
            StmtKind::Delete(targets)
        }
        Some(Token::Def) => {
            return Err(ParseError::invalid_syntax(
                stream.source(),
                stream.offset(),
                "nested function definitions are not supported; bind a lambda instead",
            ))
        }
        _ => parse_simple_stmt(stream)?,
    };
    Ok(Stmt { kind, line })
}

fn parse_simple_stmt(stream: &mut TokenStream<'_>) -> Result<StmtKind, ParseError> {
    let offset = stream.offset();
    let first = expr::parse_expr_list(stream)?;

    if let Some(op) = stream.peek().and_then(augmented_op) {
        stream.advance();
        let target = match to_target(stream, first, offset)? {
            Target::Unpack(_) => {
                return Err(ParseError::invalid_syntax(
                    stream.source(),
                    offset,
                    "augmented assignment needs a single target",
                ))
            }
            target => target,
        };
        let value = expr::parse_expr_list(stream)?;
        return Ok(StmtKind::AugAssign { target, op, value });
    }

    if !stream.check(&Token::Assign) {
        return Ok(StmtKind::Expr(first));
    }

    let mut exprs = vec![(offset, first)];
    while stream.eat(&Token::Assign) {
        let offset = stream.offset();
        exprs.push((offset, expr::parse_expr_list(stream)?));
    }
    let (_, value) = exprs.pop().ok_or_else(|| stream.unexpected("in assignment"))?;
    let targets = exprs
        .into_iter()
        .map(|(offset, e)| to_target(stream, e, offset))
        .collect::<Result<_, _>>()?;
    Ok(StmtKind::Assign { targets, value })
}

fn augmented_op(token: &Token) -> Option<crate::ast::BinaryOp> {
    use crate::ast::BinaryOp;
    match token {
        Token::PlusAssign => Some(BinaryOp::Add),
        Token::MinusAssign => Some(BinaryOp::Sub),
        Token::StarAssign => Some(BinaryOp::Mul),
        Token::SlashAssign => Some(BinaryOp::Div),
        _ => None,
    }
}

fn to_target(stream: &TokenStream<'_>, expr: Expr, offset: usize) -> Result<Target, ParseError> {
    match expr {
        Expr::Name(name) => Ok(Target::Name(name)),
        Expr::Index { object, index } => Ok(Target::Index {
            object: *object,
            index: *index,
        }),
        Expr::Slice { object, slice } => Ok(Target::Slice {
            object: *object,
            slice,
        }),
        Expr::Tuple(items) | Expr::List(items) => Ok(Target::Unpack(
            items
                .into_iter()
                .map(|e| to_target(stream, e, offset))
                .collect::<Result<_, _>>()?,
        )),
        _ => Err(ParseError::invalid_syntax(
            stream.source(),
            offset,
            "cannot assign to expression",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryOp, Literal};
    use pretty_assertions::assert_eq;

    #[test]
    fn bare_block_has_no_header() {
        let block = parse_block("a = 1").unwrap();
        assert_eq!(block.name, None);
        assert!(block.signature.is_zero_argument());
        assert_eq!(
            block.body,
            vec![Stmt {
                kind: StmtKind::Assign {
                    targets: vec![Target::Name("a".into())],
                    value: Expr::Literal(Literal::Int(1)),
                },
                line: 1,
            }]
        );
    }

    #[test]
    fn header_with_parameters_is_recorded() {
        let block = parse_block("def cfg(a, b=2, *rest, **extra):\n    pass").unwrap();
        let sig = &block.signature;
        assert_eq!(sig.params.len(), 2);
        assert!(sig.params[1].default.is_some());
        assert_eq!(sig.varargs.as_deref(), Some("rest"));
        assert_eq!(sig.kwargs.as_deref(), Some("extra"));
        assert!(!sig.is_zero_argument());
        assert_eq!(sig.describe(), "a, b, *rest, **extra");
    }

    #[test]
    fn statements_track_lines() {
        let block = parse_block("\n\na = 1; b = 2\n# note\nc = 3\n").unwrap();
        let lines: Vec<usize> = block.body.iter().map(|s| s.line).collect();
        assert_eq!(lines, vec![3, 3, 5]);
    }

    #[test]
    fn chained_and_unpacking_assignment() {
        let block = parse_block("a = b = 1\nx, y = 1, 2").unwrap();
        match &block.body[0].kind {
            StmtKind::Assign { targets, .. } => assert_eq!(targets.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
        match &block.body[1].kind {
            StmtKind::Assign { targets, value } => {
                assert!(matches!(&targets[0], Target::Unpack(t) if t.len() == 2));
                assert!(matches!(value, Expr::Tuple(v) if v.len() == 2));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn augmented_assignment() {
        let block = parse_block("x += [4]").unwrap();
        assert!(matches!(
            &block.body[0].kind,
            StmtKind::AugAssign { op: BinaryOp::Add, target: Target::Name(n), .. } if n == "x"
        ));
    }

    #[test]
    fn delete_and_item_targets() {
        let block = parse_block("del a, b['k']\nc[0] = 1\nd[1:2] = []").unwrap();
        assert!(matches!(&block.body[0].kind, StmtKind::Delete(t) if t.len() == 2));
        assert!(matches!(
            &block.body[1].kind,
            StmtKind::Assign { targets, .. } if matches!(targets[0], Target::Index { .. })
        ));
        assert!(matches!(
            &block.body[2].kind,
            StmtKind::Assign { targets, .. } if matches!(targets[0], Target::Slice { .. })
        ));
    }

    #[test]
    fn cannot_assign_to_call() {
        let err = parse_block("f() = 1").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidSyntax);
    }

    #[test]
    fn nested_def_is_rejected() {
        let err = parse_block("a = 1\ndef inner():\n    pass").unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn missing_separator_is_reported() {
        let err = parse_block("a = 1 b = 2").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedToken);
        assert_eq!(err.column, 7);
    }
}
