//! Expression parsing.
//!
//! Precedence, loosest first: `lambda`, conditional, `or`, `and`, `not`,
//! comparisons, `+ -`, `* / // %`, unary `- +`, `**`, postfix (call,
//! method call, subscript).

use std::rc::Rc;

use crate::ast::{
    BinaryOp, CallArgs, CompareOp, Comprehension, DictComprehension, Expr, ForClause, LambdaExpr,
    Literal, SliceExpr, UnaryOp,
};
use crate::lexer::Token;

use super::stream::TokenStream;
use super::ParseError;

/// `expr, expr, ...`; a comma anywhere makes a tuple.
pub(super) fn parse_expr_list(stream: &mut TokenStream<'_>) -> Result<Expr, ParseError> {
    let first = parse_expr(stream)?;
    if !stream.check(&Token::Comma) {
        return Ok(first);
    }
    let mut items = vec![first];
    while stream.eat(&Token::Comma) {
        if !starts_expr(stream.peek()) {
            break;
        }
        items.push(parse_expr(stream)?);
    }
    Ok(Expr::Tuple(items))
}

pub(super) fn parse_expr(stream: &mut TokenStream<'_>) -> Result<Expr, ParseError> {
    stream.nested(parse_conditional)
}

fn parse_conditional(stream: &mut TokenStream<'_>) -> Result<Expr, ParseError> {
    if stream.check(&Token::Lambda) {
        return parse_lambda(stream);
    }
    let then = parse_or(stream)?;
    if !stream.eat(&Token::If) {
        return Ok(then);
    }
    let condition = parse_or(stream)?;
    stream.expect(&Token::Else, "in conditional expression")?;
    let otherwise = parse_expr(stream)?;
    Ok(Expr::Conditional {
        condition: Box::new(condition),
        then: Box::new(then),
        otherwise: Box::new(otherwise),
    })
}

fn parse_lambda(stream: &mut TokenStream<'_>) -> Result<Expr, ParseError> {
    stream.expect(&Token::Lambda, "at lambda")?;
    let mut params = Vec::new();
    while !stream.check(&Token::Colon) {
        params.push(stream.expect_ident("in lambda parameters")?);
        if !stream.eat(&Token::Comma) {
            break;
        }
    }
    stream.expect(&Token::Colon, "after lambda parameters")?;
    let body = parse_expr(stream)?;
    Ok(Expr::Lambda(Rc::new(LambdaExpr { params, body })))
}

fn parse_or(stream: &mut TokenStream<'_>) -> Result<Expr, ParseError> {
    let mut lhs = parse_and(stream)?;
    while stream.eat(&Token::Or) {
        let rhs = parse_and(stream)?;
        lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
    }
    Ok(lhs)
}

fn parse_and(stream: &mut TokenStream<'_>) -> Result<Expr, ParseError> {
    let mut lhs = parse_not(stream)?;
    while stream.eat(&Token::And) {
        let rhs = parse_not(stream)?;
        lhs = Expr::And(Box::new(lhs), Box::new(rhs));
    }
    Ok(lhs)
}

fn parse_not(stream: &mut TokenStream<'_>) -> Result<Expr, ParseError> {
    if stream.eat(&Token::Not) {
        let operand = stream.nested(parse_not)?;
        return Ok(Expr::Unary {
            op: UnaryOp::Not,
            operand: Box::new(operand),
        });
    }
    parse_comparison(stream)
}

fn parse_comparison(stream: &mut TokenStream<'_>) -> Result<Expr, ParseError> {
    let first = parse_arith(stream)?;
    let mut rest = Vec::new();
    loop {
        let op = match stream.peek() {
            Some(Token::EqEq) => CompareOp::Eq,
            Some(Token::NotEq) => CompareOp::Ne,
            Some(Token::Lt) => CompareOp::Lt,
            Some(Token::LtEq) => CompareOp::Le,
            Some(Token::Gt) => CompareOp::Gt,
            Some(Token::GtEq) => CompareOp::Ge,
            Some(Token::In) => CompareOp::In,
            Some(Token::Not) if stream.peek_nth(1) == Some(&Token::In) => {
                stream.advance();
                CompareOp::NotIn
            }
            _ => break,
        };
        stream.advance();
        rest.push((op, parse_arith(stream)?));
    }
    if rest.is_empty() {
        Ok(first)
    } else {
        Ok(Expr::Compare {
            first: Box::new(first),
            rest,
        })
    }
}

fn parse_arith(stream: &mut TokenStream<'_>) -> Result<Expr, ParseError> {
    let mut lhs = parse_term(stream)?;
    loop {
        let op = match stream.peek() {
            Some(Token::Plus) => BinaryOp::Add,
            Some(Token::Minus) => BinaryOp::Sub,
            _ => break,
        };
        stream.advance();
        let rhs = parse_term(stream)?;
        lhs = binary(op, lhs, rhs);
    }
    Ok(lhs)
}

fn parse_term(stream: &mut TokenStream<'_>) -> Result<Expr, ParseError> {
    let mut lhs = parse_factor(stream)?;
    loop {
        let op = match stream.peek() {
            Some(Token::Star) => BinaryOp::Mul,
            Some(Token::Slash) => BinaryOp::Div,
            Some(Token::DoubleSlash) => BinaryOp::FloorDiv,
            Some(Token::Percent) => BinaryOp::Mod,
            _ => break,
        };
        stream.advance();
        let rhs = parse_factor(stream)?;
        lhs = binary(op, lhs, rhs);
    }
    Ok(lhs)
}

fn parse_factor(stream: &mut TokenStream<'_>) -> Result<Expr, ParseError> {
    let op = match stream.peek() {
        Some(Token::Minus) => UnaryOp::Neg,
        Some(Token::Plus) => UnaryOp::Pos,
        _ => return parse_power(stream),
    };
    stream.advance();
    let operand = stream.nested(parse_factor)?;
    Ok(Expr::Unary {
        op,
        operand: Box::new(operand),
    })
}

fn parse_power(stream: &mut TokenStream<'_>) -> Result<Expr, ParseError> {
    let base = parse_postfix(stream)?;
    if stream.eat(&Token::DoubleStar) {
        // right-associative, and binds tighter than a unary minus on its left
        let exponent = stream.nested(parse_factor)?;
        return Ok(binary(BinaryOp::Pow, base, exponent));
    }
    Ok(base)
}

fn parse_postfix(stream: &mut TokenStream<'_>) -> Result<Expr, ParseError> {
    let mut expr = parse_atom(stream)?;
    loop {
        match stream.peek() {
            Some(Token::LParen) => {
                stream.advance();
                let args = parse_call_args(stream)?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                };
            }
            Some(Token::LBracket) => {
                stream.advance();
                expr = parse_subscript(stream, expr)?;
            }
            Some(Token::Dot) => {
                stream.advance();
                let name = stream.expect_ident("after `.`")?;
                if !stream.eat(&Token::LParen) {
                    return Err(ParseError::invalid_syntax(
                        stream.source(),
                        stream.offset(),
                        format!("attribute access is not supported; call `.{name}(...)` as a method"),
                    ));
                }
                let args = parse_call_args(stream)?;
                expr = Expr::Method {
                    receiver: Box::new(expr),
                    name,
                    args,
                };
            }
            _ => return Ok(expr),
        }
    }
}

/// Arguments after `(`, including the closing `)`.
fn parse_call_args(stream: &mut TokenStream<'_>) -> Result<CallArgs, ParseError> {
    let mut args = CallArgs::default();
    while !stream.check(&Token::RParen) {
        let is_keyword = matches!(stream.peek(), Some(Token::Ident(_)))
            && stream.peek_nth(1) == Some(&Token::Assign);
        if is_keyword {
            let name = stream.expect_ident("as keyword argument")?;
            stream.advance();
            args.keyword.push((name, parse_expr(stream)?));
        } else if args.keyword.is_empty() {
            args.positional.push(parse_expr(stream)?);
        } else {
            return Err(ParseError::invalid_syntax(
                stream.source(),
                stream.offset(),
                "positional argument follows keyword argument",
            ));
        }
        if !stream.eat(&Token::Comma) {
            break;
        }
    }
    stream.expect(&Token::RParen, "to close argument list")?;
    Ok(args)
}

/// Subscript after `[`, including the closing `]`.
fn parse_subscript(stream: &mut TokenStream<'_>, object: Expr) -> Result<Expr, ParseError> {
    let lower = if stream.check(&Token::Colon) {
        None
    } else {
        let index = parse_expr(stream)?;
        if stream.eat(&Token::RBracket) {
            return Ok(Expr::Index {
                object: Box::new(object),
                index: Box::new(index),
            });
        }
        Some(Box::new(index))
    };

    stream.expect(&Token::Colon, "in subscript")?;
    let upper = parse_slice_bound(stream)?;
    let step = if stream.eat(&Token::Colon) {
        parse_slice_bound(stream)?
    } else {
        None
    };
    stream.expect(&Token::RBracket, "to close subscript")?;
    Ok(Expr::Slice {
        object: Box::new(object),
        slice: SliceExpr { lower, upper, step },
    })
}

fn parse_slice_bound(stream: &mut TokenStream<'_>) -> Result<Option<Box<Expr>>, ParseError> {
    if matches!(stream.peek(), Some(Token::Colon | Token::RBracket)) {
        Ok(None)
    } else {
        Ok(Some(Box::new(parse_expr(stream)?)))
    }
}

fn parse_atom(stream: &mut TokenStream<'_>) -> Result<Expr, ParseError> {
    let Some(token) = stream.peek().cloned() else {
        return Err(stream.unexpected("in expression"));
    };
    let expr = match token {
        Token::Null => Expr::Literal(Literal::Null),
        Token::True => Expr::Literal(Literal::Bool(true)),
        Token::False => Expr::Literal(Literal::Bool(false)),
        Token::Int(i) => Expr::Literal(Literal::Int(i)),
        Token::Float(x) => Expr::Literal(Literal::Float(x)),
        Token::Str(s) => {
            stream.advance();
            return Ok(Expr::Literal(Literal::Str(concat_strings(stream, s))));
        }
        Token::Ident(name) => Expr::Name(name),
        Token::LParen => {
            stream.advance();
            return parse_parenthesized(stream);
        }
        Token::LBracket => {
            stream.advance();
            return parse_list(stream);
        }
        Token::LBrace => {
            stream.advance();
            return parse_dict(stream);
        }
        _ => return Err(stream.unexpected("in expression")),
    };
    stream.advance();
    Ok(expr)
}

/// Adjacent string literals concatenate.
fn concat_strings(stream: &mut TokenStream<'_>, mut first: String) -> String {
    while let Some(Token::Str(next)) = stream.peek() {
        first.push_str(next);
        stream.advance();
    }
    first
}

fn parse_parenthesized(stream: &mut TokenStream<'_>) -> Result<Expr, ParseError> {
    if stream.eat(&Token::RParen) {
        return Ok(Expr::Tuple(Vec::new()));
    }
    let inner = parse_expr_list(stream)?;
    stream.expect(&Token::RParen, "to close parenthesis")?;
    Ok(inner)
}

fn parse_list(stream: &mut TokenStream<'_>) -> Result<Expr, ParseError> {
    if stream.eat(&Token::RBracket) {
        return Ok(Expr::List(Vec::new()));
    }
    let first = parse_expr(stream)?;
    if stream.check(&Token::For) {
        let clause = parse_for_clause(stream)?;
        stream.expect(&Token::RBracket, "to close list comprehension")?;
        return Ok(Expr::ListComp(Box::new(Comprehension {
            element: first,
            clause,
        })));
    }
    let mut items = vec![first];
    while stream.eat(&Token::Comma) {
        if stream.check(&Token::RBracket) {
            break;
        }
        items.push(parse_expr(stream)?);
    }
    stream.expect(&Token::RBracket, "to close list")?;
    Ok(Expr::List(items))
}

fn parse_dict(stream: &mut TokenStream<'_>) -> Result<Expr, ParseError> {
    if stream.eat(&Token::RBrace) {
        return Ok(Expr::Dict(Vec::new()));
    }
    let key = parse_expr(stream)?;
    stream.expect(&Token::Colon, "after dict key")?;
    let value = parse_expr(stream)?;
    if stream.check(&Token::For) {
        let clause = parse_for_clause(stream)?;
        stream.expect(&Token::RBrace, "to close dict comprehension")?;
        return Ok(Expr::DictComp(Box::new(DictComprehension { key, value, clause })));
    }
    let mut entries = vec![(key, value)];
    while stream.eat(&Token::Comma) {
        if stream.check(&Token::RBrace) {
            break;
        }
        let key = parse_expr(stream)?;
        stream.expect(&Token::Colon, "after dict key")?;
        let value = parse_expr(stream)?;
        entries.push((key, value));
    }
    stream.expect(&Token::RBrace, "to close dict")?;
    Ok(Expr::Dict(entries))
}

fn parse_for_clause(stream: &mut TokenStream<'_>) -> Result<ForClause, ParseError> {
    stream.expect(&Token::For, "in comprehension")?;
    let mut targets = vec![stream.expect_ident("as loop variable")?];
    while stream.eat(&Token::Comma) {
        targets.push(stream.expect_ident("as loop variable")?);
    }
    stream.expect(&Token::In, "after loop variables")?;
    let iter = parse_or(stream)?;
    let condition = if stream.eat(&Token::If) {
        Some(parse_or(stream)?)
    } else {
        None
    };
    if stream.check(&Token::For) {
        return Err(ParseError::invalid_syntax(
            stream.source(),
            stream.offset(),
            "nested comprehension clauses are not supported",
        ));
    }
    Ok(ForClause {
        targets,
        iter,
        condition,
    })
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

fn starts_expr(token: Option<&Token>) -> bool {
    matches!(
        token,
        Some(
            Token::Ident(_)
                | Token::Int(_)
                | Token::Float(_)
                | Token::Str(_)
                | Token::True
                | Token::False
                | Token::Null
                | Token::LParen
                | Token::LBracket
                | Token::LBrace
                | Token::Minus
                | Token::Plus
                | Token::Not
                | Token::Lambda
        )
    )
}

#[cfg(test)]
mod tests {
    use crate::ast::{BinaryOp, CompareOp, Expr, Literal, StmtKind, UnaryOp};
    use crate::{parse_block, ParseErrorKind};

    fn expr(source: &str) -> Expr {
        let block = parse_block(&format!("_ = {source}")).unwrap();
        match block.body.into_iter().next().map(|s| s.kind) {
            Some(StmtKind::Assign { value, .. }) => value,
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn arithmetic_precedence() {
        let e = expr("1 + 2 * 3");
        assert!(matches!(e, Expr::Binary { op: BinaryOp::Add, ref rhs, .. }
            if matches!(**rhs, Expr::Binary { op: BinaryOp::Mul, .. })));
    }

    #[test]
    fn power_binds_tighter_than_unary_minus() {
        let e = expr("-2 ** 2");
        assert!(matches!(e, Expr::Unary { op: UnaryOp::Neg, ref operand }
            if matches!(**operand, Expr::Binary { op: BinaryOp::Pow, .. })));
    }

    #[test]
    fn not_in_is_one_operator() {
        let e = expr("a not in b");
        assert!(matches!(e, Expr::Compare { ref rest, .. } if rest[0].0 == CompareOp::NotIn));
    }

    #[test]
    fn conditional_expression() {
        assert!(matches!(expr("1 if flag else 2"), Expr::Conditional { .. }));
    }

    #[test]
    fn tuples_and_grouping() {
        assert!(matches!(expr("()"), Expr::Tuple(ref v) if v.is_empty()));
        assert!(matches!(expr("(1)"), Expr::Literal(Literal::Int(1))));
        assert!(matches!(expr("(1,)"), Expr::Tuple(ref v) if v.len() == 1));
    }

    #[test]
    fn comprehensions() {
        assert!(matches!(expr("[x * 2 for x in xs if x]"), Expr::ListComp(_)));
        assert!(matches!(expr("{k: v for k, v in d.items()}"), Expr::DictComp(ref c)
            if c.clause.targets.len() == 2));
    }

    #[test]
    fn calls_methods_and_keywords() {
        let e = expr("sorted(xs, reverse=True)");
        assert!(matches!(e, Expr::Call { ref args, .. }
            if args.positional.len() == 1 && args.keyword.len() == 1));
        assert!(matches!(expr("x.append(4)"), Expr::Method { ref name, .. } if name == "append"));
    }

    #[test]
    fn slices() {
        assert!(matches!(expr("x[::-1]"), Expr::Slice { ref slice, .. }
            if slice.lower.is_none() && slice.upper.is_none() && slice.step.is_some()));
        assert!(matches!(expr("x[1:]"), Expr::Slice { ref slice, .. }
            if slice.lower.is_some() && slice.upper.is_none()));
    }

    #[test]
    fn lambda_with_parameters() {
        assert!(matches!(expr("lambda a, b: a + b"), Expr::Lambda(ref l) if l.params.len() == 2));
        assert!(matches!(expr("lambda: 1"), Expr::Lambda(ref l) if l.params.is_empty()));
    }

    #[test]
    fn adjacent_strings_concatenate() {
        assert_eq!(expr("'a' \"b\""), Expr::Literal(Literal::Str("ab".into())));
    }

    #[test]
    fn bare_attribute_is_rejected() {
        assert!(parse_block("y = x.shape").is_err());
    }

    #[test]
    fn nesting_within_the_limit_parses() {
        let source = format!("x = {}1{}", "[".repeat(150), "]".repeat(150));
        assert!(parse_block(&source).is_ok());
    }

    #[test]
    fn deep_nesting_is_an_error() {
        let cases = [
            format!("x = {}1{}", "[".repeat(1000), "]".repeat(1000)),
            format!("x = {}1{}", "(".repeat(1000), ")".repeat(1000)),
            format!("x = {}1", "not ".repeat(1000)),
            format!("x = {}1", "-".repeat(1000)),
            format!("x = 2{}", " ** 2".repeat(1000)),
            format!("x = {}1", "lambda: ".repeat(1000)),
        ];
        for source in &cases {
            let err = parse_block(source).unwrap_err();
            assert_eq!(err.kind, ParseErrorKind::NestingTooDeep, "{}", &source[..12]);
            assert_eq!(err.line, 1);
        }
    }
}
