//! Expression parsing with precedence climbing.
//!
//! `expression` is the entry point; each precedence tier is its own function,
//! mirroring how the teacher's Haxe parser lays out `ternary_expr` /
//! `assignment_expr` / … as a chain of functions rather than one big Pratt loop.

use nom::{
    branch::alt,
    bytes::complete::{escaped_transform, is_not, tag},
    character::complete::{char, digit1},
    combinator::{map, map_res, opt, value},
    multi::separated_list0,
    sequence::delimited,
    Parser,
};

use crate::ast::{BinOp, Expr, ExprKind, UnaryOp};
use crate::lex::{identifier, keyword, position, symbol, ws, PResult};
use crate::types::type_ref;

pub fn expression<'a>(full: &'a str, input: &'a str) -> PResult<'a, Expr> {
    assignment_expr(full, input)
}

pub fn assignment_expr<'a>(full: &'a str, input: &'a str) -> PResult<'a, Expr> {
    let start = position(full, input);
    let (input, target) = equality_expr(full, input)?;

    if let Ok((input, _)) = symbol("=")(input) {
        let (input, value) = assignment_expr(full, input)?;
        let end = position(full, input);
        return Ok((
            input,
            Expr {
                kind: ExprKind::Assign {
                    target: Box::new(target),
                    value: Box::new(value),
                },
                span: crate::ast::Span::new(start, end),
            },
        ));
    }
    Ok((input, target))
}

fn binop_chain<'a>(
    full: &'a str,
    input: &'a str,
    ops: &[(&'static str, BinOp)],
    next: impl Fn(&'a str, &'a str) -> PResult<'a, Expr>,
) -> PResult<'a, Expr> {
    let start = position(full, input);
    let (mut input, mut left) = next(full, input)?;

    loop {
        let mut matched = None;
        for (text, op) in ops {
            if let Ok((rest, _)) = symbol(text)(input) {
                matched = Some((rest, *op));
                break;
            }
        }
        match matched {
            Some((rest, op)) => {
                let (rest, right) = next(full, rest)?;
                let end = position(full, rest);
                left = Expr {
                    kind: ExprKind::Binary(op, Box::new(left), Box::new(right)),
                    span: crate::ast::Span::new(start, end),
                };
                input = rest;
            }
            None => break,
        }
    }
    Ok((input, left))
}

fn equality_expr<'a>(full: &'a str, input: &'a str) -> PResult<'a, Expr> {
    binop_chain(
        full,
        input,
        &[("==", BinOp::Eq), ("!=", BinOp::Ne)],
        comparison_expr,
    )
}

fn comparison_expr<'a>(full: &'a str, input: &'a str) -> PResult<'a, Expr> {
    binop_chain(
        full,
        input,
        &[
            ("<=", BinOp::Le),
            (">=", BinOp::Ge),
            ("<", BinOp::Lt),
            (">", BinOp::Gt),
        ],
        additive_expr,
    )
}

fn additive_expr<'a>(full: &'a str, input: &'a str) -> PResult<'a, Expr> {
    binop_chain(
        full,
        input,
        &[("+", BinOp::Add), ("-", BinOp::Sub)],
        multiplicative_expr,
    )
}

fn multiplicative_expr<'a>(full: &'a str, input: &'a str) -> PResult<'a, Expr> {
    binop_chain(
        full,
        input,
        &[("*", BinOp::Mul), ("/", BinOp::Div), ("%", BinOp::Mod)],
        unary_expr,
    )
}

fn unary_expr<'a>(full: &'a str, input: &'a str) -> PResult<'a, Expr> {
    let start = position(full, input);
    if let Ok((input, _)) = symbol("-")(input) {
        let (input, operand) = unary_expr(full, input)?;
        let end = position(full, input);
        return Ok((
            input,
            Expr {
                kind: ExprKind::Unary(UnaryOp::Neg, Box::new(operand)),
                span: crate::ast::Span::new(start, end),
            },
        ));
    }
    if let Ok((input, _)) = symbol("!")(input) {
        let (input, operand) = unary_expr(full, input)?;
        let end = position(full, input);
        return Ok((
            input,
            Expr {
                kind: ExprKind::Unary(UnaryOp::Not, Box::new(operand)),
                span: crate::ast::Span::new(start, end),
            },
        ));
    }
    postfix_expr(full, input)
}

fn postfix_expr<'a>(full: &'a str, input: &'a str) -> PResult<'a, Expr> {
    let start = position(full, input);
    let (mut input, mut expr) = primary_expr(full, input)?;

    loop {
        if let Ok((rest, _)) = symbol(".")(input) {
            let (rest, name) = identifier(rest)?;
            if let Ok((rest, args)) = args_list(full, rest) {
                let end = position(full, rest);
                expr = Expr {
                    kind: ExprKind::MethodCall {
                        base: Box::new(expr),
                        method: name,
                        args,
                    },
                    span: crate::ast::Span::new(start, end),
                };
                input = rest;
            } else {
                let end = position(full, rest);
                expr = Expr {
                    kind: ExprKind::Field {
                        base: Box::new(expr),
                        name,
                    },
                    span: crate::ast::Span::new(start, end),
                };
                input = rest;
            }
            continue;
        }
        if let Ok((rest, _)) = symbol("[")(input) {
            let (rest, index) = expression(full, rest)?;
            let (rest, _) = symbol("]")(rest)?;
            let end = position(full, rest);
            expr = Expr {
                kind: ExprKind::Index {
                    base: Box::new(expr),
                    index: Box::new(index),
                },
                span: crate::ast::Span::new(start, end),
            };
            input = rest;
            continue;
        }
        break;
    }
    Ok((input, expr))
}

/// `( arg, arg, … )` — returns an error if there is no opening paren at all,
/// letting callers distinguish a field access from a call/method-call.
fn args_list<'a>(full: &'a str, input: &'a str) -> PResult<'a, Vec<Expr>> {
    delimited(
        symbol("("),
        separated_list0(symbol(","), |i| expression(full, i)),
        symbol(")"),
    )
    .parse(input)
}

fn int_literal(input: &str) -> PResult<i64> {
    let (input, _) = ws(input)?;
    map_res(digit1, |s: &str| s.parse::<i64>()).parse(input)
}

/// Parses a string literal and returns its decoded value — used both for
/// string-literal expressions and for the module path in an `import … from`.
pub fn string_literal_value(input: &str) -> PResult<String> {
    string_literal(input)
}

fn string_literal(input: &str) -> PResult<String> {
    let (input, _) = ws(input)?;
    delimited(
        char('"'),
        map(
            opt(escaped_transform(
                is_not("\\\""),
                '\\',
                alt((
                    value("\\", tag("\\")),
                    value("\"", tag("\"")),
                    value("\n", tag("n")),
                    value("\t", tag("t")),
                    value("\r", tag("r")),
                )),
            )),
            |s: Option<String>| s.unwrap_or_default(),
        ),
        char('"'),
    )
    .parse(input)
}

fn primary_expr<'a>(full: &'a str, input: &'a str) -> PResult<'a, Expr> {
    let start = position(full, input);

    if let Ok((input, n)) = int_literal(input) {
        let end = position(full, input);
        return Ok((
            input,
            Expr {
                kind: ExprKind::Int(n),
                span: crate::ast::Span::new(start, end),
            },
        ));
    }
    if let Ok((input, s)) = string_literal(input) {
        let end = position(full, input);
        return Ok((
            input,
            Expr {
                kind: ExprKind::Str(s),
                span: crate::ast::Span::new(start, end),
            },
        ));
    }
    if let Ok((input, _)) = keyword("true")(input) {
        let end = position(full, input);
        return Ok((
            input,
            Expr {
                kind: ExprKind::Bool(true),
                span: crate::ast::Span::new(start, end),
            },
        ));
    }
    if let Ok((input, _)) = keyword("false")(input) {
        let end = position(full, input);
        return Ok((
            input,
            Expr {
                kind: ExprKind::Bool(false),
                span: crate::ast::Span::new(start, end),
            },
        ));
    }
    if let Ok((input, _)) = keyword("this")(input) {
        let end = position(full, input);
        return Ok((
            input,
            Expr {
                kind: ExprKind::This,
                span: crate::ast::Span::new(start, end),
            },
        ));
    }
    if let Ok((input, _)) = keyword("sizeof")(input) {
        let (input, _) = symbol("<")(input)?;
        let (input, ty) = type_ref(input)?;
        let (input, _) = symbol(">")(input)?;
        let (input, _) = symbol("(")(input)?;
        let (input, _) = symbol(")")(input)?;
        let end = position(full, input);
        return Ok((
            input,
            Expr {
                kind: ExprKind::SizeOf(ty),
                span: crate::ast::Span::new(start, end),
            },
        ));
    }
    if let Ok((input, _)) = symbol("(")(input) {
        let (input, inner) = expression(full, input)?;
        let (input, _) = symbol(")")(input)?;
        let end = position(full, input);
        return Ok((
            input,
            Expr {
                kind: ExprKind::Paren(Box::new(inner)),
                span: crate::ast::Span::new(start, end),
            },
        ));
    }

    let (input, name) = identifier(input)?;
    if let Ok((input, args)) = args_list(full, input) {
        let end = position(full, input);
        return Ok((
            input,
            Expr {
                kind: ExprKind::Call { callee: name, args },
                span: crate::ast::Span::new(start, end),
            },
        ));
    }
    let end = position(full, input);
    Ok((
        input,
        Expr {
            kind: ExprKind::Ident(name),
            span: crate::ast::Span::new(start, end),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_arithmetic_precedence() {
        let src = "1 + 2 * 3";
        let (_, e) = expression(src, src).unwrap();
        match e.kind {
            ExprKind::Binary(BinOp::Add, _, rhs) => {
                assert!(matches!(rhs.kind, ExprKind::Binary(BinOp::Mul, _, _)));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn parses_property_chain() {
        let src = "line.start.x";
        let (_, e) = expression(src, src).unwrap();
        assert!(matches!(e.kind, ExprKind::Field { .. }));
    }

    #[test]
    fn parses_method_call() {
        let src = "rect.scale(2)";
        let (_, e) = expression(src, src).unwrap();
        match e.kind {
            ExprKind::MethodCall { method, args, .. } => {
                assert_eq!(method, "scale");
                assert_eq!(args.len(), 1);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn parses_string_escape() {
        let src = "\"x=10, y=20\\n\"";
        let (_, e) = expression(src, src).unwrap();
        assert_eq!(e.kind, ExprKind::Str("x=10, y=20\n".to_string()));
    }
}
