//! Statement and block parsing.

use nom::{combinator::opt, multi::many0, Parser};

use crate::ast::{Block, Stmt, StmtKind};
use crate::expr::expression;
use crate::lex::{identifier, keyword, position, symbol, PResult};
use crate::types::type_ref;

pub fn block<'a>(full: &'a str, input: &'a str) -> PResult<'a, Block> {
    let (input, _) = symbol("{")(input)?;
    let (input, stmts) = many0(|i| statement(full, i)).parse(input)?;
    let (input, _) = symbol("}")(input)?;
    Ok((input, Block { stmts }))
}

pub fn statement<'a>(full: &'a str, input: &'a str) -> PResult<'a, Stmt> {
    let start = position(full, input);

    if let Ok((input, _)) = keyword("return")(input) {
        let (input, value) = opt(|i| expression(full, i)).parse(input)?;
        let (input, _) = symbol(";")(input)?;
        let end = position(full, input);
        return Ok((
            input,
            Stmt {
                kind: StmtKind::Return(value),
                span: crate::ast::Span::new(start, end),
            },
        ));
    }

    if let Ok((input, _)) = keyword("let")(input) {
        return let_statement(full, input, start);
    }

    if let Ok((input, _)) = keyword("if")(input) {
        return if_statement(full, input, start);
    }

    if let Ok((input, _)) = keyword("while")(input) {
        let (input, _) = symbol("(")(input)?;
        let (input, cond) = expression(full, input)?;
        let (input, _) = symbol(")")(input)?;
        let (input, body) = block(full, input)?;
        let end = position(full, input);
        return Ok((
            input,
            Stmt {
                kind: StmtKind::While { cond, body },
                span: crate::ast::Span::new(start, end),
            },
        ));
    }

    if let Ok((input, _)) = keyword("for")(input) {
        return for_statement(full, input, start);
    }

    if let Ok((input, inner)) = block(full, input) {
        let end = position(full, input);
        return Ok((
            input,
            Stmt {
                kind: StmtKind::Block(inner),
                span: crate::ast::Span::new(start, end),
            },
        ));
    }

    let (input, expr) = expression(full, input)?;
    let (input, _) = symbol(";")(input)?;
    let end = position(full, input);
    Ok((
        input,
        Stmt {
            kind: StmtKind::Expr(expr),
            span: crate::ast::Span::new(start, end),
        },
    ))
}

fn let_statement<'a>(full: &'a str, input: &'a str, start: usize) -> PResult<'a, Stmt> {
    let (input, name) = identifier(input)?;
    let (input, _) = symbol(":")(input)?;
    let (input, ty) = type_ref(input)?;
    let (input, _) = symbol("=")(input)?;
    let (input, init) = expression(full, input)?;
    let (input, _) = symbol(";")(input)?;
    let end = position(full, input);
    Ok((
        input,
        Stmt {
            kind: StmtKind::Let { name, ty, init },
            span: crate::ast::Span::new(start, end),
        },
    ))
}

fn if_statement<'a>(full: &'a str, input: &'a str, start: usize) -> PResult<'a, Stmt> {
    let (input, _) = symbol("(")(input)?;
    let (input, cond) = expression(full, input)?;
    let (input, _) = symbol(")")(input)?;
    let (input, then_branch) = block(full, input)?;

    let (input, else_branch) = if let Ok((input, _)) = keyword("else")(input) {
        if let Ok((input, _)) = keyword("if")(input) {
            let (input, nested) = if_statement(full, input, position(full, input))?;
            (input, Some(Box::new(nested)))
        } else {
            let else_start = position(full, input);
            let (input, else_block) = block(full, input)?;
            let else_end = position(full, input);
            (
                input,
                Some(Box::new(Stmt {
                    kind: StmtKind::Block(else_block),
                    span: crate::ast::Span::new(else_start, else_end),
                })),
            )
        }
    } else {
        (input, None)
    };

    let end = position(full, input);
    Ok((
        input,
        Stmt {
            kind: StmtKind::If {
                cond,
                then_branch,
                else_branch,
            },
            span: crate::ast::Span::new(start, end),
        },
    ))
}

fn for_statement<'a>(full: &'a str, input: &'a str, start: usize) -> PResult<'a, Stmt> {
    let (input, _) = symbol("(")(input)?;

    let (input, init) = if let Ok((input, _)) = symbol(";")(input) {
        (input, None)
    } else if let Ok((input, _)) = keyword("let")(input) {
        let init_start = position(full, input);
        let (input, s) = let_statement(full, input, init_start)?;
        (input, Some(Box::new(s)))
    } else {
        let init_start = position(full, input);
        let (input, e) = expression(full, input)?;
        let (input, _) = symbol(";")(input)?;
        let end = position(full, input);
        (
            input,
            Some(Box::new(Stmt {
                kind: StmtKind::Expr(e),
                span: crate::ast::Span::new(init_start, end),
            })),
        )
    };

    let (input, cond) = opt(|i| expression(full, i)).parse(input)?;
    let (input, _) = symbol(";")(input)?;
    let (input, step) = opt(|i| expression(full, i)).parse(input)?;
    let (input, _) = symbol(")")(input)?;
    let (input, body) = block(full, input)?;
    let end = position(full, input);

    Ok((
        input,
        Stmt {
            kind: StmtKind::For {
                init,
                cond,
                step,
                body,
            },
            span: crate::ast::Span::new(start, end),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::StmtKind;

    #[test]
    fn parses_let() {
        let src = "let x: i32 = 1 + 2;";
        let (rest, s) = statement(src, src).unwrap();
        assert_eq!(rest, "");
        assert!(matches!(s.kind, StmtKind::Let { .. }));
    }

    #[test]
    fn parses_if_else() {
        let src = "if (x < 1) { return 1; } else { return 2; }";
        let (_, s) = statement(src, src).unwrap();
        match s.kind {
            StmtKind::If { else_branch, .. } => assert!(else_branch.is_some()),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn parses_for_with_empty_clauses() {
        let src = "for (;;) { x; }";
        let (_, s) = statement(src, src).unwrap();
        match s.kind {
            StmtKind::For {
                init, cond, step, ..
            } => {
                assert!(init.is_none());
                assert!(cond.is_none());
                assert!(step.is_none());
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
