//! Top-level item parsing: imports, exports, interfaces, functions, externs.

use nom::{combinator::opt, multi::separated_list0, Parser};

use crate::ast::{
    ExternDecl, Field, FunctionDecl, ImportDecl, InterfaceDecl, Item, ItemKind, Param, SourceFile,
};
use crate::lex::{identifier, keyword, position, symbol, ws, PResult};
use crate::stmt::block;
use crate::types::type_ref;

pub fn source_file(input: &str) -> PResult<SourceFile> {
    let full = input;
    let (input, _) = ws(input)?;
    let (input, items) = nom::multi::many0(|i| item(full, i)).parse(input)?;
    let (input, _) = ws(input)?;
    Ok((input, SourceFile { items }))
}

fn params<'a>(input: &'a str) -> PResult<'a, Vec<Param>> {
    let (input, _) = symbol("(")(input)?;
    let (input, list) = separated_list0(symbol(","), param).parse(input)?;
    let (input, _) = symbol(")")(input)?;
    Ok((input, list))
}

fn param(input: &str) -> PResult<Param> {
    let (input, variadic) = opt(symbol("...")).parse(input)?;
    let (input, name) = identifier(input)?;
    let (input, _) = symbol(":")(input)?;
    let (input, ty) = type_ref(input)?;
    Ok((
        input,
        Param {
            name,
            ty,
            variadic: variadic.is_some(),
        },
    ))
}

fn function_decl<'a>(full: &'a str, input: &'a str, start: usize) -> PResult<'a, FunctionDecl> {
    let (input, name) = identifier(input)?;
    let (input, params) = params(input)?;
    let (input, _) = symbol(":")(input)?;
    let (input, return_ty) = type_ref(input)?;
    let (input, body) = block(full, input)?;
    let end = position(full, input);
    Ok((
        input,
        FunctionDecl {
            name,
            params,
            return_ty,
            body,
            span: crate::ast::Span::new(start, end),
        },
    ))
}

fn extern_decl<'a>(full: &'a str, input: &'a str, start: usize) -> PResult<'a, ExternDecl> {
    let (input, _) = keyword("function")(input)?;
    let (input, name) = identifier(input)?;
    let (input, params) = params(input)?;
    let (input, _) = symbol(":")(input)?;
    let (input, return_ty) = type_ref(input)?;
    let (input, _) = symbol(";")(input)?;
    let end = position(full, input);
    Ok((
        input,
        ExternDecl {
            name,
            params,
            return_ty,
            span: crate::ast::Span::new(start, end),
        },
    ))
}

fn interface_decl<'a>(full: &'a str, input: &'a str, start: usize) -> PResult<'a, InterfaceDecl> {
    let (input, name) = identifier(input)?;
    let (input, type_params) = opt(nom::sequence::delimited(
        symbol("<"),
        nom::multi::separated_list1(symbol(","), identifier),
        symbol(">"),
    ))
    .parse(input)?;
    let (input, _) = symbol("{")(input)?;
    let (input, fields) = nom::multi::many0(|i| field(full, i)).parse(input)?;
    let (input, _) = symbol("}")(input)?;
    let end = position(full, input);
    Ok((
        input,
        InterfaceDecl {
            name,
            type_params: type_params.unwrap_or_default(),
            fields,
            span: crate::ast::Span::new(start, end),
        },
    ))
}

fn field<'a>(full: &'a str, input: &'a str) -> PResult<'a, Field> {
    let start = position(full, input);
    let (input, name) = identifier(input)?;
    let (input, _) = symbol(":")(input)?;
    let (input, ty) = type_ref(input)?;
    let (input, _) = symbol(";")(input)?;
    let end = position(full, input);
    Ok((
        input,
        Field {
            name,
            ty,
            span: crate::ast::Span::new(start, end),
        },
    ))
}

fn import_decl<'a>(full: &'a str, input: &'a str, start: usize) -> PResult<'a, ImportDecl> {
    let (input, _) = symbol("{")(input)?;
    let (input, names) = separated_list0(symbol(","), identifier).parse(input)?;
    let (input, _) = symbol("}")(input)?;
    let (input, _) = keyword("from")(input)?;
    let (input, module) = crate::expr::string_literal_value(input)?;
    let (input, _) = symbol(";")(input)?;
    let end = position(full, input);
    Ok((
        input,
        ImportDecl {
            names,
            from: module,
            span: crate::ast::Span::new(start, end),
        },
    ))
}

fn item<'a>(full: &'a str, input: &'a str) -> PResult<'a, Item> {
    let start = position(full, input);

    if let Ok((input, _)) = keyword("import")(input) {
        let (input, decl) = import_decl(full, input, start)?;
        let end = position(full, input);
        return Ok((
            input,
            Item {
                kind: ItemKind::Import(decl),
                span: crate::ast::Span::new(start, end),
            },
        ));
    }

    if let Ok((input, _)) = keyword("export")(input) {
        if let Ok((input, _)) = symbol("{")(input) {
            let (input, names) = separated_list0(symbol(","), identifier).parse(input)?;
            let (input, _) = symbol("}")(input)?;
            let (input, _) = symbol(";")(input)?;
            let end = position(full, input);
            return Ok((
                input,
                Item {
                    kind: ItemKind::ExportNames(names),
                    span: crate::ast::Span::new(start, end),
                },
            ));
        }
        let (input, _) = keyword("function")(input)?;
        let (input, decl) = function_decl(full, input, start)?;
        let end = position(full, input);
        return Ok((
            input,
            Item {
                kind: ItemKind::ExportFunction(decl),
                span: crate::ast::Span::new(start, end),
            },
        ));
    }

    if let Ok((input, _)) = keyword("interface")(input) {
        let (input, decl) = interface_decl(full, input, start)?;
        let end = position(full, input);
        return Ok((
            input,
            Item {
                kind: ItemKind::Interface(decl),
                span: crate::ast::Span::new(start, end),
            },
        ));
    }

    if let Ok((input, _)) = keyword("extern")(input) {
        let (input, decl) = extern_decl(full, input, start)?;
        let end = position(full, input);
        return Ok((
            input,
            Item {
                kind: ItemKind::Extern(decl),
                span: crate::ast::Span::new(start, end),
            },
        ));
    }

    let (input, _) = keyword("function")(input)?;
    let (input, decl) = function_decl(full, input, start)?;
    let end = position(full, input);
    Ok((
        input,
        Item {
            kind: ItemKind::Function(decl),
            span: crate::ast::Span::new(start, end),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_interface() {
        let src = "interface Point { x: i32; y: i32; }";
        let (rest, f) = source_file(src).unwrap();
        assert_eq!(rest, "");
        assert_eq!(f.items.len(), 1);
        match &f.items[0].kind {
            ItemKind::Interface(decl) => {
                assert_eq!(decl.name, "Point");
                assert_eq!(decl.fields.len(), 2);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn parses_import_and_function() {
        let src = r#"
            import { add } from "./math";

            export function main(): i32 {
                return add(1, 2);
            }
        "#;
        let (_, f) = source_file(src).unwrap();
        assert_eq!(f.items.len(), 2);
        assert!(matches!(f.items[0].kind, ItemKind::Import(_)));
        assert!(matches!(f.items[1].kind, ItemKind::ExportFunction(_)));
    }

    #[test]
    fn parses_extern_decl() {
        let src = "extern function printf(fmt: string, ...args: i32): i32;";
        let (_, f) = source_file(src).unwrap();
        match &f.items[0].kind {
            ItemKind::Extern(decl) => {
                assert_eq!(decl.name, "printf");
                assert!(decl.params.last().unwrap().variadic);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
