//! Parsing of surface type references: `number`, `Point`, `i32[]`, `Box<number>`.

use nom::{combinator::opt, multi::separated_list1, sequence::delimited, Parser};

use crate::ast::Type;
use crate::lex::{identifier, symbol, PResult};

pub fn type_ref(input: &str) -> PResult<Type> {
    let (input, name) = identifier(input)?;
    let (input, generic_args) = opt(delimited(
        symbol("<"),
        separated_list1(symbol(","), type_ref),
        symbol(">"),
    ))
    .parse(input)?;

    let mut ty = match generic_args {
        Some(args) => Type::Generic(name, args),
        None => Type::Name(name),
    };

    let (input, array_suffixes) = nom::multi::many0(|i| {
        let (i, _) = symbol("[")(i)?;
        let (i, _) = symbol("]")(i)?;
        Ok((i, ()))
    })
    .parse(input)?;

    for _ in array_suffixes {
        ty = Type::Array(Box::new(ty));
    }

    Ok((input, ty))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_primitive() {
        let (rest, ty) = type_ref("i32").unwrap();
        assert_eq!(rest, "");
        assert_eq!(ty, Type::Name("i32".into()));
    }

    #[test]
    fn parses_array() {
        let (_, ty) = type_ref("number[]").unwrap();
        assert_eq!(ty, Type::Array(Box::new(Type::Name("number".into()))));
    }

    #[test]
    fn parses_nested_generic() {
        let (_, ty) = type_ref("Box<Box<number>>").unwrap();
        assert_eq!(
            ty,
            Type::Generic(
                "Box".into(),
                vec![Type::Generic("Box".into(), vec![Type::Name("number".into())])]
            )
        );
    }
}
