//! Low-level lexical helpers shared by every grammar rule.
//!
//! Parsing is scannerless: each combinator below skips leading whitespace and
//! comments, then matches its token. `position` computes a byte offset by
//! pointer-arithmetic against the original input slice, which is how every
//! rule below builds `Span`s without a separate token stream.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_until, take_while},
    character::complete::{alpha1, alphanumeric1, multispace1},
    combinator::{not, peek, recognize, value, verify},
    error::context,
    multi::many0,
    sequence::pair,
    Parser,
};

pub type PResult<'a, T> = nom::IResult<&'a str, T>;

pub fn position(full: &str, current: &str) -> usize {
    full.len() - current.len()
}

fn line_comment(input: &str) -> PResult<&str> {
    recognize(pair(tag("//"), take_while(|c| c != '\n'))).parse(input)
}

fn block_comment(input: &str) -> PResult<&str> {
    recognize((tag("/*"), take_until("*/"), tag("*/"))).parse(input)
}

/// Skip whitespace and comments (possibly none).
pub fn ws(input: &str) -> PResult<()> {
    value(
        (),
        many0(alt((
            value((), multispace1),
            value((), line_comment),
            value((), block_comment),
        ))),
    )
    .parse(input)
}

const KEYWORDS: &[&str] = &[
    "import", "export", "from", "interface", "function", "extern", "let", "return", "if", "else",
    "while", "for", "this", "true", "false", "sizeof",
];

fn is_keyword(s: &str) -> bool {
    KEYWORDS.contains(&s)
}

/// Parse a reserved keyword, rejecting it if it is merely a prefix of a longer identifier.
pub fn keyword<'a>(kw: &'static str) -> impl FnMut(&'a str) -> PResult<'a, &'a str> {
    move |input| {
        let (input, _) = ws(input)?;
        let (input, word) = verify(
            recognize(pair(tag(kw), peek(not(alphanumeric1)))),
            |s: &str| s == kw,
        )
        .parse(input)?;
        Ok((input, word))
    }
}

/// Parse an identifier that is not a reserved keyword.
pub fn identifier(input: &str) -> PResult<String> {
    let (input, _) = ws(input)?;
    let (input, id) = context(
        "expected an identifier",
        verify(
            recognize(pair(
                alt((alpha1, tag("_"))),
                many0(alt((alphanumeric1, tag("_")))),
            )),
            |s: &str| !is_keyword(s),
        ),
    )
    .parse(input)?;
    Ok((input, id.to_string()))
}

/// Parse a fixed punctuation/operator symbol.
pub fn symbol<'a>(sym: &'static str) -> impl FnMut(&'a str) -> PResult<'a, &'a str> {
    move |input| {
        let (input, _) = ws(input)?;
        tag(sym)(input)
    }
}
