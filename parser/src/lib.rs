//! Lexer and recursive-descent parser for the Kiln source language.
//!
//! The grammar is scannerless: every combinator in [`lex`] skips its own
//! leading whitespace and comments, so there is no separate tokenization pass.
//! Spans are computed by pointer arithmetic against the original input slice
//! (see `lex::position`), the same trick the Haxe parser this one grew out of
//! used to track source locations without a token stream.

pub mod ast;
pub mod decls;
pub mod expr;
pub mod lex;
pub mod stmt;
pub mod types;

use diagnostics::{DiagnosticBuilder, Diagnostics, FileId, SourcePosition, SourceSpan};
use nom::Finish;

pub use ast::*;

/// Parses a complete source file, producing an owned [`SourceFile`] AST.
///
/// On a syntax error, returns a human-readable message built from nom's
/// own error context together with the file name, suitable for wrapping in
/// a [`diagnostics::Diagnostic`] by the caller.
pub fn parse_source_file(file_name: &str, source: &str) -> Result<SourceFile, String> {
    match decls::source_file(source).finish() {
        Ok((remaining, file)) if remaining.trim().is_empty() => Ok(file),
        Ok((remaining, _)) => Err(format!(
            "{file_name}: unexpected trailing input near {:?}",
            remaining.chars().take(40).collect::<String>()
        )),
        Err(e) => Err(format!("{file_name}: {e}")),
    }
}

/// Parses a source file, recording a failure as a diagnostic instead of
/// returning a bare `Err`. Used by the CLI driver, which reports everything
/// through a shared [`Diagnostics`] bag.
pub fn parse_into(file_name: &str, source: &str, diagnostics: &mut Diagnostics) -> Option<SourceFile> {
    match parse_source_file(file_name, source) {
        Ok(file) => Some(file),
        Err(message) => {
            let span = SourceSpan::single_position(SourcePosition::new(1, 1, 0), FileId::new(0));
            diagnostics.push(DiagnosticBuilder::error(message, span).build());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_small_module() {
        let src = r#"
            interface Rect {
                width: i32;
                height: i32;
            }

            function area(this: Rect): i32 {
                return this.width * this.height;
            }

            export function main(): i32 {
                let r: Rect = r;
                return r.area();
            }
        "#;
        let file = parse_source_file("main.kiln", src).unwrap();
        assert_eq!(file.items.len(), 3);
    }

    #[test]
    fn reports_syntax_error_with_file_name() {
        let mut diagnostics = Diagnostics::new();
        let result = parse_into("broken.kiln", "function (: i32 {}", &mut diagnostics);
        assert!(result.is_none());
        assert!(!diagnostics.is_empty());
    }
}
