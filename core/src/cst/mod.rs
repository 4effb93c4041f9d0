//! Concrete syntax tree for GML and its error-tolerant parser.
//!
//! The tree is a set of plain sum types; passes either match on them directly or
//! implement [`visit::Visitor`] and override only the rules they care about.

mod nodes;
pub mod parser;
pub mod visit;

pub use nodes::*;
pub use parser::Parser;

use crate::token::{LexError, ParseError, Position, tokenize};

/// Everything produced from one file's text.
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub file: File,
    pub lex_errors: Vec<LexError>,
    pub syntax_errors: Vec<ParseError>,
}

/// Tokenize and parse `text`. Always yields a tree, however broken the input.
pub fn parse(text: &str) -> ParseResult {
    let lexed = tokenize(text);
    let tokens = lexed.significant();
    let end = Position::start().advanced_by(text);
    let (file, syntax_errors) = Parser::new(&tokens)
        .with_continued_lines(lexed.continued_lines())
        .parse_file(Position::start(), end);
    ParseResult {
        file,
        lex_errors: lexed.errors,
        syntax_errors,
    }
}

/// String contents without the quotes (`"a"`, `@"a"`, `@'a'`). Escapes are left as written.
pub fn unquote(text: &str) -> String {
    let body = text.strip_prefix('@').unwrap_or(text);
    let mut chars = body.chars();
    let quote = chars.next();
    let inner = chars.as_str();
    match quote {
        Some(q @ ('"' | '\'')) => inner.strip_suffix(q).unwrap_or(inner).to_string(),
        _ => body.to_string(),
    }
}

#[cfg(test)]
mod parser_test;
#[cfg(test)]
mod recover_test;
