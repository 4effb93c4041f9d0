use crate::token::{ParseError, Position, Token};

use super::nodes::File;

mod declarations;
mod expressions;
mod helpers;
mod program;
mod statements;

pub(crate) type PResult<T> = std::result::Result<T, ParseError>;

/// Recursive-descent parser over the significant tokens of one file.
///
/// Hard errors (`Err`) unwind to the nearest statement list, which records them and
/// resynchronizes; soft errors (a missing `)` or member name) are pushed to `errors`
/// directly and parsing carries on with a best-effort node.
pub struct Parser<'a> {
    pub(crate) tokens: &'a [Token],
    pub(crate) pos: usize,
    pub(crate) len: usize,
    pub(crate) last_end: Position,
    pub(crate) errors: Vec<ParseError>,
    /// Lines ending in a `\` continuation, ascending.
    pub(crate) continued_lines: Vec<u32>,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        let len = tokens.len();
        Self {
            tokens,
            pos: 0,
            len,
            last_end: tokens.first().map(|t| t.span.start).unwrap_or_else(Position::start),
            errors: Vec::new(),
            continued_lines: Vec::new(),
        }
    }

    pub fn with_continued_lines(mut self, lines: Vec<u32>) -> Self {
        self.continued_lines = lines;
        self
    }

    /// Parse the whole token stream. Never fails: problems come back as errors.
    pub fn parse_file(mut self, start: Position, end: Position) -> (File, Vec<ParseError>) {
        let statements = self.parse_statement_list(&[]);
        let file = File {
            statements,
            span: crate::token::Span::new(start, end),
        };
        (file, self.errors)
    }
}
