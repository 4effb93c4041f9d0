use super::Parser;
use crate::cst::nodes::{Statement, StatementKind};
use crate::token::{Span, TokenKind};

impl<'a> Parser<'a> {
    /// Parse statements until one of `stop` (not consumed) or end of input.
    /// Failed statements are recorded and skipped so the rest of the list still parses.
    pub(crate) fn parse_statement_list(&mut self, stop: &[TokenKind]) -> Vec<Statement> {
        let mut statements = Vec::new();

        loop {
            if self.eof() || self.at_any(stop) {
                // Docs with nothing to attach to are kept so `@globalvar` still registers
                let docs = self.take_docs();
                if !docs.is_empty() {
                    let span = docs[0].span.to(docs[docs.len() - 1].span);
                    statements.push(Statement {
                        docs,
                        kind: StatementKind::Empty,
                        span,
                    });
                }
                break;
            }

            let before = self.pos;
            match self.parse_statement() {
                Ok(stmt) => statements.push(stmt),
                Err(err) => {
                    self.errors.push(err);
                    self.recover(stop);
                }
            }
            if self.pos == before {
                // Always make progress
                self.bump();
            }
        }

        statements
    }

    /// Skip to the next plausible statement boundary: just past a `;` at depth 0, or
    /// before a `}` that closes the enclosing block. The caller guarantees progress.
    fn recover(&mut self, stop: &[TokenKind]) {
        let mut paren: i32 = 0;
        let mut bracket: i32 = 0;
        let mut brace: i32 = 0;
        while let Some(kind) = self.peek_kind() {
            match kind {
                TokenKind::LParen => paren += 1,
                TokenKind::RParen => paren = (paren - 1).max(0),
                k if k.is_index_open() => bracket += 1,
                TokenKind::RBracket => bracket = (bracket - 1).max(0),
                TokenKind::Begin => brace += 1,
                TokenKind::End => {
                    if brace == 0 {
                        return;
                    }
                    brace -= 1;
                    if brace == 0 && paren == 0 && bracket == 0 {
                        self.bump();
                        return;
                    }
                }
                TokenKind::Semicolon if paren == 0 && bracket == 0 && brace == 0 => {
                    self.bump();
                    return;
                }
                k if stop.contains(&k) && brace == 0 => return,
                _ => {}
            }
            self.bump();
        }
    }

    pub(super) fn empty_span(&self) -> Span {
        Span::single(self.last_end)
    }
}
