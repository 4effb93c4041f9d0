use super::{PResult, Parser};
use crate::cst::nodes::Identifier;
use crate::token::{ParseError, Span, Token, TokenKind};

impl<'a> Parser<'a> {
    /// Index of the next token that is not a doc comment.
    fn next_index(&self) -> usize {
        let mut i = self.pos;
        while i < self.len && self.tokens[i].kind.is_jsdoc() {
            i += 1;
        }
        i
    }

    pub(super) fn eof(&self) -> bool {
        self.next_index() >= self.len
    }

    pub(super) fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.next_index())
    }

    pub(super) fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    /// Kind of the `n`-th significant token ahead (0 is the current one).
    pub(super) fn peek_nth_kind(&self, n: usize) -> Option<TokenKind> {
        self.tokens[self.pos.min(self.len)..]
            .iter()
            .filter(|t| !t.kind.is_jsdoc())
            .nth(n)
            .map(|t| t.kind)
    }

    pub(super) fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    pub(super) fn at_any(&self, kinds: &[TokenKind]) -> bool {
        self.peek_kind().is_some_and(|k| kinds.contains(&k))
    }

    pub(super) fn bump(&mut self) -> Option<Token> {
        let i = self.next_index();
        let token = self.tokens.get(i).cloned()?;
        self.pos = i + 1;
        self.last_end = token.span.end;
        Some(token)
    }

    pub(super) fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.at(kind) { self.bump() } else { None }
    }

    pub(super) fn expect(&mut self, kind: TokenKind, what: &str) -> PResult<Token> {
        if self.at(kind) {
            if let Some(token) = self.bump() {
                return Ok(token);
            }
        }
        Err(self.unexpected(what))
    }

    /// Like [`Parser::expect`] but records the problem and keeps going.
    pub(super) fn expect_soft(&mut self, kind: TokenKind, what: &str) -> Option<Token> {
        match self.expect(kind, what) {
            Ok(token) => Some(token),
            Err(err) => {
                self.errors.push(err);
                None
            }
        }
    }

    pub(super) fn expect_identifier(&mut self) -> PResult<Identifier> {
        let token = self.expect(TokenKind::Identifier, "identifier")?;
        Ok(Identifier::from_token(&token))
    }

    /// Doc comment tokens sitting at the cursor.
    pub(super) fn take_docs(&mut self) -> Vec<Token> {
        let mut docs = Vec::new();
        while self.pos < self.len && self.tokens[self.pos].kind.is_jsdoc() {
            docs.push(self.tokens[self.pos].clone());
            self.pos += 1;
        }
        docs
    }

    pub(super) fn current_span(&self) -> Span {
        match self.peek() {
            Some(token) => token.span,
            None => Span::single(self.last_end),
        }
    }

    pub(super) fn span_from(&self, start: Span) -> Span {
        if self.last_end.offset < start.start.offset {
            return Span::single(start.start);
        }
        Span::new(start.start, self.last_end)
    }

    pub(super) fn unexpected(&self, what: &str) -> ParseError {
        match self.peek() {
            Some(token) => ParseError::with_span(format!("Expected {}, found `{}`", what, token.text), token.span),
            None => ParseError::with_span(
                format!("Expected {}, found end of input", what),
                Span::single(self.last_end),
            ),
        }
    }
}
