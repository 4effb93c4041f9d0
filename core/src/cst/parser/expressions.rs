use super::{PResult, Parser};
use crate::cst::nodes::{
    AccessorHead, AccessorSuffix, Expression, FunctionArguments, Identifier, IdentifierAccessor, IndexKind,
    LiteralKind, StructEntry, TemplatePart,
};
use crate::cst::unquote;
use crate::token::{ParseError, Span, Token, TokenKind};

/// Binding power of binary operators; higher binds tighter.
/// `=` inside an expression is equality, as in `if (a = b)`.
fn binary_precedence(kind: TokenKind) -> Option<u8> {
    Some(match kind {
        TokenKind::NullishCoalesce => 1,
        TokenKind::Or => 2,
        TokenKind::Xor => 3,
        TokenKind::And => 4,
        TokenKind::Eq
        | TokenKind::Ne
        | TokenKind::Lt
        | TokenKind::Le
        | TokenKind::Gt
        | TokenKind::Ge
        | TokenKind::Assign => 5,
        TokenKind::BitOr => 6,
        TokenKind::BitXor => 7,
        TokenKind::BitAnd => 8,
        TokenKind::Shl | TokenKind::Shr => 9,
        TokenKind::Add | TokenKind::Sub => 10,
        TokenKind::Mul | TokenKind::Div | TokenKind::Mod | TokenKind::IntDiv => 11,
        _ => return None,
    })
}

fn is_word(token: &Token) -> bool {
    token.kind == TokenKind::Identifier
        || (token.kind.is_keyword() && token.text.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_'))
}

impl<'a> Parser<'a> {
    pub(crate) fn parse_expression(&mut self) -> PResult<Expression> {
        let lhs = self.parse_unary()?;
        self.parse_expression_tail(lhs)
    }

    /// Statement-level expression: the only place `=` assigns.
    pub(crate) fn parse_expression_statement(&mut self) -> PResult<Expression> {
        let lhs = self.parse_unary()?;
        match self.peek_kind() {
            Some(kind) if kind.is_assignment() => {
                let operator = self.bump().ok_or_else(|| self.unexpected("assignment operator"))?;
                if !matches!(lhs, Expression::Accessor(_)) {
                    self.errors.push(ParseError::with_span(
                        "Invalid assignment target".to_string(),
                        lhs.span(),
                    ));
                }
                let value = self.parse_expression()?;
                Ok(Expression::Assignment {
                    target: Box::new(lhs),
                    operator,
                    value: Box::new(value),
                })
            }
            _ => self.parse_expression_tail(lhs),
        }
    }

    fn parse_expression_tail(&mut self, lhs: Expression) -> PResult<Expression> {
        let condition = self.parse_binary_tail(lhs, 0)?;
        if self.eat(TokenKind::Question).is_none() {
            return Ok(condition);
        }
        let if_true = self.parse_expression()?;
        self.expect(TokenKind::Colon, "`:`")?;
        let if_false = self.parse_expression()?;
        Ok(Expression::Ternary {
            condition: Box::new(condition),
            if_true: Box::new(if_true),
            if_false: Box::new(if_false),
        })
    }

    fn parse_binary_tail(&mut self, mut left: Expression, min_prec: u8) -> PResult<Expression> {
        while let Some(prec) = self.peek_kind().and_then(binary_precedence) {
            if prec < min_prec {
                break;
            }
            let operator = self.bump().ok_or_else(|| self.unexpected("operator"))?;
            let mut right = self.parse_unary()?;
            while let Some(next) = self.peek_kind().and_then(binary_precedence) {
                if next <= prec {
                    break;
                }
                right = self.parse_binary_tail(right, next)?;
            }
            left = Expression::Binary {
                left: Box::new(left),
                operator,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> PResult<Expression> {
        match self.peek_kind() {
            Some(
                TokenKind::Not
                | TokenKind::Sub
                | TokenKind::Add
                | TokenKind::BitNot
                | TokenKind::Increment
                | TokenKind::Decrement,
            ) => {
                let operator = self.bump().ok_or_else(|| self.unexpected("operator"))?;
                let operand = self.parse_unary()?;
                Ok(Expression::Unary {
                    operator,
                    operand: Box::new(operand),
                })
            }
            _ => {
                let expr = self.parse_primary()?;
                if self.at_any(&[TokenKind::Increment, TokenKind::Decrement]) {
                    let operator = self.bump().ok_or_else(|| self.unexpected("operator"))?;
                    return Ok(Expression::Postfix {
                        operand: Box::new(expr),
                        operator,
                    });
                }
                Ok(expr)
            }
        }
    }

    fn parse_primary(&mut self) -> PResult<Expression> {
        let Some(kind) = self.peek_kind() else {
            return Err(self.unexpected("expression"));
        };
        let literal = match kind {
            TokenKind::Real
            | TokenKind::Hex
            | TokenKind::Binary
            | TokenKind::NaN
            | TokenKind::Infinity
            | TokenKind::Pi => Some(LiteralKind::Real),
            TokenKind::True | TokenKind::False => Some(LiteralKind::Bool),
            TokenKind::Undefined => Some(LiteralKind::Undefined),
            TokenKind::PointerNull | TokenKind::PointerInvalid => Some(LiteralKind::Pointer),
            _ => None,
        };
        if let Some(lit) = literal {
            let token = self.bump().ok_or_else(|| self.unexpected("literal"))?;
            return Ok(Expression::Literal { kind: lit, token });
        }

        match kind {
            TokenKind::StringLiteral | TokenKind::MultilineDouble | TokenKind::MultilineSingle => {
                let token = self.bump().ok_or_else(|| self.unexpected("string"))?;
                Ok(Expression::Str(token))
            }
            TokenKind::TemplateStart => self.parse_template(),
            TokenKind::Identifier
            | TokenKind::Global
            | TokenKind::SelfKw
            | TokenKind::Other
            | TokenKind::All
            | TokenKind::Noone => Ok(Expression::Accessor(Box::new(self.parse_accessor(None)?))),
            TokenKind::New => {
                let new_kw = self.bump().map(|t| t.span);
                if !self.at(TokenKind::Identifier) {
                    return Err(self.unexpected("constructor name"));
                }
                Ok(Expression::Accessor(Box::new(self.parse_accessor(new_kw)?)))
            }
            TokenKind::LParen => {
                let open = self.bump().map(|t| t.span).unwrap_or_else(|| self.empty_span());
                let inner = self.parse_expression()?;
                self.expect_soft(TokenKind::RParen, "`)`");
                Ok(Expression::Paren {
                    inner: Box::new(inner),
                    span: self.span_from(open),
                })
            }
            TokenKind::LBracket => self.parse_array_literal(),
            TokenKind::Begin => self.parse_struct_literal(),
            TokenKind::Function => Ok(Expression::Function(Box::new(self.parse_function_expression()?))),
            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_accessor(&mut self, new_kw: Option<Span>) -> PResult<IdentifierAccessor> {
        let head_token = self.bump().ok_or_else(|| self.unexpected("identifier"))?;
        let head_kind = match head_token.kind {
            TokenKind::Global => AccessorHead::Global,
            TokenKind::SelfKw => AccessorHead::SelfKw,
            TokenKind::Other => AccessorHead::Other,
            TokenKind::All => AccessorHead::All,
            TokenKind::Noone => AccessorHead::Noone,
            _ => AccessorHead::Identifier,
        };
        let head = Identifier::from_token(&head_token);
        let start = new_kw.unwrap_or(head.span);

        let mut suffixes = Vec::new();
        loop {
            match self.peek_kind() {
                Some(TokenKind::Dot) => {
                    let dot = self.bump().map(|t| t.span).unwrap_or_else(|| self.empty_span());
                    let name = match self.peek() {
                        Some(t) if t.kind == TokenKind::Identifier => self.bump().map(|t| Identifier::from_token(&t)),
                        Some(t) if is_word(t) && t.span.start.line == dot.start.line => {
                            self.bump().map(|t| Identifier::from_token(&t))
                        }
                        _ => {
                            self.errors
                                .push(ParseError::with_span("Expected identifier after `.`".to_string(), dot));
                            None
                        }
                    };
                    suffixes.push(AccessorSuffix::Dot { dot, name });
                }
                Some(kind) if kind.is_index_open() => {
                    let open = self.bump().map(|t| t.span).unwrap_or_else(|| self.empty_span());
                    let index_kind = IndexKind::from_token(kind).unwrap_or(IndexKind::Array);
                    let mut args = Vec::new();
                    while !self.eof() && !self.at(TokenKind::RBracket) {
                        args.push(self.parse_expression()?);
                        if self.eat(TokenKind::Comma).is_none() {
                            break;
                        }
                    }
                    self.expect_soft(TokenKind::RBracket, "`]`");
                    suffixes.push(AccessorSuffix::Index {
                        kind: index_kind,
                        args,
                        span: self.span_from(open),
                    });
                }
                Some(TokenKind::LParen) => suffixes.push(AccessorSuffix::Call(self.parse_arguments()?)),
                _ => break,
            }
        }

        Ok(IdentifierAccessor {
            new_kw,
            head_kind,
            head,
            suffixes,
            span: self.span_from(start),
        })
    }

    /// `(a, , b)`: every slot between delimiters becomes an argument, empty ones as `None`.
    pub(crate) fn parse_arguments(&mut self) -> PResult<FunctionArguments> {
        let open = self.expect(TokenKind::LParen, "`(`")?;
        let mut delimiters = vec![open.span];
        let mut args = Vec::new();
        loop {
            if self.eof() || self.at_any(&[TokenKind::Comma, TokenKind::RParen]) {
                args.push(None);
            } else {
                args.push(Some(self.parse_expression()?));
            }
            match self.peek_kind() {
                Some(TokenKind::Comma) => {
                    if let Some(comma) = self.bump() {
                        delimiters.push(comma.span);
                    }
                }
                Some(TokenKind::RParen) => {
                    if let Some(close) = self.bump() {
                        delimiters.push(close.span);
                    }
                    break;
                }
                _ => {
                    let err = self.unexpected("`)`");
                    self.errors.push(err);
                    delimiters.push(self.empty_span());
                    break;
                }
            }
        }
        Ok(FunctionArguments {
            args,
            delimiters,
            span: self.span_from(open.span),
        })
    }

    fn parse_array_literal(&mut self) -> PResult<Expression> {
        let open = self.expect(TokenKind::LBracket, "`[`")?.span;
        let mut items = Vec::new();
        while !self.eof() && !self.at(TokenKind::RBracket) {
            items.push(self.parse_expression()?);
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect_soft(TokenKind::RBracket, "`]`");
        Ok(Expression::Array {
            items,
            span: self.span_from(open),
        })
    }

    fn parse_struct_literal(&mut self) -> PResult<Expression> {
        let open = self.expect(TokenKind::Begin, "`{`")?.span;
        let mut entries = Vec::new();
        loop {
            let docs = self.take_docs();
            if self.eof() || self.at(TokenKind::End) {
                break;
            }
            let key = match self.peek() {
                Some(t) if is_word(t) => self.bump().map(|t| Identifier::from_token(&t)),
                Some(t) if t.kind == TokenKind::StringLiteral => self.bump().map(|t| Identifier {
                    name: unquote(&t.text),
                    span: t.span,
                }),
                _ => None,
            };
            let Some(key) = key else {
                return Err(self.unexpected("struct key"));
            };
            let value = if self.eat(TokenKind::Colon).is_some() {
                Some(self.parse_expression()?)
            } else {
                None
            };
            entries.push(StructEntry { key, docs, value });
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect_soft(TokenKind::End, "`}`");
        Ok(Expression::Struct {
            entries,
            span: self.span_from(open),
        })
    }

    fn parse_template(&mut self) -> PResult<Expression> {
        let start = self.expect(TokenKind::TemplateStart, "template string")?.span;
        let mut parts = Vec::new();
        loop {
            match self.peek_kind() {
                Some(TokenKind::TemplateText) => {
                    if let Some(text) = self.bump() {
                        parts.push(TemplatePart::Text(text.span));
                    }
                }
                Some(TokenKind::TemplateInterpStart) => {
                    self.bump();
                    if !self.at(TokenKind::TemplateInterpEnd) {
                        parts.push(TemplatePart::Interpolation(self.parse_expression()?));
                    }
                    self.expect_soft(TokenKind::TemplateInterpEnd, "`}`");
                }
                Some(TokenKind::TemplateEnd) => {
                    self.bump();
                    break;
                }
                _ => {
                    let err = self.unexpected("end of template string");
                    self.errors.push(err);
                    break;
                }
            }
        }
        Ok(Expression::Template {
            parts,
            span: self.span_from(start),
        })
    }
}
