use super::{PResult, Parser};
use crate::cst::nodes::{
    ConstructorParent, EnumDeclaration, EnumMember, FunctionExpression, Identifier, MacroDeclaration, Parameter,
    VarDeclaration,
};
use crate::token::TokenKind;

impl<'a> Parser<'a> {
    pub(crate) fn parse_function_expression(&mut self) -> PResult<FunctionExpression> {
        let keyword = self.expect(TokenKind::Function, "`function`")?.span;
        let name = if self.at(TokenKind::Identifier) {
            self.bump().map(|t| Identifier::from_token(&t))
        } else {
            None
        };

        let open = self.expect(TokenKind::LParen, "`(`")?;
        let mut params = Vec::new();
        while !self.eof() && !self.at(TokenKind::RParen) {
            let param_name = self.expect_identifier()?;
            let default = if self.eat(TokenKind::Assign).is_some() {
                Some(self.parse_expression()?)
            } else {
                None
            };
            params.push(Parameter {
                name: param_name,
                default,
            });
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::RParen, "`)`")?;
        let params_span = self.span_from(open.span);

        let parent = if self.eat(TokenKind::Colon).is_some() {
            let parent_name = self.expect_identifier()?;
            let args = self.parse_arguments()?;
            Some(ConstructorParent {
                name: parent_name,
                args,
            })
        } else {
            None
        };
        let is_constructor = self.eat(TokenKind::Constructor).is_some();
        let body = self.parse_block()?;

        Ok(FunctionExpression {
            keyword,
            name,
            params,
            params_span,
            parent,
            is_constructor,
            body,
            span: self.span_from(keyword),
        })
    }

    /// `a = 1, b, c = f()` after `var` or `static`.
    pub(super) fn parse_var_declarations(&mut self) -> PResult<Vec<VarDeclaration>> {
        let mut decls = Vec::new();
        loop {
            let name = self.expect_identifier()?;
            let value = if self.eat(TokenKind::Assign).is_some() {
                Some(self.parse_expression()?)
            } else {
                None
            };
            decls.push(VarDeclaration { name, value });
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        Ok(decls)
    }

    pub(super) fn parse_enum(&mut self) -> PResult<EnumDeclaration> {
        let start = self.expect(TokenKind::Enum, "`enum`")?.span;
        let name = self.expect_identifier()?;
        self.expect(TokenKind::Begin, "`{`")?;
        let mut members = Vec::new();
        while !self.eof() && !self.at(TokenKind::End) {
            let member = self.expect_identifier()?;
            let value = if self.eat(TokenKind::Assign).is_some() {
                Some(self.parse_expression()?)
            } else {
                None
            };
            members.push(EnumMember { name: member, value });
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect_soft(TokenKind::End, "`}`");
        Ok(EnumDeclaration {
            name,
            members,
            span: self.span_from(start),
        })
    }

    /// The macro value is every token on the name's line, continued onto the next
    /// line while a line ends in `\`. It is parsed as an expression when possible;
    /// arbitrary token soup is legal GML and is kept as `None`.
    pub(super) fn parse_macro(&mut self) -> PResult<MacroDeclaration> {
        self.expect(TokenKind::Macro, "`#macro`")?;
        let mut config = None;
        let mut name = self.expect_identifier()?;
        if self.at(TokenKind::Colon) && self.peek_nth_kind(1) == Some(TokenKind::Identifier) {
            self.bump();
            config = Some(name);
            name = self.expect_identifier()?;
        }

        let mut line = name.span.start.line;
        let value_start = self.pos;
        let mut value_end = self.pos;
        while value_end < self.len {
            let next = self.tokens[value_end].span.start.line;
            if next == line {
                value_end += 1;
            } else if next == line + 1 && self.continued_lines.binary_search(&line).is_ok() {
                line = next;
            } else {
                break;
            }
        }
        let value_tokens = &self.tokens[value_start..value_end];
        let value = if value_tokens.is_empty() {
            None
        } else {
            let mut sub = Parser::new(value_tokens);
            match sub.parse_expression() {
                Ok(expr) => {
                    sub.eat(TokenKind::Semicolon);
                    (sub.eof() && sub.errors.is_empty()).then_some(expr)
                }
                Err(_) => None,
            }
        };
        if value_end > value_start {
            self.pos = value_end;
            self.last_end = self.tokens[value_end - 1].span.end;
        }
        Ok(MacroDeclaration { config, name, value })
    }
}
