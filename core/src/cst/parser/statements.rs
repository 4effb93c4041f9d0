use super::{PResult, Parser};
use crate::cst::nodes::{Block, CatchClause, Identifier, Statement, StatementKind, SwitchCase};
use crate::token::TokenKind;

impl<'a> Parser<'a> {
    pub(crate) fn parse_statement(&mut self) -> PResult<Statement> {
        let docs = self.take_docs();
        let start = self.current_span();
        let kind = match self.peek_kind() {
            None => return Err(self.unexpected("statement")),
            Some(TokenKind::Semicolon) => {
                self.bump();
                StatementKind::Empty
            }
            Some(TokenKind::Begin) => StatementKind::Block(self.parse_block()?),
            Some(TokenKind::Function) if self.peek_nth_kind(1) == Some(TokenKind::Identifier) => {
                let func = self.parse_function_expression()?;
                self.eat(TokenKind::Semicolon);
                StatementKind::Function(Box::new(func))
            }
            Some(TokenKind::Var) => {
                self.bump();
                let decls = self.parse_var_declarations()?;
                self.eat(TokenKind::Semicolon);
                StatementKind::LocalVar(decls)
            }
            Some(TokenKind::Static) => {
                self.bump();
                let decls = self.parse_var_declarations()?;
                self.eat(TokenKind::Semicolon);
                StatementKind::StaticVar(decls)
            }
            Some(TokenKind::GlobalVar) => {
                self.bump();
                let mut names = vec![self.expect_identifier()?];
                while self.eat(TokenKind::Comma).is_some() {
                    names.push(self.expect_identifier()?);
                }
                self.eat(TokenKind::Semicolon);
                StatementKind::GlobalVar(names)
            }
            Some(TokenKind::If) => self.parse_if()?,
            Some(TokenKind::Try) => self.parse_try()?,
            Some(TokenKind::While) => {
                self.bump();
                let condition = self.parse_expression()?;
                self.eat(TokenKind::Do);
                let body = Box::new(self.parse_statement()?);
                StatementKind::While { condition, body }
            }
            Some(TokenKind::For) => self.parse_for()?,
            Some(TokenKind::Do) => {
                self.bump();
                let body = Box::new(self.parse_statement()?);
                self.expect(TokenKind::Until, "`until`")?;
                let condition = self.parse_expression()?;
                self.eat(TokenKind::Semicolon);
                StatementKind::DoUntil { body, condition }
            }
            Some(TokenKind::Repeat) => {
                self.bump();
                let count = self.parse_expression()?;
                let body = Box::new(self.parse_statement()?);
                StatementKind::Repeat { count, body }
            }
            Some(TokenKind::Switch) => self.parse_switch()?,
            Some(TokenKind::With) => {
                self.bump();
                let target = self.parse_expression()?;
                let body = Box::new(self.parse_statement()?);
                StatementKind::With { target, body }
            }
            Some(TokenKind::Enum) => StatementKind::Enum(self.parse_enum()?),
            Some(TokenKind::Macro) => StatementKind::Macro(self.parse_macro()?),
            Some(TokenKind::Return) => {
                self.bump();
                let value = if self.at_any(&[TokenKind::Semicolon, TokenKind::End]) || self.eof() {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                self.eat(TokenKind::Semicolon);
                StatementKind::Return(value)
            }
            Some(TokenKind::Throw) => {
                self.bump();
                let value = self.parse_expression()?;
                self.eat(TokenKind::Semicolon);
                StatementKind::Throw(value)
            }
            Some(TokenKind::Delete) => {
                self.bump();
                let value = self.parse_expression()?;
                self.eat(TokenKind::Semicolon);
                StatementKind::Delete(value)
            }
            Some(kind @ (TokenKind::Break | TokenKind::Continue | TokenKind::Exit)) => {
                self.bump();
                self.eat(TokenKind::Semicolon);
                match kind {
                    TokenKind::Break => StatementKind::Break,
                    TokenKind::Continue => StatementKind::Continue,
                    _ => StatementKind::Exit,
                }
            }
            Some(_) => {
                let expr = self.parse_expression_statement()?;
                self.eat(TokenKind::Semicolon);
                StatementKind::Expression(expr)
            }
        };
        Ok(Statement {
            docs,
            kind,
            span: self.span_from(start),
        })
    }

    pub(crate) fn parse_block(&mut self) -> PResult<Block> {
        let open = self.expect(TokenKind::Begin, "`{`")?;
        let statements = self.parse_statement_list(&[TokenKind::End]);
        self.expect_soft(TokenKind::End, "`}`");
        Ok(Block {
            statements,
            span: self.span_from(open.span),
        })
    }

    fn parse_if(&mut self) -> PResult<StatementKind> {
        self.bump();
        let condition = self.parse_expression()?;
        self.eat(TokenKind::Then);
        let then_branch = Box::new(self.parse_statement()?);
        let else_branch = if self.eat(TokenKind::Else).is_some() {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(StatementKind::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn parse_try(&mut self) -> PResult<StatementKind> {
        self.bump();
        let body = self.parse_block()?;
        let catch = if self.eat(TokenKind::Catch).is_some() {
            let binding = if self.eat(TokenKind::LParen).is_some() {
                let name = self.expect_identifier()?;
                self.expect_soft(TokenKind::RParen, "`)`");
                Some(name)
            } else if self.at(TokenKind::Identifier) {
                self.bump().map(|t| Identifier::from_token(&t))
            } else {
                None
            };
            Some(CatchClause {
                binding,
                body: self.parse_block()?,
            })
        } else {
            None
        };
        let finally = if self.eat(TokenKind::Finally).is_some() {
            Some(self.parse_block()?)
        } else {
            None
        };
        Ok(StatementKind::Try { body, catch, finally })
    }

    fn parse_for(&mut self) -> PResult<StatementKind> {
        self.bump();
        self.expect(TokenKind::LParen, "`(`")?;
        let init = if self.at(TokenKind::Semicolon) {
            None
        } else {
            Some(Box::new(self.parse_simple_statement()?))
        };
        self.expect(TokenKind::Semicolon, "`;`")?;
        let condition = if self.at(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(TokenKind::Semicolon, "`;`")?;
        let update = if self.at(TokenKind::RParen) {
            None
        } else {
            Some(Box::new(self.parse_simple_statement()?))
        };
        self.expect(TokenKind::RParen, "`)`")?;
        let body = Box::new(self.parse_statement()?);
        Ok(StatementKind::For {
            init,
            condition,
            update,
            body,
        })
    }

    /// `var` declaration or expression statement, without the trailing `;` (for-loop headers).
    fn parse_simple_statement(&mut self) -> PResult<Statement> {
        let start = self.current_span();
        let kind = if self.eat(TokenKind::Var).is_some() {
            StatementKind::LocalVar(self.parse_var_declarations()?)
        } else {
            StatementKind::Expression(self.parse_expression_statement()?)
        };
        Ok(Statement {
            docs: Vec::new(),
            kind,
            span: self.span_from(start),
        })
    }

    fn parse_switch(&mut self) -> PResult<StatementKind> {
        let start = self.current_span();
        self.bump();
        let discriminant = self.parse_expression()?;
        self.expect(TokenKind::Begin, "`{`")?;
        let mut cases = Vec::new();
        let stops = [TokenKind::Case, TokenKind::Default, TokenKind::End];
        while !self.eof() && !self.at(TokenKind::End) {
            let case_start = self.current_span();
            let test = match self.peek_kind() {
                Some(TokenKind::Case) => {
                    self.bump();
                    Some(self.parse_expression()?)
                }
                Some(TokenKind::Default) => {
                    self.bump();
                    None
                }
                _ => return Err(self.unexpected("`case` or `default`")),
            };
            self.expect(TokenKind::Colon, "`:`")?;
            let body = self.parse_statement_list(&stops);
            cases.push(SwitchCase {
                test,
                body,
                span: self.span_from(case_start),
            });
        }
        self.expect_soft(TokenKind::End, "`}`");
        Ok(StatementKind::Switch {
            discriminant,
            cases,
            span: self.span_from(start),
        })
    }
}
