use crate::frontend::{
    expression::Expression,
    precedence::Precedence,
    statement::Statement,
    token_type::TokenType,
};

use super::Parser;

impl Parser {
    pub(super) fn parse_statement(&mut self) -> Option<Statement> {
        match self.current_token.token_type {
            TokenType::Local if self.is_peek_token(TokenType::Function) => {
                self.parse_local_function_statement()
            }
            TokenType::Local => self.parse_local_statement(),
            TokenType::Function => self.parse_function_statement(),
            TokenType::Return => self.parse_return_statement(),
            TokenType::Break if self.loop_depth == 0 => {
                self.error_near_current("no loop to break");
                None
            }
            TokenType::Break => Some(Statement::Break),
            TokenType::If => self.parse_if_statement(),
            TokenType::While => self.parse_while_statement(),
            TokenType::Repeat => self.parse_repeat_statement(),
            TokenType::For => self.parse_for_statement(),
            TokenType::Do => {
                let line = self.current_token.position.line;
                let body = self.parse_block("end")?;
                if !self.expect_closing(TokenType::End, "do", line) {
                    return None;
                }
                Some(Statement::Do { body })
            }
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_local_statement(&mut self) -> Option<Statement> {
        self.next_token();
        let names = self.parse_name_list()?;

        let values = if self.is_peek_token(TokenType::Assign) {
            self.next_token();
            self.next_token();
            self.parse_expression_list()?
        } else {
            Vec::new()
        };

        Some(Statement::Local { names, values })
    }

    fn parse_local_function_statement(&mut self) -> Option<Statement> {
        self.next_token(); // `function`
        if !self.expect_peek(TokenType::Ident) {
            return None;
        }
        let name = self.current_token.literal.clone();
        let function = self.parse_function_body(name.clone(), false)?;
        Some(Statement::LocalFunction { name, function })
    }

    /// `function a.b.c:m(...) end` becomes an assignment to `a.b.c.m`.
    fn parse_function_statement(&mut self) -> Option<Statement> {
        if !self.expect_peek(TokenType::Ident) {
            return None;
        }

        let mut full_name = self.current_token.literal.clone();
        let mut target = Expression::Identifier {
            name: self.current_token.literal.clone(),
            position: self.current_token.position,
        };
        let mut is_method = false;

        while self.is_peek_token(TokenType::Dot) || self.is_peek_token(TokenType::Colon) {
            self.next_token();
            is_method = self.is_current_token(TokenType::Colon);
            let separator = if is_method { ':' } else { '.' };
            let position = self.current_token.position;
            if !self.expect_peek(TokenType::Ident) {
                return None;
            }
            full_name.push(separator);
            full_name.push_str(&self.current_token.literal);
            target = Expression::Index {
                left: Box::new(target),
                index: Box::new(Expression::String {
                    value: self.current_token.literal.as_str().into(),
                }),
                position,
            };
            if is_method {
                break;
            }
        }

        let function = self.parse_function_body(full_name, is_method)?;
        Some(Statement::Assign {
            targets: vec![target],
            values: vec![Expression::Function(function)],
        })
    }

    fn parse_return_statement(&mut self) -> Option<Statement> {
        let values = if self.peek_token.token_type.ends_block()
            || self.is_peek_token(TokenType::Semicolon)
        {
            Vec::new()
        } else {
            self.next_token();
            self.parse_expression_list()?
        };

        if self.is_peek_token(TokenType::Semicolon) {
            self.next_token();
        }

        Some(Statement::Return { values })
    }

    fn parse_if_statement(&mut self) -> Option<Statement> {
        let line = self.current_token.position.line;
        let mut branches = Vec::new();
        let mut alternative = None;

        loop {
            // current: `if` or `elseif`
            self.next_token();
            let condition = self.parse_expression(Precedence::Lowest)?;
            if !self.expect_peek(TokenType::Then) {
                return None;
            }
            let block = self.parse_block("end")?;
            branches.push((condition, block));

            match self.current_token.token_type {
                TokenType::Elseif => continue,
                TokenType::Else => {
                    alternative = Some(self.parse_block("end")?);
                    break;
                }
                _ => break,
            }
        }

        if !self.expect_closing(TokenType::End, "if", line) {
            return None;
        }

        Some(Statement::If {
            branches,
            alternative,
        })
    }

    fn parse_while_statement(&mut self) -> Option<Statement> {
        let line = self.current_token.position.line;
        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenType::Do) {
            return None;
        }
        let body = self.parse_loop_body("end")?;
        if !self.expect_closing(TokenType::End, "while", line) {
            return None;
        }
        Some(Statement::While { condition, body })
    }

    fn parse_repeat_statement(&mut self) -> Option<Statement> {
        let line = self.current_token.position.line;
        let body = self.parse_loop_body("until")?;
        if !self.expect_closing(TokenType::Until, "repeat", line) {
            return None;
        }
        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;
        Some(Statement::Repeat { body, condition })
    }

    fn parse_for_statement(&mut self) -> Option<Statement> {
        let line = self.current_token.position.line;
        if !self.expect_peek(TokenType::Ident) {
            return None;
        }

        let statement = if self.is_peek_token(TokenType::Assign) {
            let variable = self.current_token.literal.clone();
            self.next_token();
            self.next_token();
            let start = self.parse_expression(Precedence::Lowest)?;
            if !self.expect_peek(TokenType::Comma) {
                return None;
            }
            self.next_token();
            let limit = self.parse_expression(Precedence::Lowest)?;
            let step = if self.is_peek_token(TokenType::Comma) {
                self.next_token();
                self.next_token();
                Some(self.parse_expression(Precedence::Lowest)?)
            } else {
                None
            };
            if !self.expect_peek(TokenType::Do) {
                return None;
            }
            let body = self.parse_loop_body("end")?;
            Statement::NumericFor {
                variable,
                start,
                limit,
                step,
                body,
            }
        } else {
            let names = self.parse_name_list()?;
            if !self.expect_peek(TokenType::In) {
                return None;
            }
            self.next_token();
            let expressions = self.parse_expression_list()?;
            if !self.expect_peek(TokenType::Do) {
                return None;
            }
            let body = self.parse_loop_body("end")?;
            Statement::GenericFor {
                names,
                expressions,
                body,
            }
        };

        if !self.expect_closing(TokenType::End, "for", line) {
            return None;
        }
        Some(statement)
    }

    /// Either a call statement or an assignment `targets = values`.
    fn parse_expression_statement(&mut self) -> Option<Statement> {
        if !matches!(
            self.current_token.token_type,
            TokenType::Ident | TokenType::LParen
        ) {
            self.error_near_current("unexpected symbol");
            return None;
        }

        let first = self.parse_suffixed_expression()?;

        if self.is_peek_token(TokenType::Assign) || self.is_peek_token(TokenType::Comma) {
            let mut targets = vec![first];
            while self.is_peek_token(TokenType::Comma) {
                self.next_token();
                self.next_token();
                targets.push(self.parse_suffixed_expression()?);
            }
            if targets.iter().any(|t| !t.is_assignable()) {
                self.error_near_current("syntax error");
                return None;
            }
            if !self.expect_peek(TokenType::Assign) {
                return None;
            }
            self.next_token();
            let values = self.parse_expression_list()?;
            return Some(Statement::Assign { targets, values });
        }

        if !first.is_call() {
            self.next_token();
            self.error_near_current("syntax error");
            return None;
        }

        Some(Statement::Expression { expression: first })
    }
}
