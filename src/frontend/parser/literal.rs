use std::rc::Rc;

use crate::frontend::{
    expression::{Expression, FunctionBody, TableField},
    precedence::Precedence,
    token_type::TokenType,
};

use super::Parser;

impl Parser {
    pub(super) fn parse_integer(&mut self) -> Option<Expression> {
        let literal = self.current_token.literal.as_str();

        if let Some(hex) = literal
            .strip_prefix("0x")
            .or_else(|| literal.strip_prefix("0X"))
        {
            // Hex literals wrap around like the reference interpreter does
            return match u64::from_str_radix(hex, 16) {
                Ok(value) => Some(Expression::Integer {
                    value: value as i64,
                }),
                Err(_) => {
                    self.error_near_current("malformed number");
                    None
                }
            };
        }

        match literal.parse::<i64>() {
            Ok(value) => Some(Expression::Integer { value }),
            // Too large for an integer: falls back to a float
            Err(_) => match literal.parse::<f64>() {
                Ok(value) => Some(Expression::Float { value }),
                Err(_) => {
                    self.error_near_current("malformed number");
                    None
                }
            },
        }
    }

    pub(super) fn parse_float(&mut self) -> Option<Expression> {
        match self.current_token.literal.parse::<f64>() {
            Ok(value) => Some(Expression::Float { value }),
            Err(_) => {
                self.error_near_current("malformed number");
                None
            }
        }
    }

    pub(super) fn parse_string(&mut self) -> Option<Expression> {
        Some(Expression::String {
            value: self.current_token.literal.as_str().into(),
        })
    }

    /// `'{' [field {sep field} [sep]] '}'`, starting on `{`.
    pub(super) fn parse_table(&mut self) -> Option<Expression> {
        let position = self.current_token.position;
        let mut fields = Vec::new();

        loop {
            if self.is_peek_token(TokenType::RBrace) {
                self.next_token();
                break;
            }
            self.next_token();
            fields.push(self.parse_table_field()?);

            if self.is_peek_token(TokenType::Comma) || self.is_peek_token(TokenType::Semicolon) {
                self.next_token();
                continue;
            }
            if !self.expect_peek(TokenType::RBrace) {
                return None;
            }
            break;
        }

        Some(Expression::Table { fields, position })
    }

    fn parse_table_field(&mut self) -> Option<TableField> {
        match self.current_token.token_type {
            TokenType::LBracket => {
                self.next_token();
                let key = self.parse_expression(Precedence::Lowest)?;
                if !self.expect_peek(TokenType::RBracket) || !self.expect_peek(TokenType::Assign) {
                    return None;
                }
                self.next_token();
                let value = self.parse_expression(Precedence::Lowest)?;
                Some(TableField::Keyed { key, value })
            }
            TokenType::Ident if self.is_peek_token(TokenType::Assign) => {
                let name = self.current_token.literal.clone();
                self.next_token();
                self.next_token();
                let value = self.parse_expression(Precedence::Lowest)?;
                Some(TableField::Named { name, value })
            }
            _ => Some(TableField::Positional(
                self.parse_expression(Precedence::Lowest)?,
            )),
        }
    }

    /// `'(' parlist ')' block 'end'`; the current token precedes the `(`.
    pub(super) fn parse_function_body(
        &mut self,
        name: String,
        is_method: bool,
    ) -> Option<Rc<FunctionBody>> {
        let position = self.current_token.position;
        if !self.expect_peek(TokenType::LParen) {
            return None;
        }

        let mut parameters = Vec::new();
        if is_method {
            parameters.push(String::from("self"));
        }
        let mut is_vararg = false;

        if self.is_peek_token(TokenType::RParen) {
            self.next_token();
        } else {
            loop {
                self.next_token();
                match self.current_token.token_type {
                    TokenType::Ident => parameters.push(self.current_token.literal.clone()),
                    TokenType::Ellipsis => {
                        is_vararg = true;
                        if !self.expect_peek(TokenType::RParen) {
                            return None;
                        }
                        break;
                    }
                    _ => {
                        self.error_near_current("<name> expected");
                        return None;
                    }
                }
                if self.is_peek_token(TokenType::Comma) {
                    self.next_token();
                    continue;
                }
                if !self.expect_peek(TokenType::RParen) {
                    return None;
                }
                break;
            }
        }

        let enclosing_loops = std::mem::take(&mut self.loop_depth);
        let body = self.parse_block("end");
        self.loop_depth = enclosing_loops;
        let body = body?;
        if !self.expect_closing(TokenType::End, "function", position.line) {
            return None;
        }

        Some(Rc::new(FunctionBody {
            name,
            parameters,
            is_vararg,
            body,
            position,
        }))
    }
}
