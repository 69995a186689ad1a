use crate::frontend::{
    expression::{BinaryOp, Expression, UnaryOp},
    precedence::{Precedence, rhs_precedence_for_infix},
    token_type::TokenType,
};

use super::Parser;

impl Parser {
    // Core expression parsing
    pub(super) fn parse_expression(&mut self, precedence: Precedence) -> Option<Expression> {
        if !self.enter_level() {
            return None;
        }
        let level = self.level;
        let expression = self.parse_operator_chain(precedence);
        self.level = level - 1;
        expression
    }

    /// Left-associative operators fold in this loop; only right operands
    /// nest another `parse_expression`.
    fn parse_operator_chain(&mut self, precedence: Precedence) -> Option<Expression> {
        let mut left = self.parse_prefix()?;

        while precedence < self.peek_precedence() {
            self.next_token();
            left = self.parse_infix(left)?;
        }

        Some(left)
    }

    pub(super) fn parse_prefix(&mut self) -> Option<Expression> {
        match self.current_token.token_type {
            TokenType::Nil => Some(Expression::Nil),
            TokenType::True => Some(Expression::Boolean { value: true }),
            TokenType::False => Some(Expression::Boolean { value: false }),
            TokenType::Int => self.parse_integer(),
            TokenType::Float => self.parse_float(),
            TokenType::String => self.parse_string(),
            TokenType::Ellipsis => Some(Expression::Vararg {
                position: self.current_token.position,
            }),
            TokenType::Function => {
                let body = self.parse_function_body(String::from("anonymous"), false)?;
                Some(Expression::Function(body))
            }
            TokenType::LBrace => self.parse_table(),
            TokenType::Not | TokenType::Minus | TokenType::Hash => self.parse_unary_expression(),
            TokenType::Ident | TokenType::LParen => self.parse_suffixed_expression(),
            TokenType::UnterminatedString => {
                let message = format!("unfinished string near '{}'", self.current_token.literal);
                self.push_error(message);
                None
            }
            TokenType::MalformedNumber => {
                self.error_near_current("malformed number");
                None
            }
            TokenType::EscapeTooLarge => {
                self.error_near_current("decimal escape too large");
                None
            }
            _ => {
                self.error_near_current("unexpected symbol");
                None
            }
        }
    }

    pub(super) fn parse_infix(&mut self, left: Expression) -> Option<Expression> {
        let position = self.current_token.position;
        let token_type = self.current_token.token_type;
        let operator = match token_type {
            TokenType::Plus => BinaryOp::Add,
            TokenType::Minus => BinaryOp::Sub,
            TokenType::Asterisk => BinaryOp::Mul,
            TokenType::Slash => BinaryOp::Div,
            TokenType::Percent => BinaryOp::Mod,
            TokenType::Caret => BinaryOp::Pow,
            TokenType::Concat => BinaryOp::Concat,
            TokenType::Eq => BinaryOp::Eq,
            TokenType::NotEq => BinaryOp::NotEq,
            TokenType::Lt => BinaryOp::Lt,
            TokenType::Lte => BinaryOp::Lte,
            TokenType::Gt => BinaryOp::Gt,
            TokenType::Gte => BinaryOp::Gte,
            TokenType::And => BinaryOp::And,
            TokenType::Or => BinaryOp::Or,
            _ => {
                self.error_near_current("unexpected symbol");
                return None;
            }
        };

        let precedence = rhs_precedence_for_infix(&token_type).unwrap_or(Precedence::Lowest);
        self.next_token();
        let right = self.parse_expression(precedence)?;

        Some(Expression::Binary {
            left: Box::new(left),
            operator,
            right: Box::new(right),
            position,
        })
    }

    fn parse_unary_expression(&mut self) -> Option<Expression> {
        let position = self.current_token.position;
        let operator = match self.current_token.token_type {
            TokenType::Not => UnaryOp::Not,
            TokenType::Hash => UnaryOp::Len,
            _ => UnaryOp::Neg,
        };
        self.next_token();
        let right = self.parse_expression(Precedence::Prefix)?;

        // Fold negated numeric literals
        if operator == UnaryOp::Neg {
            match right {
                Expression::Integer { value } => {
                    return Some(Expression::Integer {
                        value: value.wrapping_neg(),
                    });
                }
                Expression::Float { value } => return Some(Expression::Float { value: -value }),
                _ => {}
            }
        }

        Some(Expression::Unary {
            operator,
            right: Box::new(right),
            position,
        })
    }

    /// `primaryexp { '.' Name | '[' exp ']' | ':' Name args | args }`
    pub(super) fn parse_suffixed_expression(&mut self) -> Option<Expression> {
        let level = self.level;
        let expression = self.parse_suffixes();
        self.level = level;
        expression
    }

    // Every suffix nests the tree one level deeper.
    fn parse_suffixes(&mut self) -> Option<Expression> {
        let mut expression = self.parse_primary_expression()?;

        loop {
            let position = self.peek_token.position;
            let is_suffix = matches!(
                self.peek_token.token_type,
                TokenType::Dot
                    | TokenType::LBracket
                    | TokenType::Colon
                    | TokenType::LParen
                    | TokenType::String
                    | TokenType::LBrace
            );
            if is_suffix && !self.enter_level() {
                return None;
            }
            match self.peek_token.token_type {
                TokenType::Dot => {
                    self.next_token();
                    if !self.expect_peek(TokenType::Ident) {
                        return None;
                    }
                    expression = Expression::Index {
                        left: Box::new(expression),
                        index: Box::new(Expression::String {
                            value: self.current_token.literal.as_str().into(),
                        }),
                        position,
                    };
                }
                TokenType::LBracket => {
                    self.next_token();
                    self.next_token();
                    let index = self.parse_expression(Precedence::Lowest)?;
                    if !self.expect_peek(TokenType::RBracket) {
                        return None;
                    }
                    expression = Expression::Index {
                        left: Box::new(expression),
                        index: Box::new(index),
                        position,
                    };
                }
                TokenType::Colon => {
                    self.next_token();
                    if !self.expect_peek(TokenType::Ident) {
                        return None;
                    }
                    let method = self.current_token.literal.clone();
                    let call_position = self.current_token.position;
                    if !matches!(
                        self.peek_token.token_type,
                        TokenType::LParen | TokenType::String | TokenType::LBrace
                    ) {
                        self.peek_error(TokenType::LParen);
                        return None;
                    }
                    let arguments = self.parse_call_arguments()?;
                    expression = Expression::MethodCall {
                        object: Box::new(expression),
                        method,
                        arguments,
                        position: call_position,
                    };
                }
                TokenType::LParen | TokenType::String | TokenType::LBrace => {
                    let arguments = self.parse_call_arguments()?;
                    expression = Expression::Call {
                        function: Box::new(expression),
                        arguments,
                        position,
                    };
                }
                _ => return Some(expression),
            }
        }
    }

    fn parse_primary_expression(&mut self) -> Option<Expression> {
        match self.current_token.token_type {
            TokenType::Ident => Some(Expression::Identifier {
                name: self.current_token.literal.clone(),
                position: self.current_token.position,
            }),
            TokenType::LParen => {
                self.next_token();
                let expression = self.parse_expression(Precedence::Lowest)?;
                if !self.expect_peek(TokenType::RParen) {
                    return None;
                }
                Some(Expression::Paren {
                    expression: Box::new(expression),
                })
            }
            _ => {
                self.error_near_current("unexpected symbol");
                None
            }
        }
    }

    /// Arguments after a callee; `peek_token` is `(`, a string or `{`.
    fn parse_call_arguments(&mut self) -> Option<Vec<Expression>> {
        self.next_token();
        match self.current_token.token_type {
            TokenType::String => Some(vec![self.parse_string()?]),
            TokenType::LBrace => Some(vec![self.parse_table()?]),
            _ => {
                if self.is_peek_token(TokenType::RParen) {
                    self.next_token();
                    return Some(Vec::new());
                }
                self.next_token();
                let arguments = self.parse_expression_list()?;
                if !self.expect_peek(TokenType::RParen) {
                    return None;
                }
                Some(arguments)
            }
        }
    }
}
