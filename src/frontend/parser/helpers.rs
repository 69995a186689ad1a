use crate::frontend::{
    block::Block,
    expression::Expression,
    precedence::{Precedence, token_precedence},
    statement::Statement,
    syntax_error::SyntaxError,
    token_type::TokenType,
};

use super::{MAX_SYNTAX_LEVELS, Parser};

impl Parser {
    // Token navigation
    pub(super) fn next_token(&mut self) {
        self.current_token = self.peek_token.clone();
        self.peek_token = self.lexer.next_token();
    }

    pub(super) fn is_current_token(&self, token_type: TokenType) -> bool {
        self.current_token.token_type == token_type
    }

    pub(super) fn is_peek_token(&self, token_type: TokenType) -> bool {
        self.peek_token.token_type == token_type
    }

    pub(super) fn expect_peek(&mut self, token_type: TokenType) -> bool {
        if self.is_peek_token(token_type) {
            self.next_token();
            true
        } else {
            self.peek_error(token_type);
            false
        }
    }

    pub(super) fn peek_precedence(&self) -> Precedence {
        token_precedence(&self.peek_token.token_type)
    }

    // Blocks

    /// Parses the block that follows the current token; leaves `current_token`
    /// on whatever closed the block.
    pub(super) fn parse_block(&mut self, terminator: &str) -> Option<Block> {
        if !self.enter_level() {
            return None;
        }
        self.next_token();
        let block = self.parse_block_from_current(terminator);
        self.leave_level();
        if self.errors.is_empty() {
            Some(block)
        } else {
            None
        }
    }

    /// Body of a `while`, `repeat` or `for`: `break` is legal inside.
    pub(super) fn parse_loop_body(&mut self, terminator: &str) -> Option<Block> {
        self.loop_depth += 1;
        let body = self.parse_block(terminator);
        self.loop_depth -= 1;
        body
    }

    pub(super) fn parse_block_from_current(&mut self, terminator: &str) -> Block {
        let mut statements = Vec::new();

        while !self.current_token.token_type.ends_block() && self.errors.is_empty() {
            if self.is_current_token(TokenType::Semicolon) {
                self.next_token();
                continue;
            }

            let Some(statement) = self.parse_statement() else {
                break;
            };
            let is_return = matches!(statement, Statement::Return { .. });
            statements.push(statement);
            self.next_token();

            // `return` must be the last statement of a block
            if is_return && !self.current_token.token_type.ends_block() {
                self.error_expected_current(terminator);
                break;
            }
        }

        Block { statements }
    }

    /// Checks that the current token closes a construct opened at `line`.
    pub(super) fn expect_closing(&mut self, closing: TokenType, opener: &str, line: usize) -> bool {
        if self.is_current_token(closing) {
            return true;
        }
        if self.errors.is_empty() {
            let message = if line == self.current_token.position.line {
                format!(
                    "'{}' expected near {}",
                    closing,
                    self.current_token.near()
                )
            } else {
                format!(
                    "'{}' expected (to close '{}' at line {}) near {}",
                    closing,
                    opener,
                    line,
                    self.current_token.near()
                )
            };
            self.push_error(message);
        }
        false
    }

    // Nesting

    pub(super) fn enter_level(&mut self) -> bool {
        if self.level >= MAX_SYNTAX_LEVELS {
            if self.errors.is_empty() {
                self.push_error(String::from("chunk has too many syntax levels"));
            }
            return false;
        }
        self.level += 1;
        true
    }

    pub(super) fn leave_level(&mut self) {
        self.level -= 1;
    }

    // Lists

    /// `exp {',' exp}` starting at the current token.
    pub(super) fn parse_expression_list(&mut self) -> Option<Vec<Expression>> {
        let mut list = vec![self.parse_expression(Precedence::Lowest)?];

        while self.is_peek_token(TokenType::Comma) {
            self.next_token();
            self.next_token();
            list.push(self.parse_expression(Precedence::Lowest)?);
        }

        Some(list)
    }

    /// `Name {',' Name}` starting at the current token.
    pub(super) fn parse_name_list(&mut self) -> Option<Vec<String>> {
        let mut names = vec![self.expect_current_name()?];

        while self.is_peek_token(TokenType::Comma) {
            self.next_token();
            if !self.expect_peek(TokenType::Ident) {
                return None;
            }
            names.push(self.current_token.literal.clone());
        }

        Some(names)
    }

    pub(super) fn expect_current_name(&mut self) -> Option<String> {
        if self.is_current_token(TokenType::Ident) {
            Some(self.current_token.literal.clone())
        } else {
            self.push_error(format!("<name> expected near {}", self.current_token.near()));
            None
        }
    }

    // Error handling
    pub(super) fn push_error(&mut self, message: String) {
        let position = self.current_token.position;
        self.errors
            .push(SyntaxError::new(self.chunk_name.clone(), position, message));
    }

    pub(super) fn error_near_current(&mut self, message: &str) {
        let message = format!("{} near {}", message, self.current_token.near());
        self.push_error(message);
    }

    pub(super) fn error_expected_current(&mut self, expected: &str) {
        let message = format!("'{}' expected near {}", expected, self.current_token.near());
        self.push_error(message);
    }

    pub(super) fn peek_error(&mut self, expected: TokenType) {
        let expected = match expected {
            TokenType::Ident => String::from("<name>"),
            other => format!("'{}'", other),
        };
        let message = format!("{} expected near {}", expected, self.peek_token.near());
        self.errors.push(SyntaxError::new(
            self.chunk_name.clone(),
            self.peek_token.position,
            message,
        ));
    }
}
