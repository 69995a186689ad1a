use std::rc::Rc;

use crate::frontend::{
    block::Chunk,
    expression::FunctionBody,
    lexer::Lexer,
    position::Position,
    syntax_error::SyntaxError,
    token::Token,
    token_type::TokenType,
};

mod expression;
mod helpers;
mod literal;
mod statement;

/// Nesting limit for expressions, suffix chains and blocks.
pub const MAX_SYNTAX_LEVELS: usize = 200;

/// Recursive-descent parser with a Pratt loop for binary operators.
///
/// Parse functions start on the first token of their construct and leave
/// `current_token` on its last token. The first syntax error stops parsing.
pub struct Parser {
    pub(super) lexer: Lexer,
    pub(super) current_token: Token,
    pub(super) peek_token: Token,
    pub errors: Vec<SyntaxError>,
    pub(super) chunk_name: String,
    /// Loops enclosing the current statement inside the current function.
    pub(super) loop_depth: usize,
    /// Current nesting, bounded by `MAX_SYNTAX_LEVELS`.
    pub(super) level: usize,
}

impl Parser {
    pub fn new(lexer: Lexer) -> Self {
        let mut parser = Parser {
            lexer,
            current_token: Token::new(TokenType::Eof, "", 0, 0),
            peek_token: Token::new(TokenType::Eof, "", 0, 0),
            errors: Vec::new(),
            chunk_name: String::from("?"),
            loop_depth: 0,
            level: 0,
        };
        parser.next_token();
        parser.next_token();
        parser
    }

    /// Parses the whole input as the body of a vararg main function.
    pub fn parse_chunk(&mut self, name: &str) -> Result<Chunk, SyntaxError> {
        self.chunk_name = name.to_string();

        let block = self.parse_block_from_current("<eof>");
        if self.errors.is_empty() && !self.is_current_token(TokenType::Eof) {
            self.error_expected_current("<eof>");
        }

        if let Some(error) = self.errors.first() {
            return Err(error.clone());
        }

        Ok(Chunk {
            name: name.to_string(),
            function: Rc::new(FunctionBody {
                name: String::from("main chunk"),
                parameters: Vec::new(),
                is_vararg: true,
                body: block,
                position: Position::new(0, 0),
            }),
        })
    }
}
