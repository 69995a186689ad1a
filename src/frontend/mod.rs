pub mod block;
pub mod expression;
pub mod lexer;
pub mod parser;
pub mod position;
pub mod precedence;
pub mod statement;
pub mod syntax_error;
pub mod token;
pub mod token_type;

pub use block::{Block, Chunk};
pub use position::Position;
pub use syntax_error::SyntaxError;
pub use token::Token;
pub use token_type::TokenType;

pub type Identifier = String;

/// Lexes and parses `source` as a chunk called `chunk_name`.
pub fn parse_chunk(source: &str, chunk_name: &str) -> Result<Chunk, SyntaxError> {
    let lexer = lexer::Lexer::new(source);
    let mut parser = parser::Parser::new(lexer);
    parser.parse_chunk(chunk_name)
}
