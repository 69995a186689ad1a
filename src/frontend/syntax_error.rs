use thiserror::Error;

use crate::frontend::position::Position;

/// A chunk that failed to parse; rendered the way script error messages are.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{chunk}:{}: {message}", position.line)]
pub struct SyntaxError {
    pub chunk: String,
    pub position: Position,
    pub message: String,
}

impl SyntaxError {
    pub fn new(chunk: impl Into<String>, position: Position, message: impl Into<String>) -> Self {
        Self {
            chunk: chunk.into(),
            position,
            message: message.into(),
        }
    }
}
