use std::fmt;
use std::rc::Rc;

use crate::frontend::{expression::FunctionBody, statement::Statement};

#[derive(Debug, Clone, Default)]
pub struct Block {
    pub statements: Vec<Statement>,
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, statement) in self.statements.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", statement)?;
        }
        Ok(())
    }
}

/// A parsed chunk: the body of an implicit vararg function.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub name: String,
    pub function: Rc<FunctionBody>,
}
