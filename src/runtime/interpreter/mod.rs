//! Tree-walking evaluator over the parsed chunk.
//!
//! Local variables live in [`Scope`] cells captured by closures; globals are
//! fields of the running function's environment table. Every call restores
//! the call depth and current location on both the success and the error
//! path, so a fault can unwind through any number of frames.
use crate::runtime::{
    fault::Fault,
    state::{Location, State},
    table::TableRef,
    value::Value,
};

mod binary_ops;
mod comparison_ops;
mod dispatch;
mod expression;
mod function_call;
mod index_ops;

#[cfg(test)]
mod binary_ops_test;
#[cfg(test)]
mod comparison_ops_test;
#[cfg(test)]
mod dispatch_test;

/// Per-call context shared by every block of one function activation.
pub(crate) struct Frame {
    pub env: TableRef,
    pub varargs: Vec<Value>,
}

/// How a block finished.
pub(crate) enum Flow {
    Normal,
    Break,
    Return(Vec<Value>),
}

/// Longest `__index` / `__newindex` chain followed before giving up.
pub(crate) const MAX_META_CHAIN: usize = 100;

impl State {
    /// Runtime error prefixed with the location of the running code.
    pub(crate) fn error(&self, message: impl AsRef<str>) -> Fault {
        Fault::runtime(format!("{}{}", self.where_prefix(), message.as_ref()))
    }

    /// `chunk:line: ` for script code, empty on the host side.
    pub(crate) fn where_prefix(&self) -> String {
        if self.location.line == 0 {
            String::new()
        } else {
            format!("{}:{}: ", self.location.chunk, self.location.line)
        }
    }

    pub(crate) fn set_line(&mut self, line: usize) {
        if line > 0 {
            self.location.line = line;
        }
    }

    pub(crate) fn swap_location(&mut self, location: Location) -> Location {
        std::mem::replace(&mut self.location, location)
    }
}
