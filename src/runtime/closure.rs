use std::{cell::RefCell, fmt, rc::Rc};

use crate::{
    frontend::expression::FunctionBody,
    runtime::{leak_detector, scope::Scope, table::TableRef},
};

/// A script function: shared body, the scope it closed over and the
/// environment table its free names resolve through.
pub struct Closure {
    pub body: Rc<FunctionBody>,
    pub upvalues: Rc<Scope>,
    pub env: RefCell<TableRef>,
    pub chunk: Rc<str>,
}

impl Closure {
    pub fn new(body: Rc<FunctionBody>, upvalues: Rc<Scope>, env: TableRef, chunk: Rc<str>) -> Self {
        leak_detector::record_closure();
        Self {
            body,
            upvalues,
            env: RefCell::new(env),
            chunk,
        }
    }
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Closure({}:{})", self.chunk, self.body.name)
    }
}
