use std::{cell::RefCell, rc::Rc};

use crate::{frontend::Identifier, runtime::value::Value};

pub type Cell = Rc<RefCell<Value>>;

/// Lexical scope: one per block activation.
///
/// Every local lives in its own shared cell so closures capture variables,
/// not values. Redeclaring a name in the same block shadows the earlier cell.
#[derive(Debug, Default)]
pub struct Scope {
    vars: RefCell<Vec<(Identifier, Cell)>>,
    parent: Option<Rc<Scope>>,
}

impl Scope {
    pub fn root() -> Rc<Scope> {
        Rc::new(Scope::default())
    }

    pub fn child(parent: &Rc<Scope>) -> Rc<Scope> {
        Rc::new(Scope {
            vars: RefCell::new(Vec::new()),
            parent: Some(parent.clone()),
        })
    }

    pub fn declare(&self, name: &str, value: Value) {
        self.vars
            .borrow_mut()
            .push((name.to_string(), Rc::new(RefCell::new(value))));
    }

    /// Finds the innermost cell bound to `name`.
    pub fn lookup(&self, name: &str) -> Option<Cell> {
        let mut scope = self;
        loop {
            if let Some((_, cell)) = scope.vars.borrow().iter().rev().find(|(n, _)| n == name) {
                return Some(cell.clone());
            }
            scope = scope.parent.as_deref()?;
        }
    }

    pub fn parent(&self) -> Option<&Rc<Scope>> {
        self.parent.as_ref()
    }

    pub fn cells(&self) -> Vec<Cell> {
        self.vars.borrow().iter().map(|(_, cell)| cell.clone()).collect()
    }
}
