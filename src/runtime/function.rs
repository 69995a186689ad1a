use crate::runtime::{builtin_function::BuiltinFunction, closure::Closure, table::TableRef};

/// Anything callable without metamethods.
#[derive(Debug)]
pub enum Function {
    Closure(Closure),
    Builtin(BuiltinFunction),
}

impl Function {
    pub fn name(&self) -> &str {
        match self {
            Function::Closure(closure) => &closure.body.name,
            Function::Builtin(builtin) => builtin.name,
        }
    }

    /// Environment of a script function; builtins have none of their own.
    pub fn env(&self) -> Option<TableRef> {
        match self {
            Function::Closure(closure) => Some(closure.env.borrow().clone()),
            Function::Builtin(_) => None,
        }
    }

    /// Replaces the environment; `false` for builtins.
    pub fn set_env(&self, env: TableRef) -> bool {
        match self {
            Function::Closure(closure) => {
                *closure.env.borrow_mut() = env;
                true
            }
            Function::Builtin(_) => false,
        }
    }
}
