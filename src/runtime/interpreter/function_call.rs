use std::rc::Rc;

use log::trace;

use crate::runtime::{
    closure::Closure,
    fault::Fault,
    function::Function,
    scope::Scope,
    state::{Location, State},
    value::Value,
};

use super::{Flow, Frame};

impl State {
    /// Calls `callee` with `args`, honouring `__call`.
    pub(crate) fn call_value(&mut self, callee: &Value, args: Vec<Value>) -> Result<Vec<Value>, Fault> {
        match callee {
            Value::Function(function) => self.call_function(function, args),
            _ => match self.metamethod(callee, "__call") {
                Some(handler) => {
                    let mut forwarded = Vec::with_capacity(args.len() + 1);
                    forwarded.push(callee.clone());
                    forwarded.extend(args);
                    self.call_value(&handler, forwarded)
                }
                None => Err(self.error(format!("attempt to call a {} value", callee.type_name()))),
            },
        }
    }

    /// First result of a call, `nil` if there is none.
    pub(crate) fn call_first(&mut self, callee: &Value, args: Vec<Value>) -> Result<Value, Fault> {
        Ok(self.call_value(callee, args)?.into_iter().next().unwrap_or_default())
    }

    pub(crate) fn is_callable(&self, value: &Value) -> bool {
        matches!(value, Value::Function(_)) || self.metamethod(value, "__call").is_some()
    }

    fn call_function(&mut self, function: &Rc<Function>, args: Vec<Value>) -> Result<Vec<Value>, Fault> {
        if self.call_depth >= self.config.max_call_depth {
            return Err(self.error("stack overflow"));
        }

        self.call_depth += 1;
        trace!("call {} (depth {})", function.name(), self.call_depth);
        let result = match function.as_ref() {
            Function::Builtin(builtin) => (builtin.func)(self, args),
            Function::Closure(closure) => self.call_closure(closure, args),
        };
        self.call_depth -= 1;
        result
    }

    fn call_closure(&mut self, closure: &Closure, args: Vec<Value>) -> Result<Vec<Value>, Fault> {
        let body = closure.body.clone();
        let scope = Scope::child(&closure.upvalues);

        let mut args = args.into_iter();
        for parameter in &body.parameters {
            scope.declare(parameter, args.next().unwrap_or_default());
        }
        let frame = Frame {
            env: closure.env.borrow().clone(),
            varargs: if body.is_vararg { args.collect() } else { Vec::new() },
        };

        let caller = self.swap_location(Location {
            chunk: closure.chunk.clone(),
            line: body.position.line,
        });
        let flow = self.exec_statements(&body.body, &scope, &frame);
        self.location = caller;

        match flow? {
            Flow::Return(values) => Ok(values),
            Flow::Normal | Flow::Break => Ok(Vec::new()),
        }
    }
}
