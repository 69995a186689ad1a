use std::rc::Rc;

use crate::{
    frontend::{
        block::Block,
        expression::{Expression, FunctionBody},
        statement::Statement,
    },
    runtime::{
        closure::Closure,
        fault::Fault,
        function::Function,
        scope::{Cell, Scope},
        state::State,
        value::{Value, float_to_integer},
    },
};

use super::{Flow, Frame};

/// Resolved left-hand side of an assignment.
enum Place {
    Local(Cell),
    Global(Rc<str>),
    Field { target: Value, key: Value },
}

/// Loop control for `for i = start, limit, step`.
enum NumericRange {
    Integer { start: i64, limit: i64, step: i64 },
    Float { start: f64, limit: f64, step: f64 },
}

impl State {
    /// Runs `block` in a fresh scope nested in `parent`.
    pub(crate) fn exec_block(
        &mut self,
        block: &Block,
        parent: &Rc<Scope>,
        frame: &Frame,
    ) -> Result<Flow, Fault> {
        let scope = Scope::child(parent);
        self.exec_statements(block, &scope, frame)
    }

    /// Runs `block` directly in `scope`.
    pub(crate) fn exec_statements(
        &mut self,
        block: &Block,
        scope: &Rc<Scope>,
        frame: &Frame,
    ) -> Result<Flow, Fault> {
        for statement in &block.statements {
            match self.exec_statement(statement, scope, frame)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_statement(
        &mut self,
        statement: &Statement,
        scope: &Rc<Scope>,
        frame: &Frame,
    ) -> Result<Flow, Fault> {
        match statement {
            Statement::Local { names, values } => {
                let mut values = self.eval_list(values, scope, frame)?.into_iter();
                for name in names {
                    scope.declare(name, values.next().unwrap_or_default());
                }
                Ok(Flow::Normal)
            }
            Statement::LocalFunction { name, function } => {
                scope.declare(name, Value::Nil);
                let closure = self.make_closure(function, scope, frame);
                if let Some(cell) = scope.lookup(name) {
                    *cell.borrow_mut() = closure;
                }
                Ok(Flow::Normal)
            }
            Statement::Assign { targets, values } => {
                self.exec_assign(targets, values, scope, frame)?;
                Ok(Flow::Normal)
            }
            Statement::Expression { expression } => {
                self.eval_multi(expression, scope, frame)?;
                Ok(Flow::Normal)
            }
            Statement::Return { values } => Ok(Flow::Return(self.eval_list(values, scope, frame)?)),
            Statement::Break => Ok(Flow::Break),
            Statement::If {
                branches,
                alternative,
            } => {
                for (condition, body) in branches {
                    if self.eval(condition, scope, frame)?.is_truthy() {
                        return self.exec_block(body, scope, frame);
                    }
                }
                match alternative {
                    Some(body) => self.exec_block(body, scope, frame),
                    None => Ok(Flow::Normal),
                }
            }
            Statement::While { condition, body } => {
                while self.eval(condition, scope, frame)?.is_truthy() {
                    match self.exec_block(body, scope, frame)? {
                        Flow::Normal => {}
                        Flow::Break => break,
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }
                Ok(Flow::Normal)
            }
            Statement::Repeat { body, condition } => {
                loop {
                    // The condition sees the body's locals.
                    let inner = Scope::child(scope);
                    match self.exec_statements(body, &inner, frame)? {
                        Flow::Normal => {}
                        Flow::Break => break,
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                    if self.eval(condition, &inner, frame)?.is_truthy() {
                        break;
                    }
                }
                Ok(Flow::Normal)
            }
            Statement::NumericFor {
                variable,
                start,
                limit,
                step,
                body,
            } => self.exec_numeric_for(variable, start, limit, step.as_ref(), body, scope, frame),
            Statement::GenericFor {
                names,
                expressions,
                body,
            } => self.exec_generic_for(names, expressions, body, scope, frame),
            Statement::Do { body } => self.exec_block(body, scope, frame),
        }
    }

    pub(super) fn make_closure(&self, body: &Rc<FunctionBody>, scope: &Rc<Scope>, frame: &Frame) -> Value {
        let closure = Closure::new(
            body.clone(),
            scope.clone(),
            frame.env.clone(),
            self.location.chunk.clone(),
        );
        Value::Function(Rc::new(Function::Closure(closure)))
    }

    fn exec_assign(
        &mut self,
        targets: &[Expression],
        values: &[Expression],
        scope: &Rc<Scope>,
        frame: &Frame,
    ) -> Result<(), Fault> {
        let mut places = Vec::with_capacity(targets.len());
        for target in targets {
            let place = match target {
                Expression::Identifier { name, .. } => match scope.lookup(name) {
                    Some(cell) => Place::Local(cell),
                    None => Place::Global(Rc::from(name.as_str())),
                },
                Expression::Index {
                    left,
                    index,
                    position,
                } => {
                    let target = self.eval(left, scope, frame)?;
                    let key = self.eval(index, scope, frame)?;
                    self.set_line(position.line);
                    self.check_indexable(&target, left, scope)?;
                    Place::Field { target, key }
                }
                _ => return Err(self.error("cannot assign to this expression")),
            };
            places.push(place);
        }

        let mut values = self.eval_list(values, scope, frame)?.into_iter();
        for place in places {
            let value = values.next().unwrap_or_default();
            match place {
                Place::Local(cell) => *cell.borrow_mut() = value,
                Place::Global(name) => {
                    let env = Value::Table(frame.env.clone());
                    self.set_index(&env, Value::String(name), value)?;
                }
                Place::Field { target, key } => self.set_index(&target, key, value)?,
            }
        }
        Ok(())
    }

    fn for_number(&self, value: Value, what: &str) -> Result<Value, Fault> {
        match value.to_arith() {
            Some(number) => Ok(number),
            None => Err(self.error(format!("'for' {} must be a number", what))),
        }
    }

    fn numeric_range(&self, start: Value, limit: Value, step: Value) -> Result<NumericRange, Fault> {
        let start = self.for_number(start, "initial value")?;
        let limit = self.for_number(limit, "limit")?;
        let step = self.for_number(step, "step")?;

        if let (Value::Integer(start), Value::Integer(step)) = (&start, &step) {
            if *step == 0 {
                return Err(self.error("'for' step is zero"));
            }
            let limit = match limit {
                Value::Integer(limit) => limit,
                Value::Float(limit) => {
                    let clamped = if *step > 0 { limit.floor() } else { limit.ceil() };
                    float_to_integer(clamped).unwrap_or(if clamped > 0.0 { i64::MAX } else { i64::MIN })
                }
                _ => 0,
            };
            return Ok(NumericRange::Integer {
                start: *start,
                limit,
                step: *step,
            });
        }

        let (Some(start), Some(limit), Some(step)) = (start.to_number(), limit.to_number(), step.to_number())
        else {
            return Err(self.error("'for' initial value must be a number"));
        };
        if step == 0.0 {
            return Err(self.error("'for' step is zero"));
        }
        Ok(NumericRange::Float { start, limit, step })
    }

    #[allow(clippy::too_many_arguments)]
    fn exec_numeric_for(
        &mut self,
        variable: &str,
        start: &Expression,
        limit: &Expression,
        step: Option<&Expression>,
        body: &Block,
        scope: &Rc<Scope>,
        frame: &Frame,
    ) -> Result<Flow, Fault> {
        let start = self.eval(start, scope, frame)?;
        let limit = self.eval(limit, scope, frame)?;
        let step = match step {
            Some(step) => self.eval(step, scope, frame)?,
            None => Value::Integer(1),
        };

        match self.numeric_range(start, limit, step)? {
            NumericRange::Integer { start, limit, step } => {
                let mut i = start;
                while (step > 0 && i <= limit) || (step < 0 && i >= limit) {
                    match self.run_iteration(&[(variable, Value::Integer(i))], body, scope, frame)? {
                        Flow::Normal => {}
                        Flow::Break => break,
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                    match i.checked_add(step) {
                        Some(next) => i = next,
                        None => break,
                    }
                }
            }
            NumericRange::Float { start, limit, step } => {
                let mut i = start;
                while (step > 0.0 && i <= limit) || (step < 0.0 && i >= limit) {
                    match self.run_iteration(&[(variable, Value::Float(i))], body, scope, frame)? {
                        Flow::Normal => {}
                        Flow::Break => break,
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                    i += step;
                }
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_generic_for(
        &mut self,
        names: &[String],
        expressions: &[Expression],
        body: &Block,
        scope: &Rc<Scope>,
        frame: &Frame,
    ) -> Result<Flow, Fault> {
        let mut values = self.eval_list(expressions, scope, frame)?.into_iter();
        let iterator = values.next().unwrap_or_default();
        let state = values.next().unwrap_or_default();
        let mut control = values.next().unwrap_or_default();

        loop {
            let results = self.call_value(&iterator, vec![state.clone(), control.clone()])?;
            let first = results.first().cloned().unwrap_or_default();
            if first.is_nil() {
                break;
            }
            control = first;

            let mut results = results.into_iter();
            let bindings: Vec<(&str, Value)> = names
                .iter()
                .map(|name| (name.as_str(), results.next().unwrap_or_default()))
                .collect();
            match self.run_iteration(&bindings, body, scope, frame)? {
                Flow::Normal => {}
                Flow::Break => break,
                flow @ Flow::Return(_) => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    /// One loop iteration with fresh copies of the loop variables.
    fn run_iteration(
        &mut self,
        bindings: &[(&str, Value)],
        body: &Block,
        parent: &Rc<Scope>,
        frame: &Frame,
    ) -> Result<Flow, Fault> {
        let scope = Scope::child(parent);
        for (name, value) in bindings {
            scope.declare(name, value.clone());
        }
        self.exec_statements(body, &scope, frame)
    }
}
