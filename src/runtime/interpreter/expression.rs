use std::rc::Rc;

use crate::{
    frontend::expression::{BinaryOp, Expression, TableField, UnaryOp},
    runtime::{
        fault::Fault,
        scope::Scope,
        state::State,
        table::TableRef,
        table_key::TableKey,
        value::Value,
    },
};

use super::Frame;

/// How an operand is named in error messages: `global 'x'`, `local 'x'`,
/// `field 'x'` or nothing.
fn describe(expression: &Expression, scope: &Scope) -> Option<String> {
    match expression {
        Expression::Identifier { name, .. } if scope.lookup(name).is_some() => {
            Some(format!("local '{}'", name))
        }
        Expression::Identifier { name, .. } => Some(format!("global '{}'", name)),
        Expression::Index { index, .. } => match index.as_ref() {
            Expression::String { value } => Some(format!("field '{}'", value)),
            _ => None,
        },
        _ => None,
    }
}

fn operand_message(action: &str, description: Option<String>, value: &Value) -> String {
    match description {
        Some(description) => format!(
            "attempt to {} {} (a {} value)",
            action,
            description,
            value.type_name()
        ),
        None => format!("attempt to {} a {} value", action, value.type_name()),
    }
}

impl State {
    /// Evaluates to exactly one value.
    pub(crate) fn eval(
        &mut self,
        expression: &Expression,
        scope: &Rc<Scope>,
        frame: &Frame,
    ) -> Result<Value, Fault> {
        match expression {
            Expression::Nil => Ok(Value::Nil),
            Expression::Boolean { value } => Ok(Value::Boolean(*value)),
            Expression::Integer { value } => Ok(Value::Integer(*value)),
            Expression::Float { value } => Ok(Value::Float(*value)),
            Expression::String { value } => Ok(Value::String(value.clone())),
            Expression::Vararg { .. } => Ok(frame.varargs.first().cloned().unwrap_or_default()),
            Expression::Identifier { name, position } => match scope.lookup(name) {
                Some(cell) => Ok(cell.borrow().clone()),
                None => {
                    self.set_line(position.line);
                    let env = Value::Table(frame.env.clone());
                    self.index_value(&env, &Value::string(name))
                }
            },
            Expression::Function(body) => Ok(self.make_closure(body, scope, frame)),
            Expression::Table { fields, position } => self.eval_table(fields, position.line, scope, frame),
            Expression::Unary {
                operator,
                right,
                position,
            } => {
                let operand = self.eval(right, scope, frame)?;
                self.set_line(position.line);
                self.eval_unary(*operator, operand, right, scope)
            }
            Expression::Binary { .. } => self.eval_operator_chain(expression, scope, frame),
            Expression::Index {
                left,
                index,
                position,
            } => {
                let target = self.eval(left, scope, frame)?;
                let key = self.eval(index, scope, frame)?;
                self.set_line(position.line);
                self.check_indexable(&target, left, scope)?;
                self.index_value(&target, &key)
            }
            Expression::Call { .. } | Expression::MethodCall { .. } => Ok(self
                .eval_multi(expression, scope, frame)?
                .into_iter()
                .next()
                .unwrap_or_default()),
            Expression::Paren { expression } => self.eval(expression, scope, frame),
        }
    }

    /// Evaluates keeping every value of calls and `...`.
    pub(crate) fn eval_multi(
        &mut self,
        expression: &Expression,
        scope: &Rc<Scope>,
        frame: &Frame,
    ) -> Result<Vec<Value>, Fault> {
        match expression {
            Expression::Vararg { .. } => Ok(frame.varargs.clone()),
            Expression::Call {
                function,
                arguments,
                position,
            } => {
                let callee = self.eval(function, scope, frame)?;
                let args = self.eval_list(arguments, scope, frame)?;
                self.set_line(position.line);
                if !self.is_callable(&callee) {
                    return Err(self.error(operand_message(
                        "call",
                        describe(function, scope),
                        &callee,
                    )));
                }
                self.call_value(&callee, args)
            }
            Expression::MethodCall {
                object,
                method,
                arguments,
                position,
            } => {
                let target = self.eval(object, scope, frame)?;
                self.set_line(position.line);
                self.check_indexable(&target, object, scope)?;
                let callee = self.index_value(&target, &Value::string(method))?;

                let mut args = Vec::with_capacity(arguments.len() + 1);
                args.push(target);
                args.extend(self.eval_list(arguments, scope, frame)?);
                self.set_line(position.line);
                if !self.is_callable(&callee) {
                    return Err(self.error(operand_message(
                        "call",
                        Some(format!("method '{}'", method)),
                        &callee,
                    )));
                }
                self.call_value(&callee, args)
            }
            _ => Ok(vec![self.eval(expression, scope, frame)?]),
        }
    }

    /// Evaluates an expression list; only the last expression may expand.
    pub(crate) fn eval_list(
        &mut self,
        expressions: &[Expression],
        scope: &Rc<Scope>,
        frame: &Frame,
    ) -> Result<Vec<Value>, Fault> {
        let mut values = Vec::with_capacity(expressions.len());
        for (i, expression) in expressions.iter().enumerate() {
            if i + 1 == expressions.len() && expression.is_multi_valued() {
                values.extend(self.eval_multi(expression, scope, frame)?);
            } else {
                values.push(self.eval(expression, scope, frame)?);
            }
        }
        Ok(values)
    }

    pub(super) fn check_indexable(&self, target: &Value, expression: &Expression, scope: &Scope) -> Result<(), Fault> {
        if matches!(target, Value::Table(_)) {
            return Ok(());
        }
        Err(self.error(operand_message("index", describe(expression, scope), target)))
    }

    fn eval_table(
        &mut self,
        fields: &[TableField],
        line: usize,
        scope: &Rc<Scope>,
        frame: &Frame,
    ) -> Result<Value, Fault> {
        let table = TableRef::new();
        let mut next_index = 1;

        for (i, field) in fields.iter().enumerate() {
            match field {
                TableField::Positional(expression) => {
                    let values = if i + 1 == fields.len() && expression.is_multi_valued() {
                        self.eval_multi(expression, scope, frame)?
                    } else {
                        vec![self.eval(expression, scope, frame)?]
                    };
                    for value in values {
                        table.set(TableKey::Integer(next_index), value);
                        next_index += 1;
                    }
                }
                TableField::Named { name, value } => {
                    let value = self.eval(value, scope, frame)?;
                    table.set_str(name, value);
                }
                TableField::Keyed { key, value } => {
                    let key = self.eval(key, scope, frame)?;
                    let value = self.eval(value, scope, frame)?;
                    self.set_line(line);
                    let key = TableKey::from_value(&key).map_err(|e| self.error(e.message()))?;
                    table.set(key, value);
                }
            }
        }
        Ok(Value::Table(table))
    }

    fn eval_unary(
        &mut self,
        operator: UnaryOp,
        operand: Value,
        expression: &Expression,
        scope: &Scope,
    ) -> Result<Value, Fault> {
        match operator {
            UnaryOp::Not => Ok(Value::Boolean(!operand.is_truthy())),
            UnaryOp::Neg => match self.try_unm(&operand)? {
                Some(value) => Ok(value),
                None => Err(self.error(operand_message(
                    "perform arithmetic on",
                    describe(expression, scope),
                    &operand,
                ))),
            },
            UnaryOp::Len => match self.try_len(&operand) {
                Some(value) => Ok(value),
                None => Err(self.error(operand_message(
                    "get length of",
                    describe(expression, scope),
                    &operand,
                ))),
            },
        }
    }

    /// Folds a left-nested run of binary operators (`a + b + c ...`)
    /// innermost first, without recursing along the left operands.
    fn eval_operator_chain(
        &mut self,
        expression: &Expression,
        scope: &Rc<Scope>,
        frame: &Frame,
    ) -> Result<Value, Fault> {
        let mut spine = Vec::new();
        let mut innermost = expression;
        while let Expression::Binary {
            left,
            operator,
            right,
            position,
        } = innermost
        {
            spine.push((left.as_ref(), *operator, right.as_ref(), position.line));
            innermost = left.as_ref();
        }

        let mut acc = self.eval(innermost, scope, frame)?;
        for (left, operator, right, line) in spine.into_iter().rev() {
            acc = self.eval_binary(acc, left, operator, right, line, scope, frame)?;
        }
        Ok(acc)
    }

    #[allow(clippy::too_many_arguments)]
    fn eval_binary(
        &mut self,
        lhs: Value,
        left: &Expression,
        operator: BinaryOp,
        right: &Expression,
        line: usize,
        scope: &Rc<Scope>,
        frame: &Frame,
    ) -> Result<Value, Fault> {
        match operator {
            BinaryOp::And if !lhs.is_truthy() => return Ok(lhs),
            BinaryOp::Or if lhs.is_truthy() => return Ok(lhs),
            BinaryOp::And | BinaryOp::Or => return self.eval(right, scope, frame),
            _ => {}
        }

        let rhs = self.eval(right, scope, frame)?;
        self.set_line(line);
        match operator {
            BinaryOp::Eq => Ok(Value::Boolean(self.values_equal(&lhs, &rhs)?)),
            BinaryOp::NotEq => Ok(Value::Boolean(!self.values_equal(&lhs, &rhs)?)),
            BinaryOp::Lt => Ok(Value::Boolean(self.less_than(&lhs, &rhs)?)),
            BinaryOp::Gt => Ok(Value::Boolean(self.less_than(&rhs, &lhs)?)),
            BinaryOp::Lte => Ok(Value::Boolean(self.less_equal(&lhs, &rhs)?)),
            BinaryOp::Gte => Ok(Value::Boolean(self.less_equal(&rhs, &lhs)?)),
            BinaryOp::Concat => match self.try_concat(&lhs, &rhs)? {
                Some(value) => Ok(value),
                None => {
                    let (culprit, value) = if lhs.to_str().is_none() {
                        (left, &lhs)
                    } else {
                        (right, &rhs)
                    };
                    Err(self.error(operand_message(
                        "concatenate",
                        describe(culprit, scope),
                        value,
                    )))
                }
            },
            _ => match self.try_arith(operator, &lhs, &rhs)? {
                Some(value) => Ok(value),
                None => {
                    let (culprit, value) = if lhs.to_arith().is_none() {
                        (left, &lhs)
                    } else {
                        (right, &rhs)
                    };
                    Err(self.error(operand_message(
                        "perform arithmetic on",
                        describe(culprit, scope),
                        value,
                    )))
                }
            },
        }
    }
}
