use std::rc::Rc;

use crate::{
    frontend::expression::BinaryOp,
    runtime::{fault::Fault, state::State, value::Value},
};

/// Metamethod consulted when an arithmetic operand is not a number.
fn arith_event(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "__add",
        BinaryOp::Sub => "__sub",
        BinaryOp::Mul => "__mul",
        BinaryOp::Div => "__div",
        BinaryOp::Mod => "__mod",
        BinaryOp::Pow => "__pow",
        _ => "__unm",
    }
}

/// Floor modulo: the result takes the sign of the divisor.
fn float_mod(a: f64, b: f64) -> f64 {
    let r = a % b;
    if r != 0.0 && (r < 0.0) != (b < 0.0) {
        r + b
    } else {
        r
    }
}

impl State {
    /// Arithmetic on numbers (and numeric strings), falling back to the
    /// operands' metamethods. `Ok(None)` means neither applies; the caller
    /// names the offending operand.
    pub(crate) fn try_arith(
        &mut self,
        op: BinaryOp,
        left: &Value,
        right: &Value,
    ) -> Result<Option<Value>, Fault> {
        if let (Some(a), Some(b)) = (left.to_arith(), right.to_arith()) {
            return self.arith_numbers(op, a, b).map(Some);
        }

        let event = arith_event(op);
        let handler = self
            .metamethod(left, event)
            .or_else(|| self.metamethod(right, event));
        match handler {
            Some(handler) => self
                .call_first(&handler, vec![left.clone(), right.clone()])
                .map(Some),
            None => Ok(None),
        }
    }

    fn arith_numbers(&self, op: BinaryOp, a: Value, b: Value) -> Result<Value, Fault> {
        if let (Value::Integer(a), Value::Integer(b)) = (&a, &b) {
            let (a, b) = (*a, *b);
            match op {
                BinaryOp::Add => return Ok(Value::Integer(a.wrapping_add(b))),
                BinaryOp::Sub => return Ok(Value::Integer(a.wrapping_sub(b))),
                BinaryOp::Mul => return Ok(Value::Integer(a.wrapping_mul(b))),
                BinaryOp::Mod => {
                    if b == 0 {
                        return Err(self.error("attempt to perform 'n%0'"));
                    }
                    let r = a.wrapping_rem(b);
                    let r = if r != 0 && (r ^ b) < 0 { r + b } else { r };
                    return Ok(Value::Integer(r));
                }
                _ => {}
            }
        }

        let (Some(a), Some(b)) = (a.to_number(), b.to_number()) else {
            return Err(self.error("attempt to perform arithmetic on a non-number value"));
        };
        let result = match op {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
            BinaryOp::Mod => float_mod(a, b),
            BinaryOp::Pow => a.powf(b),
            _ => return Err(self.error(format!("unsupported arithmetic operator {}", op.symbol()))),
        };
        Ok(Value::Float(result))
    }

    /// Unary minus with the `__unm` fallback.
    pub(crate) fn try_unm(&mut self, operand: &Value) -> Result<Option<Value>, Fault> {
        match operand.to_arith() {
            Some(Value::Integer(v)) => Ok(Some(Value::Integer(v.wrapping_neg()))),
            Some(Value::Float(v)) => Ok(Some(Value::Float(-v))),
            _ => match self.metamethod(operand, "__unm") {
                Some(handler) => self
                    .call_first(&handler, vec![operand.clone(), operand.clone()])
                    .map(Some),
                None => Ok(None),
            },
        }
    }

    /// `..` on strings and numbers, or `__concat`. Results longer than
    /// `max_string_bytes` raise an out-of-memory fault.
    pub(crate) fn try_concat(&mut self, left: &Value, right: &Value) -> Result<Option<Value>, Fault> {
        if let (Some(a), Some(b)) = (left.to_str(), right.to_str()) {
            if a.len() + b.len() > self.config.max_string_bytes {
                return Err(Fault::out_of_memory());
            }
            let mut joined = String::with_capacity(a.len() + b.len());
            joined.push_str(&a);
            joined.push_str(&b);
            return Ok(Some(Value::String(Rc::from(joined))));
        }

        let handler = self
            .metamethod(left, "__concat")
            .or_else(|| self.metamethod(right, "__concat"));
        match handler {
            Some(handler) => self
                .call_first(&handler, vec![left.clone(), right.clone()])
                .map(Some),
            None => Ok(None),
        }
    }

    /// `#` on strings (byte length) and tables (border).
    pub(crate) fn try_len(&self, operand: &Value) -> Option<Value> {
        match operand {
            Value::String(s) => Some(Value::Integer(s.len() as i64)),
            Value::Table(table) => Some(Value::Integer(table.borrow().len())),
            _ => None,
        }
    }
}
