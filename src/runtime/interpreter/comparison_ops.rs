use std::cmp::Ordering;

use crate::runtime::{fault::Fault, state::State, value::Value};

fn compare_primitive(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
        (Value::String(a), Value::String(b)) => Some(a.as_bytes().cmp(b.as_bytes())),
        (Value::Integer(_) | Value::Float(_), Value::Integer(_) | Value::Float(_)) => {
            left.to_number()?.partial_cmp(&right.to_number()?)
        }
        _ => None,
    }
}

fn is_number(value: &Value) -> bool {
    matches!(value, Value::Integer(_) | Value::Float(_))
}

impl State {
    /// `==`: raw equality, then `__eq` when both operands are tables.
    pub(crate) fn values_equal(&mut self, left: &Value, right: &Value) -> Result<bool, Fault> {
        if left.raw_equals(right) {
            return Ok(true);
        }
        if !matches!((left, right), (Value::Table(_), Value::Table(_))) {
            return Ok(false);
        }

        let handler = self
            .metamethod(left, "__eq")
            .or_else(|| self.metamethod(right, "__eq"));
        match handler {
            Some(handler) => Ok(self
                .call_first(&handler, vec![left.clone(), right.clone()])?
                .is_truthy()),
            None => Ok(false),
        }
    }

    /// `<` with the `__lt` fallback.
    pub(crate) fn less_than(&mut self, left: &Value, right: &Value) -> Result<bool, Fault> {
        if let Some(ordering) = compare_primitive(left, right) {
            return Ok(ordering == Ordering::Less);
        }
        if is_number(left) && is_number(right) {
            // NaN
            return Ok(false);
        }
        self.compare_fallback(left, right, "__lt")
    }

    /// `<=` with the `__le` fallback, then `not (right < left)` via `__lt`.
    pub(crate) fn less_equal(&mut self, left: &Value, right: &Value) -> Result<bool, Fault> {
        if let Some(ordering) = compare_primitive(left, right) {
            return Ok(ordering != Ordering::Greater);
        }
        if is_number(left) && is_number(right) {
            return Ok(false);
        }

        if let Some(handler) = self.comparison_handler(left, right, "__le") {
            return Ok(self
                .call_first(&handler, vec![left.clone(), right.clone()])?
                .is_truthy());
        }
        if let Some(handler) = self.comparison_handler(left, right, "__lt") {
            return Ok(!self
                .call_first(&handler, vec![right.clone(), left.clone()])?
                .is_truthy());
        }
        Err(self.compare_error(left, right))
    }

    fn compare_fallback(&mut self, left: &Value, right: &Value, event: &str) -> Result<bool, Fault> {
        match self.comparison_handler(left, right, event) {
            Some(handler) => Ok(self
                .call_first(&handler, vec![left.clone(), right.clone()])?
                .is_truthy()),
            None => Err(self.compare_error(left, right)),
        }
    }

    fn comparison_handler(&self, left: &Value, right: &Value, event: &str) -> Option<Value> {
        self.metamethod(left, event)
            .or_else(|| self.metamethod(right, event))
    }

    fn compare_error(&self, left: &Value, right: &Value) -> Fault {
        let (a, b) = (left.type_name(), right.type_name());
        if a == b {
            self.error(format!("attempt to compare two {} values", a))
        } else {
            self.error(format!("attempt to compare {} with {}", a, b))
        }
    }
}
