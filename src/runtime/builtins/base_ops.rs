use std::rc::Rc;

use crate::runtime::{
    error_code::ErrorCode,
    fault::Fault,
    state::State,
    table_key::TableKey,
    value::{Value, parse_number},
};

use super::helpers::{arg, bad_argument, check_any, check_integer, check_table, opt_integer};

impl State {
    /// `tostring` semantics: `__tostring` if present, plain rendering otherwise.
    pub(crate) fn tostring(&mut self, value: &Value) -> Result<Rc<str>, Fault> {
        if let Some(handler) = self.metamethod(value, "__tostring") {
            return match self.call_first(&handler, vec![value.clone()])? {
                Value::String(s) => Ok(s),
                _ => Err(self.error("'__tostring' must return a string")),
            };
        }
        match value {
            Value::String(s) => Ok(s.clone()),
            other => Ok(Rc::from(other.to_string())),
        }
    }
}

pub(super) fn builtin_print(state: &mut State, args: Vec<Value>) -> Result<Vec<Value>, Fault> {
    let mut line = String::new();
    for (i, value) in args.iter().enumerate() {
        if i > 0 {
            line.push('\t');
        }
        line.push_str(&state.tostring(value)?);
    }
    line.push('\n');
    state.write_output(&line);
    Ok(Vec::new())
}

pub(super) fn builtin_type(state: &mut State, args: Vec<Value>) -> Result<Vec<Value>, Fault> {
    let value = check_any(state, &args, 1, "type")?;
    Ok(vec![Value::string(value.type_name())])
}

pub(super) fn builtin_tostring(state: &mut State, args: Vec<Value>) -> Result<Vec<Value>, Fault> {
    let value = check_any(state, &args, 1, "tostring")?;
    Ok(vec![Value::String(state.tostring(&value)?)])
}

pub(super) fn builtin_tonumber(state: &mut State, args: Vec<Value>) -> Result<Vec<Value>, Fault> {
    let value = check_any(state, &args, 1, "tonumber")?;
    if arg(&args, 2).is_nil() {
        let number = match &value {
            Value::Integer(_) | Value::Float(_) => value.clone(),
            Value::String(s) => parse_number(s).unwrap_or_default(),
            _ => Value::Nil,
        };
        return Ok(vec![number]);
    }

    let base = check_integer(state, &args, 2, "tonumber")?;
    if !(2..=36).contains(&base) {
        return Err(bad_argument(state, 2, "tonumber", "base out of range"));
    }
    let text = value.to_str().unwrap_or_else(|| Rc::from(""));
    let text = text.trim();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    Ok(vec![match i64::from_str_radix(digits, base as u32) {
        Ok(n) if !digits.starts_with('+') => Value::Integer(if negative { n.wrapping_neg() } else { n }),
        _ => Value::Nil,
    }])
}

/// `error(message [, level])`: string messages get the caller's location
/// unless `level` is 0.
pub(super) fn builtin_error(state: &mut State, args: Vec<Value>) -> Result<Vec<Value>, Fault> {
    let message = arg(&args, 1);
    let level = opt_integer(state, &args, 2, "error", 1)?;
    let value = match &message {
        Value::String(s) if level > 0 => Value::from(format!("{}{}", state.where_prefix(), s)),
        _ => message,
    };
    Err(Fault::new(ErrorCode::RuntimeError, value))
}

pub(super) fn builtin_assert(state: &mut State, args: Vec<Value>) -> Result<Vec<Value>, Fault> {
    let value = check_any(state, &args, 1, "assert")?;
    if value.is_truthy() {
        return Ok(args);
    }
    match arg(&args, 2) {
        Value::Nil => Err(state.error("assertion failed!")),
        message => {
            let message = state.tostring(&message)?;
            Err(state.error(message.as_ref()))
        }
    }
}

/// `pcall(f, ...)`: `true, results...` or `false, error`.
pub(super) fn builtin_pcall(state: &mut State, args: Vec<Value>) -> Result<Vec<Value>, Fault> {
    check_any(state, &args, 1, "pcall")?;
    let mut args = args.into_iter();
    let callee = args.next().unwrap_or_default();

    match state.call_value(&callee, args.collect()) {
        Ok(results) => {
            let mut out = Vec::with_capacity(results.len() + 1);
            out.push(Value::Boolean(true));
            out.extend(results);
            Ok(out)
        }
        Err(fault) => Ok(vec![Value::Boolean(false), fault.value]),
    }
}

pub(super) fn builtin_select(state: &mut State, args: Vec<Value>) -> Result<Vec<Value>, Fault> {
    let rest = args.len().saturating_sub(1);
    if let Value::String(s) = arg(&args, 1) {
        if s.as_ref() == "#" {
            return Ok(vec![Value::Integer(rest as i64)]);
        }
    }

    let n = check_integer(state, &args, 1, "select")?;
    let start = if n < 0 {
        rest as i64 + n
    } else if n == 0 {
        -1
    } else {
        n - 1
    };
    if start < 0 {
        return Err(bad_argument(state, 1, "select", "index out of range"));
    }
    Ok(args.into_iter().skip(1 + start as usize).collect())
}

pub(super) fn builtin_unpack(state: &mut State, args: Vec<Value>) -> Result<Vec<Value>, Fault> {
    let table = check_table(state, &args, 1, "unpack")?;
    let first = opt_integer(state, &args, 2, "unpack", 1)?;
    let last = match arg(&args, 3) {
        Value::Nil => table.borrow().len(),
        _ => check_integer(state, &args, 3, "unpack")?,
    };
    if first > last {
        return Ok(Vec::new());
    }

    let count = last.saturating_sub(first).saturating_add(1);
    if count as u64 > state.config().max_stack_size as u64 {
        return Err(state.error("too many results to unpack"));
    }
    let inner = table.borrow();
    Ok((first..=last)
        .map(|i| inner.get(&TableKey::Integer(i)))
        .collect())
}
