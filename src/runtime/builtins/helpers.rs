use crate::runtime::{fault::Fault, state::State, table::TableRef, value::Value};

/// `bad argument #n to 'name' (message)`, located at the caller.
pub(super) fn bad_argument(state: &State, position: usize, name: &str, message: &str) -> Fault {
    state.error(format!("bad argument #{} to '{}' ({})", position, name, message))
}

/// Type name for error messages; missing arguments are `no value`.
pub(super) fn arg_type_name(args: &[Value], position: usize) -> &'static str {
    match args.get(position - 1) {
        Some(value) => value.type_name(),
        None => "no value",
    }
}

/// Argument at 1-based `position`, `nil` when absent.
pub(super) fn arg(args: &[Value], position: usize) -> Value {
    args.get(position - 1).cloned().unwrap_or_default()
}

pub(super) fn check_any(state: &State, args: &[Value], position: usize, name: &str) -> Result<Value, Fault> {
    args.get(position - 1)
        .cloned()
        .ok_or_else(|| bad_argument(state, position, name, "value expected"))
}

pub(super) fn check_table(
    state: &State,
    args: &[Value],
    position: usize,
    name: &str,
) -> Result<TableRef, Fault> {
    match args.get(position - 1) {
        Some(Value::Table(table)) => Ok(table.clone()),
        _ => Err(bad_argument(
            state,
            position,
            name,
            &format!("table expected, got {}", arg_type_name(args, position)),
        )),
    }
}

pub(super) fn check_integer(state: &State, args: &[Value], position: usize, name: &str) -> Result<i64, Fault> {
    let value = arg(args, position);
    match value.to_arith() {
        Some(Value::Integer(v)) => Ok(v),
        Some(Value::Float(v)) => Ok(v.floor() as i64),
        _ => Err(bad_argument(
            state,
            position,
            name,
            &format!("number expected, got {}", arg_type_name(args, position)),
        )),
    }
}

pub(super) fn opt_integer(
    state: &State,
    args: &[Value],
    position: usize,
    name: &str,
    default: i64,
) -> Result<i64, Fault> {
    if arg(args, position).is_nil() {
        Ok(default)
    } else {
        check_integer(state, args, position, name)
    }
}
