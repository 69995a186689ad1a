use std::rc::Rc;

use crate::runtime::{
    builtin_function::BuiltinFunction,
    fault::Fault,
    function::Function,
    state::State,
    table_key::TableKey,
    value::Value,
};

use super::helpers::{arg, arg_type_name, bad_argument, check_any, check_integer, check_table};

fn builtin_value(name: &'static str, func: crate::runtime::BuiltinFn) -> Value {
    Value::Function(Rc::new(Function::Builtin(BuiltinFunction { name, func })))
}

pub(super) fn builtin_rawget(state: &mut State, args: Vec<Value>) -> Result<Vec<Value>, Fault> {
    let table = check_table(state, &args, 1, "rawget")?;
    let key = check_any(state, &args, 2, "rawget")?;
    let value = match TableKey::from_value(&key) {
        Ok(key) => table.get(&key),
        Err(_) => Value::Nil,
    };
    Ok(vec![value])
}

pub(super) fn builtin_rawset(state: &mut State, args: Vec<Value>) -> Result<Vec<Value>, Fault> {
    let table = check_table(state, &args, 1, "rawset")?;
    let key = check_any(state, &args, 2, "rawset")?;
    let value = check_any(state, &args, 3, "rawset")?;
    let key = TableKey::from_value(&key).map_err(|e| state.error(e.message()))?;
    table.set(key, value);
    Ok(vec![Value::Table(table)])
}

pub(super) fn builtin_rawequal(state: &mut State, args: Vec<Value>) -> Result<Vec<Value>, Fault> {
    let a = check_any(state, &args, 1, "rawequal")?;
    let b = check_any(state, &args, 2, "rawequal")?;
    Ok(vec![Value::Boolean(a.raw_equals(&b))])
}

pub(super) fn builtin_rawlen(state: &mut State, args: Vec<Value>) -> Result<Vec<Value>, Fault> {
    match arg(&args, 1) {
        Value::Table(table) => Ok(vec![Value::Integer(table.borrow().len())]),
        Value::String(s) => Ok(vec![Value::Integer(s.len() as i64)]),
        _ => Err(bad_argument(state, 1, "rawlen", "table or string expected")),
    }
}

/// Refuses to replace a metatable that carries `__metatable`.
pub(super) fn builtin_setmetatable(state: &mut State, args: Vec<Value>) -> Result<Vec<Value>, Fault> {
    let table = check_table(state, &args, 1, "setmetatable")?;
    let metatable = match arg(&args, 2) {
        Value::Nil => None,
        Value::Table(metatable) => Some(metatable),
        _ => return Err(bad_argument(state, 2, "setmetatable", "nil or table expected")),
    };

    if let Some(current) = table.metatable() {
        if !current.get_str("__metatable").is_nil() {
            return Err(state.error("cannot change a protected metatable"));
        }
    }
    table.borrow_mut().set_metatable(metatable);
    Ok(vec![Value::Table(table)])
}

pub(super) fn builtin_getmetatable(state: &mut State, args: Vec<Value>) -> Result<Vec<Value>, Fault> {
    let value = check_any(state, &args, 1, "getmetatable")?;
    let Some(metatable) = state.metatable_of(&value) else {
        return Ok(vec![Value::Nil]);
    };
    let protected = metatable.get_str("__metatable");
    if protected.is_nil() {
        Ok(vec![Value::Table(metatable)])
    } else {
        Ok(vec![protected])
    }
}

pub(super) fn builtin_next(state: &mut State, args: Vec<Value>) -> Result<Vec<Value>, Fault> {
    let table = check_table(state, &args, 1, "next")?;
    let key = match arg(&args, 2) {
        Value::Nil => None,
        key => Some(TableKey::from_value(&key).map_err(|_| state.error("invalid key to 'next'"))?),
    };

    let entry = table.borrow().next(key.as_ref());
    match entry {
        Ok(Some((key, value))) => Ok(vec![key.to_value(), value]),
        Ok(None) => Ok(vec![Value::Nil]),
        Err(()) => Err(state.error("invalid key to 'next'")),
    }
}

pub(super) fn builtin_pairs(state: &mut State, args: Vec<Value>) -> Result<Vec<Value>, Fault> {
    let table = check_table(state, &args, 1, "pairs")?;
    Ok(vec![
        builtin_value("next", builtin_next),
        Value::Table(table),
        Value::Nil,
    ])
}

fn ipairs_step(state: &mut State, args: Vec<Value>) -> Result<Vec<Value>, Fault> {
    let table = check_table(state, &args, 1, "ipairs")?;
    let i = check_integer(state, &args, 2, "ipairs")?.wrapping_add(1);
    let value = table.get(&TableKey::Integer(i));
    if value.is_nil() {
        Ok(vec![Value::Nil])
    } else {
        Ok(vec![Value::Integer(i), value])
    }
}

pub(super) fn builtin_ipairs(state: &mut State, args: Vec<Value>) -> Result<Vec<Value>, Fault> {
    if !matches!(arg(&args, 1), Value::Table(_)) {
        let got = arg_type_name(&args, 1);
        return Err(bad_argument(state, 1, "ipairs", &format!("table expected, got {}", got)));
    }
    Ok(vec![
        builtin_value("ipairs_iterator", ipairs_step),
        arg(&args, 1),
        Value::Integer(0),
    ])
}
