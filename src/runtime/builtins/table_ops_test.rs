use crate::runtime::{
    config::RuntimeConfig, state::State, table::TableRef, table_key::TableKey, value::Value,
};

use super::{
    BUILTINS, get_builtin,
    table_ops::{builtin_getmetatable, builtin_next, builtin_rawlen, builtin_setmetatable},
};

fn new_state() -> State {
    State::new(RuntimeConfig::default())
}

#[test]
fn base_library_is_installed() {
    let state = new_state();
    let globals = state.globals();
    for builtin in BUILTINS {
        assert!(!globals.get_str(builtin.name).is_nil(), "{} missing", builtin.name);
    }
    assert!(get_builtin("pairs").is_some());
    assert!(get_builtin("require").is_none());
    assert!(matches!(globals.get_str("_G"), Value::Table(g) if g.ptr_eq(&globals)));
}

#[test]
fn libraries_can_be_left_out() {
    let state = State::new(RuntimeConfig {
        open_libs: false,
        ..RuntimeConfig::default()
    });
    assert!(state.globals().get_str("print").is_nil());
}

#[test]
fn setmetatable_checks_arguments() {
    let mut state = new_state();
    let err = builtin_setmetatable(&mut state, vec![Value::Integer(1), Value::Nil]).unwrap_err();
    assert_eq!(
        err.message(),
        "bad argument #1 to 'setmetatable' (table expected, got number)"
    );

    let table = Value::Table(TableRef::new());
    let err = builtin_setmetatable(&mut state, vec![table.clone(), Value::Boolean(true)]).unwrap_err();
    assert_eq!(
        err.message(),
        "bad argument #2 to 'setmetatable' (nil or table expected)"
    );

    let metatable = Value::Table(TableRef::new());
    builtin_setmetatable(&mut state, vec![table.clone(), metatable.clone()]).unwrap();
    let out = builtin_getmetatable(&mut state, vec![table]).unwrap();
    assert!(out[0].raw_equals(&metatable));
}

#[test]
fn next_walks_in_insertion_order() {
    let mut state = new_state();
    let table = TableRef::new();
    table.set_str("a", Value::Integer(1));
    table.set(TableKey::Integer(1), Value::Integer(2));

    let first = builtin_next(&mut state, vec![Value::Table(table.clone())]).unwrap();
    assert_eq!(first[0].to_string(), "a");
    let second = builtin_next(&mut state, vec![Value::Table(table.clone()), first[0].clone()]).unwrap();
    assert_eq!(second[0].to_string(), "1");
    let done = builtin_next(&mut state, vec![Value::Table(table.clone()), second[0].clone()]).unwrap();
    assert!(done[0].is_nil());

    let err = builtin_next(&mut state, vec![Value::Table(table), Value::string("zzz")]).unwrap_err();
    assert_eq!(err.message(), "invalid key to 'next'");
}

#[test]
fn rawlen_of_strings_and_tables() {
    let mut state = new_state();
    let out = builtin_rawlen(&mut state, vec![Value::string("four")]).unwrap();
    assert_eq!(out[0].to_string(), "4");
    assert!(builtin_rawlen(&mut state, vec![Value::Integer(1)]).is_err());
}
