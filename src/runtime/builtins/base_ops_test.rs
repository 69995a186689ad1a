use crate::runtime::{config::RuntimeConfig, state::State, value::Value};

use super::base_ops::{
    builtin_assert, builtin_error, builtin_select, builtin_tonumber, builtin_tostring, builtin_type,
    builtin_unpack,
};

fn new_state() -> State {
    State::new(RuntimeConfig::default())
}

fn rendered(values: Vec<Value>) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[test]
fn type_names() {
    let mut state = new_state();
    let out = builtin_type(&mut state, vec![Value::Integer(1)]).unwrap();
    assert_eq!(rendered(out), vec!["number"]);

    let err = builtin_type(&mut state, vec![]).unwrap_err();
    assert_eq!(err.message(), "bad argument #1 to 'type' (value expected)");
}

#[test]
fn tonumber_parses_and_rejects() {
    let mut state = new_state();
    let cases = [
        (vec![Value::string(" 12 ")], "12"),
        (vec![Value::string("0x1F")], "31"),
        (vec![Value::string("1e2")], "100.0"),
        (vec![Value::string("abc")], "nil"),
        (vec![Value::string("ff"), Value::Integer(16)], "255"),
        (vec![Value::string("-101"), Value::Integer(2)], "-5"),
        (vec![Value::string("9"), Value::Integer(8)], "nil"),
    ];
    for (args, expected) in cases {
        let out = builtin_tonumber(&mut state, args).unwrap();
        assert_eq!(rendered(out), vec![expected]);
    }

    let err = builtin_tonumber(&mut state, vec![Value::string("1"), Value::Integer(99)]).unwrap_err();
    assert_eq!(err.message(), "bad argument #2 to 'tonumber' (base out of range)");
}

#[test]
fn tostring_uses_metamethod() {
    let mut state = new_state();
    assert_eq!(
        state.load_string(
            "return setmetatable({}, {__tostring = function() return 'custom' end})",
            "t"
        ),
        crate::runtime::error_code::ErrorCode::NoError
    );
    state.pcall(0, Some(1));
    let object = state.value_at(-1);
    let out = builtin_tostring(&mut state, vec![object]).unwrap();
    assert_eq!(rendered(out), vec!["custom"]);
}

#[test]
fn error_keeps_non_string_values() {
    let mut state = new_state();
    let fault = builtin_error(&mut state, vec![Value::Integer(42)]).unwrap_err();
    assert!(matches!(fault.value, Value::Integer(42)));

    let fault = builtin_error(&mut state, vec![Value::string("host side")]).unwrap_err();
    assert_eq!(fault.message(), "host side");
}

#[test]
fn assert_passes_values_through() {
    let mut state = new_state();
    let out = builtin_assert(&mut state, vec![Value::Integer(1), Value::string("m")]).unwrap();
    assert_eq!(rendered(out), vec!["1", "m"]);

    let err = builtin_assert(&mut state, vec![Value::Boolean(false)]).unwrap_err();
    assert_eq!(err.message(), "assertion failed!");

    let err = builtin_assert(&mut state, vec![Value::Nil, Value::string("custom")]).unwrap_err();
    assert_eq!(err.message(), "custom");
}

#[test]
fn select_counts_and_slices() {
    let mut state = new_state();
    let args = vec![Value::string("#"), Value::Nil, Value::Nil];
    assert_eq!(rendered(builtin_select(&mut state, args).unwrap()), vec!["2"]);

    let args = vec![Value::Integer(2), Value::Integer(10), Value::Integer(20), Value::Integer(30)];
    assert_eq!(rendered(builtin_select(&mut state, args).unwrap()), vec!["20", "30"]);

    let err = builtin_select(&mut state, vec![Value::Integer(0)]).unwrap_err();
    assert_eq!(err.message(), "bad argument #1 to 'select' (index out of range)");
}

#[test]
fn unpack_ranges() {
    let mut state = new_state();
    assert_eq!(
        state.load_string("return {1, 2, 3}", "t"),
        crate::runtime::error_code::ErrorCode::NoError
    );
    state.pcall(0, Some(1));
    let table = state.value_at(-1);

    let out = builtin_unpack(&mut state, vec![table.clone()]).unwrap();
    assert_eq!(rendered(out), vec!["1", "2", "3"]);

    let out = builtin_unpack(&mut state, vec![table, Value::Integer(2), Value::Integer(4)]).unwrap();
    assert_eq!(rendered(out), vec!["2", "3", "nil"]);
}
