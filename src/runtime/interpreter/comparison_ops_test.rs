use crate::runtime::{config::RuntimeConfig, error_code::ErrorCode, state::State};

fn run(source: &str) -> (ErrorCode, String) {
    let mut state = State::new(RuntimeConfig::default());
    assert_eq!(state.load_string(source, "test"), ErrorCode::NoError);
    let code = state.pcall(0, None);
    let rendered: Vec<String> = (1..=state.top())
        .map(|i| state.value_at(i).to_string())
        .collect();
    (code, rendered.join(", "))
}

#[test]
fn compares_numbers_and_strings() {
    let (_, out) = run("return 1 < 2, 2 <= 2, 'a' < 'b', 1 == 1.0, '1' == 1, 3 >= 4");
    assert_eq!(out, "true, true, true, true, false, false");
}

#[test]
fn mixed_type_ordering_is_an_error() {
    let (code, out) = run("return 1 < nil");
    assert_eq!(code, ErrorCode::RuntimeError);
    assert_eq!(out, "test:1: attempt to compare number with nil");

    let (_, out) = run("return {} < {}");
    assert_eq!(out, "test:1: attempt to compare two table values");

    let (_, out) = run("return 1 < '2'");
    assert_eq!(out, "test:1: attempt to compare number with string");
}

#[test]
fn eq_metamethod_applies_to_distinct_tables() {
    let source = "
        local mt = {__eq = function() return true end}
        local a = setmetatable({}, mt)
        local b = setmetatable({}, mt)
        return a == b, a ~= b, a == 1
    ";
    let (_, out) = run(source);
    assert_eq!(out, "true, false, false");
}

#[test]
fn le_falls_back_to_lt() {
    let source = "
        local mt = {__lt = function(a, b) return a.v < b.v end}
        local a = setmetatable({v = 1}, mt)
        local b = setmetatable({v = 2}, mt)
        return a < b, b > a, a <= b, b <= a
    ";
    let (code, out) = run(source);
    assert_eq!(code, ErrorCode::NoError, "{}", out);
    assert_eq!(out, "true, true, true, false");
}

#[test]
fn nan_is_unordered() {
    let (_, out) = run("local nan = 0/0 return nan == nan, nan < 1, nan >= 1");
    assert_eq!(out, "false, false, false");
}
