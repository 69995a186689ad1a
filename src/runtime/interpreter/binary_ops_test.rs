use crate::runtime::{config::RuntimeConfig, error_code::ErrorCode, state::State};

fn run_with(config: RuntimeConfig, source: &str) -> (ErrorCode, String) {
    let mut state = State::new(config);
    assert_eq!(state.load_string(source, "test"), ErrorCode::NoError);
    let code = state.pcall(0, None);
    let rendered: Vec<String> = (1..=state.top())
        .map(|i| state.value_at(i).to_string())
        .collect();
    (code, rendered.join(", "))
}

fn run(source: &str) -> (ErrorCode, String) {
    run_with(RuntimeConfig::default(), source)
}

#[test]
fn integer_and_float_arithmetic() {
    let (code, out) = run("return 1 + 2, 7 / 2, 2 ^ 10, 7 % 3, -7 % 3, 7.5 % 2");
    assert_eq!(code, ErrorCode::NoError);
    assert_eq!(out, "3, 3.5, 1024.0, 1, 2, 1.5");
}

#[test]
fn integer_modulo_by_zero() {
    let (code, out) = run("return 1 % 0");
    assert_eq!(code, ErrorCode::RuntimeError);
    assert_eq!(out, "test:1: attempt to perform 'n%0'");
}

#[test]
fn numeric_strings_are_coerced() {
    let (_, out) = run("return '10' + 5, 1 .. 2, '0x10' * 1");
    assert_eq!(out, "15, 12, 16");
}

#[test]
fn arithmetic_on_nil_names_operand() {
    let (_, out) = run("local x return x + 1");
    assert_eq!(out, "test:1: attempt to perform arithmetic on local 'x' (a nil value)");

    let (_, out) = run("return 1 - {}");
    assert_eq!(out, "test:1: attempt to perform arithmetic on a table value");
}

#[test]
fn concat_on_nil_names_operand() {
    let (_, out) = run("return 'a' .. missing");
    assert_eq!(out, "test:1: attempt to concatenate global 'missing' (a nil value)");
}

#[test]
fn arithmetic_metamethods() {
    let source = "
        local mt = {
            __add = function(a, b) return a.v + b.v end,
            __unm = function(a) return -a.v end,
            __concat = function(a, b) return 'joined' end,
        }
        local a = setmetatable({v = 1}, mt)
        local b = setmetatable({v = 2}, mt)
        return a + b, -a, a .. 'x'
    ";
    let (code, out) = run(source);
    assert_eq!(code, ErrorCode::NoError, "{}", out);
    assert_eq!(out, "3, -1, joined");
}

#[test]
fn length_of_strings_and_tables() {
    let (_, out) = run("return #'abc', #{1, 2, 3}");
    assert_eq!(out, "3, 3");

    let (_, out) = run("return #nothing");
    assert_eq!(out, "test:1: attempt to get length of global 'nothing' (a nil value)");
}

#[test]
fn oversized_concat_is_out_of_memory() {
    let config = RuntimeConfig {
        max_string_bytes: 8,
        ..RuntimeConfig::default()
    };
    let (code, out) = run_with(config, "return 'aaaaa' .. 'bbbbb'");
    assert_eq!(code, ErrorCode::OutOfMemory);
    assert_eq!(out, "not enough memory");
}
