use crate::runtime::{config::RuntimeConfig, error_code::ErrorCode, state::State};

fn new_state(config: RuntimeConfig) -> State {
    State::new(RuntimeConfig {
        capture_output: true,
        ..config
    })
}

fn run_in(state: &mut State, source: &str) -> Result<String, String> {
    let base = state.top();
    assert_eq!(state.load_string(source, "test"), ErrorCode::NoError);
    let code = state.pcall(0, None);
    let rendered: Vec<String> = ((base + 1)..=state.top())
        .map(|i| state.value_at(i).to_string())
        .collect();
    state.set_top(base);
    if code.is_ok() {
        Ok(rendered.join(", "))
    } else {
        Err(rendered.join(", "))
    }
}

fn run(source: &str) -> Result<String, String> {
    run_in(&mut new_state(RuntimeConfig::default()), source)
}

#[test]
fn numeric_for_sums_range() {
    assert_eq!(
        run("local s = 0 for i = 1, 10 do s = s + i end return s").unwrap(),
        "55"
    );
    assert_eq!(
        run("local t = {} for x = 1, 2, 0.5 do t[#t + 1] = x end return #t, t[2]").unwrap(),
        "3, 1.5"
    );
    assert_eq!(
        run("local n = 0 for i = 10, 1, -3 do n = n + 1 end return n").unwrap(),
        "4"
    );
}

#[test]
fn for_step_zero_is_an_error() {
    let error = run("for i = 1, 2, 0 do end").unwrap_err();
    assert!(error.ends_with("'for' step is zero"), "{}", error);
}

#[test]
fn while_and_break() {
    assert_eq!(
        run("local i = 0 while true do i = i + 1 if i == 5 then break end end return i").unwrap(),
        "5"
    );
}

#[test]
fn repeat_condition_sees_body_locals() {
    assert_eq!(
        run("local n = 0 repeat local done = n >= 3; n = n + 1 until done return n").unwrap(),
        "4"
    );
}

#[test]
fn generic_for_over_pairs_and_ipairs() {
    assert_eq!(
        run("local t = {a = 1, b = 2, c = 3} local s = 0 for k, v in pairs(t) do s = s + v end return s")
            .unwrap(),
        "6"
    );
    assert_eq!(
        run("local t = {10, 20, nil, 40} local n = 0 for i, v in ipairs(t) do n = i end return n")
            .unwrap(),
        "2"
    );
}

#[test]
fn loop_variables_are_fresh_per_iteration() {
    assert_eq!(
        run("local fs = {} for i = 1, 3 do fs[i] = function() return i end end return fs[1](), fs[3]()")
            .unwrap(),
        "1, 3"
    );
}

#[test]
fn closures_share_captured_variables() {
    let source = "
        local function counter()
            local c = 0
            return function() c = c + 1 return c end
        end
        local f = counter()
        f()
        return f()
    ";
    assert_eq!(run(source).unwrap(), "2");
}

#[test]
fn varargs_and_select() {
    assert_eq!(
        run("local function f(...) return select('#', ...), ... end return f(1, nil, 3)").unwrap(),
        "3, 1, nil, 3"
    );
    assert_eq!(run("return select(-1, 'a', 'b')").unwrap(), "b");
}

#[test]
fn multiple_assignment_evaluates_before_assigning() {
    assert_eq!(run("local a, b = 1, 2 a, b = b, a return a, b").unwrap(), "2, 1");
}

#[test]
fn only_last_expression_expands() {
    assert_eq!(
        run("local function two() return 1, 2 end return two(), two()").unwrap(),
        "1, 1, 2"
    );
    assert_eq!(
        run("local function two() return 1, 2 end return (two())").unwrap(),
        "1"
    );
}

#[test]
fn recursion_through_local_function() {
    let source = "
        local function fib(n)
            if n < 2 then return n end
            return fib(n - 1) + fib(n - 2)
        end
        return fib(10)
    ";
    assert_eq!(run(source).unwrap(), "55");
}

#[test]
fn call_depth_limit_raises_stack_overflow() {
    let mut state = new_state(RuntimeConfig {
        max_call_depth: 20,
        ..RuntimeConfig::default()
    });
    let error = run_in(&mut state, "local function f() return f() end return f()").unwrap_err();
    assert!(error.contains("stack overflow"), "{}", error);

    // The state stays usable afterwards.
    assert_eq!(run_in(&mut state, "return 1").unwrap(), "1");
}

#[test]
fn errors_name_the_offending_variable() {
    assert_eq!(
        run("local t = nil\nreturn t.x").unwrap_err(),
        "test:2: attempt to index local 't' (a nil value)"
    );
    assert_eq!(
        run("undefined_fn()").unwrap_err(),
        "test:1: attempt to call global 'undefined_fn' (a nil value)"
    );
    assert_eq!(
        run("local t = {} t:go()").unwrap_err(),
        "test:1: attempt to call method 'go' (a nil value)"
    );
    assert_eq!(
        run("local t = {} t.inner.x = 1").unwrap_err(),
        "test:1: attempt to index field 'inner' (a nil value)"
    );
}

#[test]
fn error_builtin_locates_message() {
    assert_eq!(run("\n\nerror('boom')").unwrap_err(), "test:3: boom");
    assert_eq!(run("error('plain', 0)").unwrap_err(), "plain");
    assert_eq!(
        run("local ok, err = pcall(error, 'inner', 0) return ok, err").unwrap(),
        "false, inner"
    );
}

#[test]
fn print_writes_to_capture_buffer() {
    let mut state = new_state(RuntimeConfig::default());
    run_in(&mut state, "print('a', 1, nil) print(2.5)").unwrap();
    assert_eq!(state.take_output(), "a\t1\tnil\n2.5\n");
    assert_eq!(state.take_output(), "");
}

#[test]
fn globals_resolve_through_function_environment() {
    let mut state = new_state(RuntimeConfig::default());
    run_in(&mut state, "x = 10 function get() return x end").unwrap();
    assert_eq!(run_in(&mut state, "return get(), _G.x").unwrap(), "10, 10");
}
