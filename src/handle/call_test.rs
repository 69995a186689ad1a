use crate::{
    handle::{
        call::CallBuilder, function::FunctionHandle, lua::Lua, object::ObjectHandle,
    },
    runtime::{config::RuntimeConfig, error_code::ErrorCode},
};

#[test]
fn builder_appends_one_value_per_argument() {
    let lua = Lua::new();
    let sum = FunctionHandle::from(&lua.eval("function(...) local s = 0 for _, v in ipairs({...}) do s = s + v end return s, select('#', ...) end"));
    let mut call = sum.builder();
    call.append(1).append(2.5).append("3");
    assert_eq!(call.arg_count(), 3);
    assert_eq!(lua.stack_top(), 4);

    let result = call.invoke();
    assert!(result.ok());
    assert_eq!(result.get_as::<f64>(1), 6.5);
    assert_eq!(result.get_as::<i32>(2), 3);
    drop(result);
    assert_eq!(lua.stack_top(), 0);
}

#[test]
fn dropping_an_unused_builder_restores_the_stack() {
    let lua = Lua::new();
    let f = FunctionHandle::from(&lua.eval("function() end"));
    {
        let mut call = f.builder();
        call.append(1).append(2);
        assert_eq!(lua.stack_top(), 3);
    }
    assert_eq!(lua.stack_top(), 0);
}

#[test]
fn failures_name_the_callee() {
    let lua = Lua::new();
    let anonymous = FunctionHandle::from(&lua.eval("function() error('oops', 0) end"));
    let result = anonymous.builder().invoke();
    assert_eq!(result.error_code(), ErrorCode::RuntimeError);
    assert_eq!(result.error_message(), "Function call <anonymous>(): oops");
    drop(result);

    let named = anonymous.with_id("explode");
    assert_eq!(
        named.builder().invoke().error_message(),
        "Function call explode(): oops"
    );
}

#[test]
fn calling_a_non_function_is_a_runtime_error() {
    let lua = Lua::new();
    let number = ObjectHandle::from(&lua.eval("3")).with_id("three");
    let result = CallBuilder::new(&number).invoke();
    assert_eq!(result.error_code(), ErrorCode::RuntimeError);
    assert_eq!(
        result.error_message(),
        "Function call three(): attempt to call a number value"
    );
}

#[test]
fn method_calls_pass_the_receiver_first() {
    let lua = Lua::new();
    let counter = ObjectHandle::from(&lua.eval(
        "{n = 10, add = function(self, k) self.n = self.n + k return self.n end}",
    ))
    .with_id("counter");

    let mut call = CallBuilder::method(&counter, "add");
    assert_eq!(call.arg_count(), 1);
    call.append(5);
    assert!(call.invoke() == 15);

    let missing = CallBuilder::method(&counter, "nope").invoke();
    assert_eq!(
        missing.error_message(),
        "Function call counter:nope(): attempt to call a nil value"
    );
    drop(missing);
    assert_eq!(lua.stack_top(), 0);
}

#[test]
fn overflowing_arguments_fail_without_running() {
    let config = RuntimeConfig {
        max_stack_size: 20,
        ..RuntimeConfig::default()
    };
    let lua = Lua::with_config(config).unwrap();
    let f = FunctionHandle::from(&lua.eval("function(...) ran = true end")).with_id("f");
    let mut call = f.builder();
    for i in 0..30 {
        call.append(i);
    }
    assert!(call.arg_count() < 30);

    let result = call.invoke();
    assert_eq!(result.error_code(), ErrorCode::RuntimeError);
    assert_eq!(result.error_message(), "Function call f(): stack overflow");
    drop(result);
    assert_eq!(lua.stack_top(), 0);
    assert!(lua.get_global("ran").is_nil(1));
}

#[test]
fn detached_builders_do_nothing() {
    let callee = ObjectHandle::default();
    let mut call = CallBuilder::new(&callee);
    call.append(1);
    assert_eq!(call.arg_count(), 0);
    let result = call.invoke();
    assert_eq!(result.error_code(), ErrorCode::NoConnection);
}
