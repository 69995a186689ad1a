use tether::{
    BoundMethod, ClassHandle, ErrorCode, FunctionHandle, Lua, ObjectHandle, PendingResult,
    TableHandle, TypeTag, Value, args, runtime::NO_POSITION,
};

#[test]
fn scenario_eval_expression() {
    let lua = Lua::new();
    let result = lua.eval("1+2");
    assert_eq!(result.item_count(), 1);
    assert!(result.ok());
    assert_eq!(result.get_as::<i32>(1), 3);
}

#[test]
fn scenario_eval_error() {
    let lua = Lua::new();
    let result = lua.eval("error('x')");
    assert!(!result.ok());
    assert!(result.error_message().contains('x'));
}

#[test]
fn scenario_table_fields() {
    let lua = Lua::new();
    let table = lua.new_table();
    table.set_field("k", 42).unwrap();
    assert_eq!(table.get_field("k").get_as::<i32>(1), 42);
    table.del_field("k").unwrap();
    assert!(!table.has_field("k"));
}

#[test]
fn scenario_bound_method_matches_direct_call() {
    let lua = Lua::new();
    let object = ObjectHandle::from(&lua.eval("{scale = 3}"));
    let f = FunctionHandle::from(&lua.eval("function(self, n) return self.scale * n, n end"));

    let bound = BoundMethod::new(object.clone(), f.clone());
    let via_bound = bound.call(args![5]);
    let via_direct_values = f.call(args![&object, 5]).values();
    assert_eq!(via_bound.value_count(), via_direct_values.len());
    for (item, direct) in via_bound.items().zip(&via_direct_values) {
        assert!(item.value().raw_equals(direct));
    }
    assert!(via_bound == 15);
}

#[test]
fn every_operation_leaves_the_stack_balanced() {
    let lua = Lua::new();
    assert!(lua.do_string("t = {1, 2, 3} function f(...) return ... end").ok());
    let table = TableHandle::from(&lua.get_global("t"));
    let f = FunctionHandle::from(&lua.get_global("f")).with_id("f");
    let class = ClassHandle::from(&lua.eval("{m = function(self, x) return x end}"));

    let operations: Vec<(&str, Box<dyn Fn() + '_>)> = vec![
        ("eval", Box::new(|| drop(lua.eval("1, 2, 3")))),
        ("eval error", Box::new(|| drop(lua.eval("error('e')")))),
        ("syntax error", Box::new(|| drop(lua.do_string("return +")))),
        ("missing file", Box::new(|| drop(lua.do_file("/nonexistent/x.lua")))),
        ("call", Box::new(|| drop(f.call(args![1, 2, 3])))),
        // tables are not callable without `__call`
        (
            "call error",
            Box::new(|| drop(FunctionHandle::from(table.as_object().clone()).call(args![]))),
        ),
        ("get field", Box::new(|| drop(table.get_field(2)))),
        ("set field", Box::new(|| table.set_field("x", 1).unwrap())),
        ("has field", Box::new(|| assert!(table.has_field(1)))),
        ("len", Box::new(|| assert_eq!(table.len(), 3))),
        ("meta table", Box::new(|| drop(table.meta_table()))),
        ("method", Box::new(|| drop(class.call_method("m", args![1])))),
        ("bound", Box::new(|| drop(class.bound_method("m").call(args![2])))),
        ("global", Box::new(|| drop(lua.get_global("t")))),
        ("set global", Box::new(|| lua.set_global("g", 1).unwrap())),
        ("new table", Box::new(|| drop(lua.new_table()))),
        ("promote", Box::new(|| drop(ObjectHandle::from(&lua.eval("{}"))))),
    ];

    for (name, operation) in &operations {
        let before = lua.stack_top();
        operation();
        assert_eq!(lua.stack_top(), before, "operation `{}`", name);
    }
}

#[test]
fn independent_handles_release_their_slots() {
    let lua = Lua::new();
    let before = lua.registry_outstanding();
    let handles: Vec<ObjectHandle> = (0..25)
        .map(|_| ObjectHandle::from(&lua.eval("'same'")))
        .collect();
    let clones: Vec<ObjectHandle> = handles.iter().cloned().collect();
    assert_eq!(lua.registry_outstanding(), before + 50);
    drop(handles);
    assert_eq!(lua.registry_outstanding(), before + 25);
    drop(clones);
    assert_eq!(lua.registry_outstanding(), before);
}

#[test]
fn nil_propagates_through_reads() {
    let lua = Lua::new();
    let nil = ObjectHandle::from(&lua.eval("nil"));
    assert!(nil.is_nil());
    assert!(!nil.is_error());
    assert_eq!(nil.get_as::<i32>(), 0);
    assert_eq!(nil.get_as::<String>(), "");
    assert!(!nil.get_as::<bool>());

    let unconnected = ObjectHandle::default();
    assert!(unconnected.is_nil());
    assert_eq!(unconnected.error_code(), ErrorCode::NoConnection);

    let missing = TableHandle::from(&lua.eval("{}")).get_field("absent");
    assert!(missing.ok());
    assert!(missing.is_nil(1));
}

#[test]
fn item_positions_from_both_ends() {
    let lua = Lua::new();
    let result = lua.eval("'a', 'b', 'c', 'd'");
    let n = result.item_count() as i32;
    for k in 1..=n {
        assert_eq!(result.position(k), result.position(k - n - 1));
        assert_ne!(result.position(k), NO_POSITION);
    }
    assert_eq!(result.position(0), NO_POSITION);
    assert_eq!(result.position(n + 1), NO_POSITION);
    assert_eq!(result.position(-n - 1), NO_POSITION);
}

#[test]
fn error_results_hold_exactly_one_message() {
    let lua = Lua::new();
    let cases: [(fn(&Lua) -> PendingResult, ErrorCode); 3] = [
        (|lua| lua.do_string("error({code = 1})"), ErrorCode::RuntimeError),
        (|lua| lua.do_string("local x = "), ErrorCode::SyntaxError),
        (|lua| lua.do_file("/nonexistent/x.lua"), ErrorCode::FileError),
    ];
    for (run, code) in cases {
        let result = run(&lua);
        assert_eq!(result.error_code(), code);
        assert_eq!(result.item_count(), 1);
        assert_eq!(result.value_count(), 0);
        assert!(!result.error_message().is_empty());
    }
    insta::assert_snapshot!(
        lua.do_file("/nonexistent/x.lua").error_message(),
        @"Read error: cannot open /nonexistent/x.lua"
    );
}

#[test]
fn values_round_trip_through_handles() {
    let lua = Lua::new();
    let samples = lua.eval("nil, true, 7, 2.5, 'text', {}, print");
    for item in samples.items() {
        let handle = ObjectHandle::from(item);
        assert!(handle.value().raw_equals(&item.value()), "{}", item.value());
        assert_eq!(handle.type_of(), item.type_of());
    }
    assert_eq!(samples.type_of(7), TypeTag::Function);
}

#[test]
fn sandboxed_chunks_see_only_their_environment() {
    let lua = Lua::new();
    lua.set_global("secret", "host").unwrap();
    let sandbox = lua.new_table();
    sandbox.set_field("print", Value::Nil).unwrap();

    let result = lua.eval_in("secret", &sandbox);
    assert!(result.ok());
    assert!(result.is_nil(1));
    drop(result);

    let escaped = lua.do_string_in("print('hi')", &sandbox);
    assert_eq!(escaped.error_code(), ErrorCode::RuntimeError);
    assert!(escaped.error_message().contains("attempt to call"));
}
