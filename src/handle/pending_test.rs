use crate::{
    handle::{lua::Lua, pending::PendingResult, stack_mark::StackMark},
    runtime::{
        error_code::ErrorCode,
        state::NO_POSITION,
        value::{TypeTag, Value},
    },
};

#[test]
fn items_resolve_from_both_ends() {
    let lua = Lua::new();
    let result = lua.eval("10, 20, 30");
    assert!(result.ok());
    assert_eq!(result.item_count(), 3);
    assert_eq!(result.value_count(), 3);

    assert_eq!(result.get_as::<i64>(1), 10);
    assert_eq!(result.get_as::<i64>(3), 30);
    assert_eq!(result.get_as::<i64>(-1), 30);
    assert_eq!(result.get_as::<i64>(-3), 10);
    assert_eq!(result.item(-1).position(), result.item(3).position());
    assert_eq!(result.item(-3).position(), result.item(1).position());
    assert_eq!(result.item(1).position() + 2, result.item(3).position());

    for index in [0, 4, -4] {
        assert_eq!(result.position(index), NO_POSITION, "index {}", index);
        assert!(result.item(index).is_nil());
        assert_eq!(result.get_as::<i64>(index), 0);
    }
}

#[test]
fn dropping_restores_the_stack() {
    let lua = Lua::new();
    {
        let result = lua.eval("1, 2, 3");
        assert_eq!(lua.stack_top(), 3);
        assert_eq!(result.values().len(), 3);
    }
    assert_eq!(lua.stack_top(), 0);

    {
        let _failed = lua.eval("error('x')");
        assert_eq!(lua.stack_top(), 1);
    }
    assert_eq!(lua.stack_top(), 0);
}

#[test]
fn errors_are_normalized_with_a_prefix() {
    let lua = Lua::new();
    let mut state = lua.state();
    let mark = StackMark::new(&state);
    state.push("boom");
    let result =
        PendingResult::from_mark(&lua, &mut state, mark, ErrorCode::SyntaxError, "Syntax error in");
    drop(state);

    assert!(!result.ok());
    assert!(result.is_error());
    assert_eq!(result.error_code(), ErrorCode::SyntaxError);
    assert_eq!(result.item_count(), 1);
    assert_eq!(result.value_count(), 0);
    assert_eq!(result.error_message(), "Syntax error in: boom");
    assert_eq!(result.item(1).value().to_string(), "Syntax error in: boom");
    assert_eq!(result.position(1), result.position(-1));
    assert_eq!(result.position(2), NO_POSITION);
}

#[test]
fn error_items_read_as_nil() {
    let lua = Lua::new();
    let result = lua.eval("error('x')");
    let item = result.item(1);
    assert!(item.is_error());
    assert!(item.is_nil());
    assert_eq!(item.type_of(), TypeTag::Nil);
    assert_eq!(item.get_as::<String>(), "");
    assert_eq!(result.get_as::<i32>(1), 0);
    assert!(result.values().is_empty());
}

#[test]
fn non_string_errors_are_rendered() {
    let lua = Lua::new();
    let result = lua.do_string("error(42)");
    assert_eq!(result.error_code(), ErrorCode::RuntimeError);
    assert_eq!(result.error_message(), "Logic error in: 42");
}

#[test]
fn detached_results_report_no_connection() {
    let result = PendingResult::detached();
    assert_eq!(result.error_code(), ErrorCode::NoConnection);
    assert_eq!(result.item_count(), 0);
    assert_eq!(result.error_message(), "No runtime connection");
    assert!(result.item(1).is_nil());
    assert_eq!(result.position(1), NO_POSITION);
    assert!(result.connection().is_none());
}

#[test]
fn typed_reads_and_fallbacks() {
    let lua = Lua::new();
    let result = lua.eval("'12', 2.75, true, nil, {}");
    assert_eq!(result.read::<i64>(1), Some(12));
    assert_eq!(result.get_as::<i32>(2), 2);
    assert_eq!(result.get_as::<f64>(2), 2.75);
    assert_eq!(result.get_as::<String>(2), "2.75");
    assert!(result.get_as::<bool>(3));
    assert!(result.is_nil(4));
    assert_eq!(result.type_of(5), TypeTag::Table);
    assert_eq!(result.read::<i64>(5), None);
    assert_eq!(result.get_as::<String>(5), "");
}

#[test]
fn push_onto_copies_a_value() {
    let lua = Lua::new();
    let result = lua.eval("'a', 'b'");
    {
        let mut state = lua.state();
        result.push_onto(&mut state, -1);
        assert_eq!(state.to_str(-1).as_deref(), Some("b"));
        result.push_onto(&mut state, 9);
        assert!(state.value_at(-1).is_nil());
    }
    drop(result);
    assert_eq!(lua.stack_top(), 0);
}

#[test]
fn comparison_sugar() {
    let lua = Lua::new();
    let result = lua.eval("3, 'three'");
    assert!(result == 3);
    assert!(result == 3.0);
    assert!(result.item(2) == "three");
    assert!(result.item(2) == String::from("three"));
    assert!(result.item(1) != 4);
}

#[test]
fn items_iterate_over_values() {
    let lua = Lua::new();
    let result = lua.eval("1, 'two', 3");
    let rendered: Vec<String> = result.items().map(|item| item.value().to_string()).collect();
    assert_eq!(rendered, vec!["1", "two", "3"]);
    assert!(matches!(result.item(2).value(), Value::String(_)));
}
