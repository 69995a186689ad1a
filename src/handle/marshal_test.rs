use crate::{
    args,
    handle::{
        lua::Lua,
        marshal::{CallArg, FromStack, ToStack, read_or_default},
    },
    runtime::{config::RuntimeConfig, state::State, value::Value},
};

fn new_state() -> State {
    State::new(RuntimeConfig::default())
}

#[test]
fn integer_reads_truncate_and_range_check() {
    let mut state = new_state();
    state.push(2.9);
    state.push(-2.9);
    state.push("17");
    state.push(i64::from(u32::MAX) + 1);
    state.push(-1i64);

    assert_eq!(i64::read(&state, 1), Some(2));
    assert_eq!(i32::read(&state, 2), Some(-2));
    assert_eq!(i32::read(&state, 3), Some(17));
    assert_eq!(u32::read(&state, 4), None);
    assert_eq!(i64::read(&state, 4), Some(4_294_967_296));
    assert_eq!(u32::read(&state, 5), None);
    assert_eq!(read_or_default::<u32>(&state, 5), 0);
}

#[test]
fn mismatched_reads_fall_back() {
    let mut state = new_state();
    state.new_table();
    state.push("not a number");

    assert_eq!(i64::read(&state, 1), None);
    assert_eq!(f64::read(&state, 2), None);
    assert_eq!(String::read(&state, 1), None);
    assert_eq!(read_or_default::<String>(&state, 1), "");
    assert_eq!(read_or_default::<f64>(&state, 2), 0.0);
    assert!(read_or_default::<bool>(&state, 1));
    assert!(!read_or_default::<bool>(&state, 9));
    assert!(bool::read(&state, 9).is_none());
    assert!(Value::read(&state, 9).is_none());
}

#[test]
fn strings_read_numbers_in_display_form() {
    let mut state = new_state();
    state.push(3i64);
    state.push(0.25);
    assert_eq!(String::read(&state, 1).as_deref(), Some("3"));
    assert_eq!(String::read(&state, 2).as_deref(), Some("0.25"));
    assert_eq!(f32::read(&state, 2), Some(0.25));
}

#[test]
fn every_host_value_pushes_one_slot() {
    let mut state = new_state();
    let owned = String::from("owned");
    let pushes: Vec<&dyn ToStack> = vec![
        &true,
        &7i32,
        &7u32,
        &7i64,
        &1.5f32,
        &1.5f64,
        &"str",
        &owned,
        &(),
        &None::<i32>,
        &Some(4i32),
    ];
    for (n, value) in pushes.iter().enumerate() {
        value.push_to(&mut state);
        assert_eq!(state.top(), n as i32 + 1);
    }
    assert!(state.value_at(9).is_nil());
    assert!(state.value_at(10).is_nil());
    assert_eq!(state.to_integer(11), Some(4));
    assert_eq!(state.to_str(7).as_deref(), Some("str"));
}

#[test]
fn call_args_mirror_their_sources() {
    let owned = String::from("b");
    let values: &[CallArg<'_>] = args![(), true, 1, 2.0, "a", &owned, Value::from(9i64)];
    assert!(matches!(values[0], CallArg::Nil));
    assert!(matches!(values[1], CallArg::Boolean(true)));
    assert!(matches!(values[2], CallArg::Integer(1)));
    assert!(matches!(values[3], CallArg::Number(n) if n == 2.0));
    assert!(matches!(&values[4], CallArg::String(s) if s == "a"));
    assert!(matches!(&values[5], CallArg::String(s) if s == "b"));
    assert!(matches!(values[6], CallArg::Value(Value::Integer(9))));

    let mut state = new_state();
    for value in values {
        value.push_to(&mut state);
    }
    assert_eq!(state.top(), 7);
    assert!(args![].is_empty());
}

#[test]
fn objects_pass_by_reference() {
    let lua = Lua::new();
    let table = lua.new_table();
    let arg = CallArg::from(&table);
    {
        let mut state = lua.raw();
        arg.push_to(&mut state);
        table.push_onto(&mut state);
        assert!(state.raw_equal(-1, -2));
        state.pop(2);
    }
    assert_eq!(lua.registry_outstanding(), 1);
}
