use crate::{
    handle::stack_mark::{StackChecker, StackGuard, StackMark},
    runtime::{config::RuntimeConfig, state::State},
};

fn new_state() -> State {
    State::new(RuntimeConfig::default())
}

#[test]
fn restore_truncates_to_the_mark() {
    let mut state = new_state();
    state.push(1i64);
    let mark = StackMark::new(&state);
    state.push(2i64);
    state.push(3i64);

    assert_eq!(mark.count(&state), 2);
    assert!(mark.verify(&state, 2));
    assert!(!mark.verify(&state, 1));

    mark.restore(&mut state);
    assert_eq!(state.top(), 1);
    assert_eq!(state.to_integer(1), Some(1));
}

#[test]
fn restore_without_pushes_is_a_no_op() {
    let mut state = new_state();
    state.push("kept");
    let mark = StackMark::new(&state);
    mark.restore(&mut state);
    assert_eq!(state.top(), 1);
}

#[test]
fn guard_restores_on_every_exit() {
    fn early_return(state: &mut State, bail: bool) -> Option<i64> {
        let mut guard = StackGuard::new(state);
        guard.push(10i64);
        guard.push(20i64);
        if bail {
            return None;
        }
        assert!(guard.will_pop(2));
        guard.to_integer(-1)
    }

    let mut state = new_state();
    state.push(true);
    assert_eq!(early_return(&mut state, false), Some(20));
    assert_eq!(state.top(), 1);
    assert_eq!(early_return(&mut state, true), None);
    assert_eq!(state.top(), 1);
}

#[test]
fn guard_depth_is_the_entry_depth() {
    let mut state = new_state();
    state.push(1i64);
    state.push(2i64);
    let guard = StackGuard::new(&mut state);
    assert_eq!(guard.depth(), 2);
    assert!(guard.will_pop(0));
}

#[test]
fn checker_accepts_balanced_scopes() {
    let mut state = new_state();
    {
        let mut checker = StackChecker::new(&mut state);
        checker.push(1i64);
        checker.pop(1);
        assert_eq!(checker.depth(), 0);
    }
    assert_eq!(state.top(), 0);
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "unbalanced stack")]
fn checker_flags_leaked_values() {
    let mut state = new_state();
    let mut checker = StackChecker::new(&mut state);
    checker.push(1i64);
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "stack shrank below its mark")]
fn restoring_below_the_mark_is_a_defect() {
    let mut state = new_state();
    state.push(1i64);
    let mark = StackMark::new(&state);
    state.pop(1);
    mark.restore(&mut state);
}
