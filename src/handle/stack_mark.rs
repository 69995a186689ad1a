use std::{
    ops::{Deref, DerefMut},
    thread,
};

use log::{trace, warn};

use crate::runtime::state::{StackPos, State};

/// Stack depth observed at some point.
///
/// `restore` consumes the mark, so a mark can be restored at most once.
#[derive(Debug)]
pub struct StackMark {
    depth: StackPos,
}

impl StackMark {
    pub fn new(state: &State) -> Self {
        Self { depth: state.top() }
    }

    pub fn depth(&self) -> StackPos {
        self.depth
    }

    /// Number of values currently above the mark.
    pub fn count(&self, state: &State) -> usize {
        (state.top() - self.depth).max(0) as usize
    }

    /// Whether exactly `n` values sit above the mark.
    pub fn verify(&self, state: &State, n: usize) -> bool {
        state.top() - self.depth == n as StackPos
    }

    /// Truncates the stack back to the marked depth.
    pub fn restore(self, state: &mut State) {
        let top = state.top();
        if top < self.depth {
            debug_assert!(
                thread::panicking(),
                "stack shrank below its mark ({} < {})",
                top,
                self.depth
            );
            warn!("stack shrank below its mark ({} < {})", top, self.depth);
            return;
        }
        if top > self.depth {
            trace!("stack: restore {} -> {}", top, self.depth);
            state.set_top(self.depth);
        }
    }
}

/// Scoped access to a [`State`] that restores the stack depth on drop.
///
/// Everything pushed through the guard is discarded when it goes away, on
/// every exit path.
pub struct StackGuard<'s> {
    state: &'s mut State,
    depth: StackPos,
}

impl<'s> StackGuard<'s> {
    pub fn new(state: &'s mut State) -> Self {
        let depth = state.top();
        Self { state, depth }
    }

    pub fn depth(&self) -> StackPos {
        self.depth
    }

    /// Whether dropping the guard now would pop exactly `n` values.
    pub fn will_pop(&self, n: usize) -> bool {
        self.state.top() - self.depth == n as StackPos
    }
}

impl Deref for StackGuard<'_> {
    type Target = State;

    fn deref(&self) -> &State {
        self.state
    }
}

impl DerefMut for StackGuard<'_> {
    fn deref_mut(&mut self) -> &mut State {
        self.state
    }
}

impl Drop for StackGuard<'_> {
    fn drop(&mut self) {
        StackMark { depth: self.depth }.restore(self.state);
    }
}

/// Checked mode of [`StackGuard`]: nothing is restored, the depth is only
/// asserted to be unchanged when the checker goes away.
pub struct StackChecker<'s> {
    state: &'s mut State,
    depth: StackPos,
}

impl<'s> StackChecker<'s> {
    pub fn new(state: &'s mut State) -> Self {
        let depth = state.top();
        Self { state, depth }
    }

    pub fn depth(&self) -> StackPos {
        self.depth
    }
}

impl Deref for StackChecker<'_> {
    type Target = State;

    fn deref(&self) -> &State {
        self.state
    }
}

impl DerefMut for StackChecker<'_> {
    fn deref_mut(&mut self) -> &mut State {
        self.state
    }
}

impl Drop for StackChecker<'_> {
    fn drop(&mut self) {
        let top = self.state.top();
        if top != self.depth {
            debug_assert!(
                thread::panicking(),
                "unbalanced stack: depth {} on exit, {} on entry",
                top,
                self.depth
            );
            warn!(
                "unbalanced stack: depth {} on exit, {} on entry",
                top, self.depth
            );
        }
    }
}
