use std::{
    cell::{BorrowMutError, Ref, RefCell, RefMut},
    fmt,
    path::Path,
    rc::Rc,
};

use log::{debug, warn};

use crate::{
    handle::{
        error::RuntimeError,
        marshal::ToStack,
        object::ObjectHandle,
        pending::PendingResult,
        stack_mark::{StackChecker, StackGuard, StackMark},
        table::TableHandle,
    },
    runtime::{
        config::{RuntimeConfig, SetupError},
        error_code::ErrorCode,
        state::{State, string_chunk_name},
    },
};

const SYNTAX_ERROR_PREFIX: &str = "Syntax error in";
const READ_ERROR_PREFIX: &str = "Read error";
const LOGIC_ERROR_PREFIX: &str = "Logic error in";

/// A connection to one runtime instance.
///
/// Cloning is cheap and yields another connection to the same instance.
/// Connections are `!Send`; use one per thread.
#[derive(Clone)]
pub struct Lua {
    state: Rc<RefCell<State>>,
}

impl Lua {
    /// Opens a runtime with the default configuration.
    pub fn new() -> Self {
        Self::from_state(State::new(RuntimeConfig::default()))
    }

    /// Opens a runtime with `config`, refusing configurations it cannot run
    /// under.
    pub fn with_config(config: RuntimeConfig) -> Result<Self, SetupError> {
        config.validate()?;
        Ok(Self::from_state(State::new(config)))
    }

    fn from_state(state: State) -> Self {
        Self {
            state: Rc::new(RefCell::new(state)),
        }
    }

    pub(crate) fn state(&self) -> RefMut<'_, State> {
        self.state.borrow_mut()
    }

    pub(crate) fn try_state(&self) -> Result<RefMut<'_, State>, BorrowMutError> {
        self.state.try_borrow_mut()
    }

    pub(crate) fn state_ref(&self) -> Ref<'_, State> {
        self.state.borrow()
    }

    /// Direct access to the runtime state.
    ///
    /// The borrow must be released before any handle operation on this
    /// connection; handles borrow the state themselves.
    pub fn raw(&self) -> RefMut<'_, State> {
        self.state()
    }

    pub fn ptr_eq(&self, other: &Lua) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    // Chunks

    /// Evaluates `expr` and returns its values.
    pub fn eval(&self, expr: &str) -> PendingResult {
        self.do_string(&format!("return {}", expr))
    }

    /// Evaluates `expr` with `env` as its global table.
    pub fn eval_in(&self, expr: &str, env: &TableHandle) -> PendingResult {
        self.do_string_in(&format!("return {}", expr), env)
    }

    pub fn do_string(&self, source: &str) -> PendingResult {
        self.run_chunk(|state| load_source(state, source), SYNTAX_ERROR_PREFIX, None)
    }

    /// Runs `source` with `env` as its global table.
    pub fn do_string_in(&self, source: &str, env: &TableHandle) -> PendingResult {
        self.run_chunk(
            |state| load_source(state, source),
            SYNTAX_ERROR_PREFIX,
            Some(env),
        )
    }

    pub fn do_file(&self, path: impl AsRef<Path>) -> PendingResult {
        let path = path.as_ref();
        self.run_chunk(|state| state.load_file(path), READ_ERROR_PREFIX, None)
    }

    pub fn do_file_in(&self, path: impl AsRef<Path>, env: &TableHandle) -> PendingResult {
        let path = path.as_ref();
        self.run_chunk(|state| state.load_file(path), READ_ERROR_PREFIX, Some(env))
    }

    /// Compiles `source` without running it. The single value is the chunk
    /// function.
    pub fn chunk_from_string(&self, source: &str) -> PendingResult {
        let mut state = self.state();
        let mark = StackMark::new(&state);
        let code = load_source(&mut state, source);
        debug_assert!(mark.verify(&state, 1));
        PendingResult::from_mark(self, &mut state, mark, code, SYNTAX_ERROR_PREFIX)
    }

    pub fn chunk_from_file(&self, path: impl AsRef<Path>) -> PendingResult {
        let mut state = self.state();
        let mark = StackMark::new(&state);
        let code = state.load_file(path);
        debug_assert!(mark.verify(&state, 1));
        PendingResult::from_mark(self, &mut state, mark, code, READ_ERROR_PREFIX)
    }

    fn run_chunk(
        &self,
        load: impl FnOnce(&mut State) -> ErrorCode,
        load_prefix: &str,
        env: Option<&TableHandle>,
    ) -> PendingResult {
        let mut state = self.state();
        let mark = StackMark::new(&state);
        let code = load(&mut state);
        if code.is_error() {
            return PendingResult::from_mark(self, &mut state, mark, code, load_prefix);
        }

        if let Some(env) = env {
            env.push_onto(&mut state);
            if !state.set_env(-2) {
                warn!("environment for chunk is not a table; keeping globals");
            }
        }

        let code = state.pcall(0, None);
        PendingResult::from_mark(self, &mut state, mark, code, LOGIC_ERROR_PREFIX)
    }

    // Globals and tables

    pub fn get_global(&self, name: &str) -> PendingResult {
        let mut state = self.state();
        let mark = StackMark::new(&state);
        let outcome = state.get_global(name);
        PendingResult::from_outcome(self, &mut state, mark, outcome, &format!("Global {}", name))
    }

    pub fn set_global(&self, name: &str, value: impl ToStack) -> Result<(), RuntimeError> {
        let mut state = self.state();
        let mut checker = StackChecker::new(&mut state);
        value.push_to(&mut checker);
        checker.set_global(name)?;
        Ok(())
    }

    /// Creates an empty table owned by the returned handle.
    pub fn new_table(&self) -> TableHandle {
        let mut state = self.state();
        let mut guard = StackGuard::new(&mut state);
        guard.new_table();
        TableHandle::from(ObjectHandle::from_stack(self, &mut guard, -1))
    }

    // Introspection

    /// Drains output captured from `print` (empty unless `capture_output` is
    /// set).
    pub fn take_output(&self) -> String {
        self.state().take_output()
    }

    pub fn registry_outstanding(&self) -> usize {
        self.state_ref().registry_outstanding()
    }

    pub fn stack_top(&self) -> usize {
        self.state_ref().top().max(0) as usize
    }

    pub fn config(&self) -> RuntimeConfig {
        self.state_ref().config().clone()
    }

    /// Parse cache hits and misses so far.
    pub fn cache_stats(&self) -> (usize, usize) {
        let state = self.state_ref();
        (state.cache().hits(), state.cache().misses())
    }
}

impl Default for Lua {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Lua {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.state.try_borrow() {
            Ok(state) => f
                .debug_struct("Lua")
                .field("stack_top", &state.top())
                .field("registry_outstanding", &state.registry_outstanding())
                .finish(),
            Err(_) => f.debug_struct("Lua").finish_non_exhaustive(),
        }
    }
}

fn load_source(state: &mut State, source: &str) -> ErrorCode {
    let chunk_name = string_chunk_name(source);
    debug!("do_string {}", chunk_name);
    state.load_string(source, &chunk_name)
}
