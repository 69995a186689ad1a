use log::{debug, trace};

use crate::{
    handle::{
        lua::Lua, marshal::ToStack, object::ObjectHandle, pending::PendingResult,
        stack_mark::StackMark,
    },
    runtime::error_code::ErrorCode,
};

/// Accumulates a callee and its arguments on the stack, then runs them as
/// one protected call.
///
/// Each `append` pushes exactly one value. Dropping a builder that was never
/// invoked puts the stack back.
#[derive(Debug)]
pub struct CallBuilder {
    lua: Option<Lua>,
    mark: Option<StackMark>,
    nargs: usize,
    id: String,
    overflow: bool,
}

impl CallBuilder {
    /// Pushes `callee`. A callee in error is pushed as `nil`, so the call
    /// fails with a runtime error.
    pub fn new(callee: &ObjectHandle) -> Self {
        let Some(lua) = callee.connection() else {
            return Self::detached(callee.id());
        };
        let mut state = lua.state();
        let mark = StackMark::new(&state);
        let overflow = !state.check_stack(1);
        if !overflow {
            callee.push_onto(&mut state);
        }
        Self {
            lua: Some(lua.clone()),
            mark: Some(mark),
            nargs: 0,
            id: callee.id().to_string(),
            overflow,
        }
    }

    /// Looks up `name` on `receiver` and pushes it followed by the receiver,
    /// which becomes the first argument.
    pub fn method(receiver: &ObjectHandle, name: &str) -> Self {
        let id = format!("{}:{}", receiver.id(), name);
        let Some(lua) = receiver.connection() else {
            return Self::detached(&id);
        };
        let mut state = lua.state();
        let mark = StackMark::new(&state);
        let overflow = !state.check_stack(2);
        if !overflow {
            receiver.push_onto(&mut state);
            if let Err(fault) = state.get_field(-1, name) {
                // Calling the nil in its place reports the failure.
                debug!("method lookup {} failed: {}", id, fault.message());
                state.push_nil();
            }
            state.insert(-2);
        }
        Self {
            lua: Some(lua.clone()),
            mark: Some(mark),
            nargs: 1,
            id,
            overflow,
        }
    }

    fn detached(id: &str) -> Self {
        Self {
            lua: None,
            mark: None,
            nargs: 0,
            id: id.to_string(),
            overflow: false,
        }
    }

    /// Number of arguments pushed so far.
    pub fn arg_count(&self) -> usize {
        self.nargs
    }

    pub fn append(&mut self, arg: impl ToStack) -> &mut Self {
        let Some(lua) = self.lua.clone() else {
            return self;
        };
        if !self.overflow {
            let mut state = lua.state();
            if state.check_stack(1) {
                arg.push_to(&mut state);
                self.nargs += 1;
            } else {
                self.overflow = true;
            }
        }
        self
    }

    /// Makes the protected call. The result's error prefix is
    /// `Function call <id>()`.
    pub fn invoke(mut self) -> PendingResult {
        let (Some(lua), Some(mark)) = (self.lua.take(), self.mark.take()) else {
            return PendingResult::detached();
        };
        let id = if self.id.is_empty() {
            "<anonymous>"
        } else {
            self.id.as_str()
        };
        let prefix = format!("Function call {}()", id);

        let mut state = lua.state();
        let code = if self.overflow {
            state.set_top(mark.depth());
            state.push("stack overflow");
            ErrorCode::RuntimeError
        } else {
            trace!("call {} with {} arguments", id, self.nargs);
            state.pcall(self.nargs, None)
        };
        PendingResult::from_mark(&lua, &mut state, mark, code, &prefix)
    }
}

impl Drop for CallBuilder {
    fn drop(&mut self) {
        let (Some(lua), Some(mark)) = (&self.lua, self.mark.take()) else {
            return;
        };
        if let Ok(mut state) = lua.try_state() {
            trace!("call builder {} dropped before invoke", self.id);
            mark.restore(&mut state);
        }
    }
}
