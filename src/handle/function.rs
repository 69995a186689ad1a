use crate::{
    handle::{
        call::CallBuilder,
        marshal::CallArg,
        object::{ObjectHandle, capability_handle},
        pending::PendingResult,
        stack_mark::StackMark,
        table::TableHandle,
    },
    runtime::error_code::ErrorCode,
};

/// Owned reference to a callable value.
///
/// Calls are protected: script errors come back inside the returned
/// [`PendingResult`], never as a panic.
#[derive(Debug, Clone)]
pub struct FunctionHandle(ObjectHandle);

capability_handle!(FunctionHandle);

impl FunctionHandle {
    pub fn call(&self, args: &[CallArg<'_>]) -> PendingResult {
        let mut call = self.builder();
        for arg in args {
            call.append(arg);
        }
        call.invoke()
    }

    /// Starts a call whose arguments are appended one at a time.
    pub fn builder(&self) -> CallBuilder {
        CallBuilder::new(&self.0)
    }

    /// The function's global table as a one-value result.
    pub fn env(&self) -> PendingResult {
        let Some(lua) = self.connection() else {
            return PendingResult::detached();
        };
        let mut state = lua.state();
        let mark = StackMark::new(&state);
        self.push_onto(&mut state);
        state.get_env(-1);
        state.remove(-2);
        PendingResult::from_mark(lua, &mut state, mark, ErrorCode::NoError, "")
    }

    /// Replaces the function's global table. `false` if the value is not a
    /// script function or `env` is not a table.
    pub fn set_env(&self, env: &TableHandle) -> bool {
        self.0
            .with_pushed(|stack| {
                env.push_onto(stack);
                let replaced = stack.set_env(-2);
                debug_assert!(stack.will_pop(1));
                Ok(replaced)
            })
            .unwrap_or(false)
    }
}

/// A function paired with the receiver it is called on.
///
/// The runtime has no such value; calling it calls the function with the
/// receiver prepended to the arguments.
#[derive(Debug, Clone, Default)]
pub struct BoundMethod {
    object: ObjectHandle,
    method: FunctionHandle,
}

impl BoundMethod {
    pub fn new(object: ObjectHandle, method: FunctionHandle) -> Self {
        Self { object, method }
    }

    /// Pairs the first two values of `result`: receiver, then function.
    pub fn from_result(result: &PendingResult) -> Self {
        Self {
            object: ObjectHandle::from(result.item(1)),
            method: FunctionHandle::from(result.item(2)),
        }
    }

    pub fn reset(&mut self, object: ObjectHandle, method: FunctionHandle) {
        self.object = object;
        self.method = method;
    }

    pub fn is_nil(&self) -> bool {
        self.object.is_nil() || self.method.is_nil()
    }

    pub fn type_name(&self) -> &'static str {
        if self.is_nil() { "nil" } else { "boundmethod" }
    }

    /// `receiver:method`.
    pub fn id(&self) -> String {
        format!("{}:{}", self.object.id(), self.method.id())
    }

    pub fn object(&self) -> &ObjectHandle {
        &self.object
    }

    pub fn method(&self) -> &FunctionHandle {
        &self.method
    }

    pub fn call(&self, args: &[CallArg<'_>]) -> PendingResult {
        let mut call = self.method.builder();
        call.append(&self.object);
        for arg in args {
            call.append(arg);
        }
        call.invoke()
    }
}
