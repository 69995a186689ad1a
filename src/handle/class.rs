use crate::handle::{
    call::CallBuilder,
    function::{BoundMethod, FunctionHandle},
    marshal::CallArg,
    object::{ObjectHandle, capability_handle},
    pending::PendingResult,
    table::field_of,
};

/// Owned reference to an object whose methods live in its fields or in its
/// metatable's `__index` chain.
#[derive(Debug, Clone)]
pub struct ClassHandle(ObjectHandle);

capability_handle!(ClassHandle);

impl ClassHandle {
    /// Looks up `name` and pairs it with this object.
    pub fn bound_method(&self, name: &str) -> BoundMethod {
        let method = FunctionHandle::from(&field_of(&self.0, name.into())).with_id(name);
        BoundMethod::new(self.0.clone(), method)
    }

    /// `object:name(args...)` in one step.
    pub fn call_method(&self, name: &str, args: &[CallArg<'_>]) -> PendingResult {
        let mut call = CallBuilder::method(&self.0, name);
        for arg in args {
            call.append(arg);
        }
        call.invoke()
    }
}
