pub mod frontend;
pub mod handle;
pub mod runtime;

pub use handle::{
    BoundMethod, CallArg, ClassHandle, FunctionHandle, Item, Lua, MetaMethod, ObjectHandle,
    PendingResult, RuntimeError, TableHandle,
};
pub use runtime::{ErrorCode, RuntimeConfig, SetupError, TypeTag, Value};
