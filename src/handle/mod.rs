//! Host-side handles over a runtime connection.
//!
//! Two kinds of value live here. Short-lived views ([`PendingResult`],
//! [`Item`], [`Field`]) read values that are still resident on the value
//! stack and put the stack back when they go away. Owning handles
//! ([`ObjectHandle`] and its capability wrappers) keep a value alive through a
//! registry slot and may be stored anywhere.
//!
//! # Stack Balance
//! Every operation here leaves the stack at the depth it found it once the
//! returned views are dropped. Scoped pushes go through [`StackGuard`];
//! results are claimed by a [`PendingResult`] built from a [`StackMark`].
//!
//! # Registry Ownership
//! A [`RegistryHandle`] owns at most one slot and releases it on drop. The
//! only way to duplicate a slot is `Clone`, which allocates a new one.
pub mod call;
pub mod class;
pub mod error;
pub mod function;
pub mod lua;
pub mod marshal;
pub mod object;
pub mod pending;
pub mod registry_handle;
pub mod stack_mark;
pub mod table;

#[cfg(test)]
mod call_test;
#[cfg(test)]
mod class_test;
#[cfg(test)]
mod marshal_test;
#[cfg(test)]
mod pending_test;
#[cfg(test)]
mod stack_mark_test;

pub use call::CallBuilder;
pub use class::ClassHandle;
pub use error::RuntimeError;
pub use function::{BoundMethod, FunctionHandle};
pub use lua::Lua;
pub use marshal::{CallArg, FromStack, ToStack, read_or_default};
pub use object::{MetaMethod, ObjectHandle};
pub use pending::{Item, PendingResult};
pub use registry_handle::RegistryHandle;
pub use stack_mark::{StackChecker, StackGuard, StackMark};
pub use table::{Field, TableHandle};
