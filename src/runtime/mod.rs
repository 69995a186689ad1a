//! Embedded script runtime: values, tables, registry and interpreter.
//!
//! # Cycle Handling
//! Tables and closures are `Rc`-shared and mutable, so scripts routinely build
//! cycles (`T.__index = T`, a closure stored in the table it captures). No
//! collector runs while a [`State`](state::State) is alive. When the state is
//! dropped it walks everything reachable from the stack, the registry and the
//! globals, clears those tables and resets captured variables to `nil`, which
//! releases the cycles. Values copied out to the host survive as plain data
//! but reachable tables are emptied.
use crate::runtime::fault::Fault;

pub mod builtin_function;
pub mod builtins;
pub mod chunk_cache;
pub mod closure;
pub mod config;
pub mod error_code;
pub mod fault;
pub mod function;
pub mod leak_detector;
pub mod registry;
pub mod scope;
pub mod state;
pub mod table;
pub mod table_key;
pub mod value;

mod interpreter;


pub type BuiltinFn = fn(&mut State, Vec<Value>) -> Result<Vec<Value>, Fault>;

pub use config::{RuntimeConfig, SetupError};
pub use error_code::ErrorCode;
pub use registry::RegistryKey;
pub use state::{NO_POSITION, StackPos, State};
pub use value::{TypeTag, Value};
