use thiserror::Error;

use crate::runtime::{error_code::ErrorCode, value::Value};

/// A raised script error travelling up to the nearest protected call.
///
/// `value` is whatever was raised: usually a located message string, but
/// `error({...})` raises tables too.
#[derive(Debug, Clone, Error)]
#[error("{code}: {value}")]
pub struct Fault {
    pub code: ErrorCode,
    pub value: Value,
}

impl Fault {
    pub fn new(code: ErrorCode, value: Value) -> Self {
        Self { code, value }
    }

    /// A runtime error whose message is used verbatim.
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::RuntimeError, Value::from(message.into()))
    }

    pub fn out_of_memory() -> Self {
        Self::new(ErrorCode::OutOfMemory, Value::string("not enough memory"))
    }

    /// Message text; non-string error objects render as their plain form.
    pub fn message(&self) -> String {
        self.value.to_string()
    }
}
