use thiserror::Error;

use crate::runtime::{error_code::ErrorCode, fault::Fault};

/// Failure of a handle-level mutation, carried as data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct RuntimeError {
    pub code: ErrorCode,
    pub message: String,
}

impl RuntimeError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The handle was never connected to a runtime.
    pub fn no_connection() -> Self {
        Self::new(ErrorCode::NoConnection, "No runtime connection")
    }
}

impl From<Fault> for RuntimeError {
    fn from(fault: Fault) -> Self {
        Self::new(fault.code, fault.message())
    }
}
