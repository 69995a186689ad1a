use std::fmt;

/// Outcome of a protected runtime operation.
///
/// The numeric values follow the status codes of the reference interpreter;
/// `NoConnection` is host-side only and never produced by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ErrorCode {
    #[default]
    NoError,
    RuntimeError,
    SyntaxError,
    OutOfMemory,
    /// Reserved; no code path produces it.
    ErrorInErrorHandler,
    FileError,
    NoConnection,
}

impl ErrorCode {
    pub fn as_i32(self) -> i32 {
        match self {
            ErrorCode::NoError => 0,
            ErrorCode::RuntimeError => 2,
            ErrorCode::SyntaxError => 3,
            ErrorCode::OutOfMemory => 4,
            ErrorCode::ErrorInErrorHandler => 5,
            ErrorCode::FileError => 6,
            ErrorCode::NoConnection => 100,
        }
    }

    pub fn is_ok(self) -> bool {
        self == ErrorCode::NoError
    }

    pub fn is_error(self) -> bool {
        !self.is_ok()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::NoError => "no error",
            ErrorCode::RuntimeError => "runtime error",
            ErrorCode::SyntaxError => "syntax error",
            ErrorCode::OutOfMemory => "out of memory",
            ErrorCode::ErrorInErrorHandler => "error in error handler",
            ErrorCode::FileError => "file error",
            ErrorCode::NoConnection => "no runtime connection",
        };
        write!(f, "{}", s)
    }
}
