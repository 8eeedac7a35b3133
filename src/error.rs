use std::fmt::{Display, Formatter, Result as FmtResult};
use std::io::Error as IoError;

/// The kind of error raised by the engine.
///
/// `EmptyResult` is intentionally absent: an empty candidate set after
/// planning and pruning is not an error, it is represented as a `search`
/// result with zero entries (see [`crate::engine::SearchOutcome`]).
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidConfig,
    IndexNotReady,
    CorruptIndex,
    IoError,
}

/// The native error type for IMI engine operations.
#[derive(Debug)]
pub struct Error {
    /// Represents the cause or source of the error.
    pub code: ErrorCode,
    /// Details about the error and why it occurred.
    pub message: String,
}

impl Error {
    /// Creates a new error instance.
    /// - `code`: Error code.
    /// - `message`: Details why the error occurred.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        Error::new(ErrorCode::InvalidConfig, message)
    }

    pub(crate) fn index_not_ready(message: impl Into<String>) -> Self {
        Error::new(ErrorCode::IndexNotReady, message)
    }

    pub(crate) fn corrupt_index(message: impl Into<String>) -> Self {
        Error::new(ErrorCode::CorruptIndex, message)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for Error {}

impl From<IoError> for Error {
    fn from(err: IoError) -> Self {
        Error::new(ErrorCode::IoError, err.to_string())
    }
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
