//! Common result and error types for the Tessera toolkit.

/// The standard result type for internal invariant checks.
///
/// `Err` indicates a programming error inside Tessera (an out-of-contract
/// call, a broken invariant), never a problem with user-supplied
/// architecture input. User-input problems are reported through the typed
/// error enums of the individual crates.
pub type TesseraResult<T> = Result<T, InternalError>;

/// An internal error indicating a bug in Tessera, not a user input problem.
///
/// These errors should never occur during normal operation. If one does
/// occur, it means there is a logic error in the library that should be
/// fixed.
#[derive(Debug, thiserror::Error)]
#[error("internal error: {message}")]
pub struct InternalError {
    /// Description of the internal error.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}
