//! Error types for the SSAIR core.
//!
//! Every fallible entry point in this crate returns `Result<_, CoreError>`.
//! All three kinds are fatal to the current compile: there are no retries
//! and no partial output (see the design's error-handling section).

use core::fmt;

/// An error raised by the SSAIR core.
#[derive(Debug)]
pub enum CoreError {
    /// A caller passed a value that violates a stated precondition, e.g. a
    /// non-generic attribute passed to a generic-only accessor, or a typed
    /// wrapper constructed from a `Value` of the wrong scalar kind.
    InvalidArgument {
        /// What was being validated.
        context: &'static str,
        /// Human-readable detail, e.g. the offending value's debug form.
        detail: String,
    },
    /// An internal invariant would be violated if the operation proceeded,
    /// e.g. folding a bit-field extract whose inputs are undefined, or a
    /// use-count that would underflow.
    LogicError {
        /// What invariant was about to be violated.
        context: &'static str,
        /// Human-readable detail with offending operands.
        detail: String,
    },
    /// A code path was reached that this design explicitly does not cover.
    /// Reaching one means an upstream pass ran out of order or the input
    /// program is not in the shape this core assumes.
    NotImplemented {
        /// Name of the unimplemented path.
        what: &'static str,
    },
}

impl CoreError {
    /// Build an `InvalidArgument` error with a formatted detail message.
    pub fn invalid_argument(context: &'static str, detail: impl Into<String>) -> Self {
        CoreError::InvalidArgument {
            context,
            detail: detail.into(),
        }
    }

    /// Build a `LogicError` with a formatted detail message.
    pub fn logic_error(context: &'static str, detail: impl Into<String>) -> Self {
        CoreError::LogicError {
            context,
            detail: detail.into(),
        }
    }

    /// Build a `NotImplemented` error naming the unimplemented path.
    pub fn not_implemented(what: &'static str) -> Self {
        CoreError::NotImplemented { what }
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::InvalidArgument { context, detail } => {
                write!(f, "invalid argument in {context}: {detail}")
            }
            CoreError::LogicError { context, detail } => {
                write!(f, "logic error in {context}: {detail}")
            }
            CoreError::NotImplemented { what } => {
                write!(f, "not implemented: {what}")
            }
        }
    }
}

impl std::error::Error for CoreError {}

/// Convenience alias used throughout the crate.
pub type CoreResult<T> = Result<T, CoreError>;
