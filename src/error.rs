//! Transport-level errors.

use crate::at::ReadOutcome;
use crate::port::PortError;
use thiserror::Error;

/// Unified error type for AT exchanges.
///
/// Every variant corresponds to one non-success [`ReadOutcome`].
#[derive(Debug, Error)]
pub enum AtError {
    /// The device or its streams failed.
    #[error("Communication error: {0}")]
    Comm(#[from] PortError),

    /// Nothing at all arrived within the read window.
    #[error("No response received from the device")]
    NoResponse,

    /// Some lines arrived but no terminator line did.
    #[error("Timed out waiting for a terminator line")]
    Timeout,

    /// A generic terminator arrived while a specific keyword was expected.
    #[error("Expected keyword '{0}' but the response ended without it")]
    KeywordNotMatched(String),

    /// The accumulated response grew past the hard cap.
    #[error("Response exceeded the {limit} byte limit")]
    BufferOverflow { limit: usize },
}

impl AtError {
    pub fn outcome(&self) -> ReadOutcome {
        match self {
            Self::Comm(_) | Self::NoResponse => ReadOutcome::CommError,
            Self::Timeout => ReadOutcome::TimeoutWaitingTerminator,
            Self::KeywordNotMatched(_) => ReadOutcome::KeywordNotMatched,
            Self::BufferOverflow { .. } => ReadOutcome::BufferOverflow,
        }
    }
}

/// A specialized `Result` type for AT exchanges.
pub type AtResult<T> = Result<T, AtError>;
