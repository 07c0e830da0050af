//! Port-specific error types.
//!
//! Device-level failures, kept apart from the transport outcomes in
//! [`crate::error`] so the read loop can tell "no data yet" from a dead line.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during serial port operations.
#[derive(Debug, Error)]
pub enum PortError {
    /// The device node could not be opened.
    #[error("Failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading or applying terminal attributes failed.
    #[error("Failed to {op} terminal attributes: {source}")]
    Termios {
        op: &'static str,
        #[source]
        source: io::Error,
    },

    /// Discarding kernel-side queues failed.
    #[error("Failed to flush TTY kernel buffers: {0}")]
    Flush(#[source] io::Error),

    /// The line dropped: end-of-file on read or POLLHUP without data.
    #[error("Device hung up")]
    HungUp,

    /// An I/O error occurred during port operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl PortError {
    pub fn open(path: &Path, source: io::Error) -> Self {
        Self::Open {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn termios(op: &'static str, source: io::Error) -> Self {
        Self::Termios { op, source }
    }

    /// The error a non-blocking descriptor reports when nothing is queued.
    pub fn would_block() -> Self {
        Self::Io(io::Error::new(
            io::ErrorKind::WouldBlock,
            "No data available",
        ))
    }

    /// True for errors that only mean "try again later".
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted | io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }
}
