//! AT-command transport over a [`Channel`](crate::Channel).
//!
//! - `writer`: command writer (`write`, `write_raw`)
//! - `reader`: timeout-bounded response reader (`read`, `read_keyword`)
//! - `drain`: kernel flush and active drain of stale modem output
//! - `terminator`: terminator-line classification
//! - `message`: accumulated response text

pub mod drain;
pub(crate) mod line;
pub mod message;
pub mod outcome;
pub mod reader;
pub mod terminator;
pub mod writer;

pub use drain::{DrainReport, DRAIN_WINDOW};
pub use line::LINE_CAPACITY;
pub use message::{Message, MAX_MESSAGE_LEN};
pub use outcome::{ReadOutcome, ReadRequest, ReadResponse};
pub use reader::PARTIAL_LINE_GRACE;
pub use terminator::{classify, Termination, GENERIC_TERMINATORS};
pub use writer::{terminated, LINE_TERMINATOR, WRITE_SETTLE};
