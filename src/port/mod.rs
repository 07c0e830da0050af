//! Port abstraction layer for serial communication.
//!
//! The AT transport talks to a [`SerialPortAdapter`]; [`TtyPort`] drives a
//! real device and [`MockSerialPort`] stands in for one in tests.

pub mod error;
pub mod mock;
pub mod traits;

#[cfg(unix)]
pub mod tty;

pub use error::PortError;
pub use mock::MockSerialPort;
pub use traits::*;

#[cfg(unix)]
pub use tty::{TermiosSnapshot, TtyPort};
