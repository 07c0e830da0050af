//! AT-command transport over a raw-mode serial TTY.
//!
//! Opens and configures a modem's serial device, writes `\r\n`-terminated
//! commands and reads line-oriented responses until `OK`, `ERROR`, a vendor
//! error code or a caller-supplied keyword arrives, or a timeout elapses.
//!
//! # Modules
//!
//! - `config`: TOML configuration with environment overrides
//! - `profile`: immutable per-session settings
//! - `port`: port abstraction, the termios-backed `TtyPort` and a mock
//! - `channel`: an open session (open, close, flush)
//! - `at`: command writer, response reader and buffer drainer
//! - `error`: transport error type
//!
//! # Example
//!
//! ```no_run
//! use at_tty::{Channel, Profile, ReadOutcome};
//! use std::time::Duration;
//!
//! let profile = Profile::new("/dev/ttyUSB2")
//!     .with_timeout(Duration::from_secs(3))
//!     .with_clear_modem_side_buffers(true);
//! let mut channel = Channel::open(&profile)?;
//!
//! channel.write("AT+CREG?")?;
//! let response = channel.read_keyword("+CREG:");
//! if response.outcome == ReadOutcome::Success {
//!     for line in response.message.iter().flat_map(|m| m.lines()) {
//!         println!("{line}");
//!     }
//! }
//! channel.close();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod at;
pub mod channel;
pub mod config;
pub mod error;
pub mod port;
pub mod profile;

pub use at::{DrainReport, Message, ReadOutcome, ReadRequest, ReadResponse};
pub use channel::Channel;
pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
pub use error::{AtError, AtResult};
pub use port::{BaudRate, DataBits, MockSerialPort, PortError, SerialPortAdapter};
pub use profile::Profile;

#[cfg(unix)]
pub use port::{TermiosSnapshot, TtyPort};
