//! Core traits for serial port abstraction.
//!
//! Defines the `SerialPortAdapter` trait that lets the AT transport run over
//! a real TTY or a scripted mock, plus the line-setting tables the
//! configurator maps profile values through.

use super::error::PortError;
use std::time::Duration;

/// Sleep between poll attempts when a port cannot wait for readiness.
pub const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Supported line speeds. Anything else falls back to 115200.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BaudRate {
    B4800,
    B9600,
    B19200,
    B38400,
    B57600,
    #[default]
    B115200,
}

impl BaudRate {
    pub const ALL: [BaudRate; 6] = [
        BaudRate::B4800,
        BaudRate::B9600,
        BaudRate::B19200,
        BaudRate::B38400,
        BaudRate::B57600,
        BaudRate::B115200,
    ];

    /// Exact lookup; `None` for rates outside the table.
    pub fn from_u32(rate: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.as_u32() == rate)
    }

    /// Lookup with the 115200 fallback applied.
    pub fn from_u32_or_default(rate: u32) -> Self {
        Self::from_u32(rate).unwrap_or_default()
    }

    pub fn as_u32(self) -> u32 {
        match self {
            Self::B4800 => 4800,
            Self::B9600 => 9600,
            Self::B19200 => 19200,
            Self::B38400 => 38400,
            Self::B57600 => 57600,
            Self::B115200 => 115200,
        }
    }

    /// The termios speed constant for this rate.
    #[cfg(unix)]
    pub fn speed(self) -> libc::speed_t {
        match self {
            Self::B4800 => libc::B4800,
            Self::B9600 => libc::B9600,
            Self::B19200 => libc::B19200,
            Self::B38400 => libc::B38400,
            Self::B57600 => libc::B57600,
            Self::B115200 => libc::B115200,
        }
    }

    #[cfg(unix)]
    pub fn from_speed(speed: libc::speed_t) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.speed() == speed)
    }
}

/// Number of data bits per character. Anything outside 5..=8 falls back to 8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DataBits {
    Five,
    Six,
    Seven,
    #[default]
    Eight,
}

impl DataBits {
    pub const ALL: [DataBits; 4] = [
        DataBits::Five,
        DataBits::Six,
        DataBits::Seven,
        DataBits::Eight,
    ];

    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            5 => Some(Self::Five),
            6 => Some(Self::Six),
            7 => Some(Self::Seven),
            8 => Some(Self::Eight),
            _ => None,
        }
    }

    pub fn from_bits_or_default(bits: u8) -> Self {
        Self::from_bits(bits).unwrap_or_default()
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Self::Five => 5,
            Self::Six => 6,
            Self::Seven => 7,
            Self::Eight => 8,
        }
    }

    /// The `CSIZE` field value for this width.
    #[cfg(unix)]
    pub fn char_size(self) -> libc::tcflag_t {
        match self {
            Self::Five => libc::CS5,
            Self::Six => libc::CS6,
            Self::Seven => libc::CS7,
            Self::Eight => libc::CS8,
        }
    }

    #[cfg(unix)]
    pub fn from_char_size(cflag: libc::tcflag_t) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|b| b.char_size() == cflag & libc::CSIZE)
    }
}

/// Trait for serial port I/O operations.
///
/// Reads are non-blocking: when nothing is queued, `read_bytes` returns
/// either `Ok(0)` or a transient error (see [`PortError::is_transient`]).
pub trait SerialPortAdapter: Send + std::fmt::Debug {
    /// Write bytes to the serial port.
    ///
    /// Returns the number of bytes actually written.
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError>;

    /// Read whatever bytes are ready into the provided buffer.
    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError>;

    /// Get the name/path of this serial port.
    fn name(&self) -> &str;

    /// Discard both the kernel input and output queues.
    fn clear_buffers(&mut self) -> Result<(), PortError>;

    /// Block until data is readable or `timeout` elapses.
    ///
    /// Returns `true` when data is (probably) ready. The default cannot see
    /// readiness, so it sleeps one poll quantum and reports `true`, which
    /// turns the caller's loop into plain sleep-and-retry polling.
    fn wait_readable(&mut self, timeout: Duration) -> Result<bool, PortError> {
        std::thread::sleep(timeout.min(POLL_INTERVAL));
        Ok(true)
    }

    /// Release the underlying device, reporting a failing close.
    fn close(self) -> Result<(), PortError>
    where
        Self: Sized,
    {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baud_rate_table() {
        for rate in [4800, 9600, 19200, 38400, 57600, 115200] {
            let baud = BaudRate::from_u32(rate).unwrap();
            assert_eq!(baud.as_u32(), rate);
        }
    }

    #[test]
    fn test_baud_rate_fallback() {
        assert_eq!(BaudRate::from_u32(300), None);
        assert_eq!(BaudRate::from_u32_or_default(300), BaudRate::B115200);
        assert_eq!(BaudRate::from_u32_or_default(921_600), BaudRate::B115200);
        assert_eq!(BaudRate::from_u32_or_default(0), BaudRate::B115200);
    }

    #[test]
    fn test_data_bits_fallback() {
        assert_eq!(DataBits::from_bits(7), Some(DataBits::Seven));
        assert_eq!(DataBits::from_bits_or_default(4), DataBits::Eight);
        assert_eq!(DataBits::from_bits_or_default(9), DataBits::Eight);
        for bits in DataBits::ALL {
            assert_eq!(DataBits::from_bits(bits.as_u8()), Some(bits));
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_termios_constants_round_trip() {
        for baud in BaudRate::ALL {
            assert_eq!(BaudRate::from_speed(baud.speed()), Some(baud));
        }
        for bits in DataBits::ALL {
            assert_eq!(DataBits::from_char_size(bits.char_size()), Some(bits));
        }
        assert_eq!(BaudRate::B9600.speed(), libc::B9600);
        assert_eq!(DataBits::Seven.char_size(), libc::CS7);
    }
}
