//! Per-session modem profile.

use crate::port::{BaudRate, DataBits};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// The absolute read ceiling is this many relative timeouts.
pub const ABSOLUTE_TIMEOUT_FACTOR: u32 = 5;

/// Deadlines further out than this are clamped to it.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// `start + after`, clamped so a huge timeout cannot overflow `Instant`.
pub(crate) fn deadline_after(start: Instant, after: Duration) -> Instant {
    start + after.min(FAR_FUTURE)
}

/// Immutable settings for one command session.
///
/// `baud_rate` and `data_bits` hold the raw requested values; values outside
/// the supported tables are accepted here and fall back to 115200 / 8 when
/// the port is configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// Device node, e.g. `/dev/ttyUSB2`.
    pub device: PathBuf,
    pub baud_rate: u32,
    pub data_bits: u8,
    /// Relative read timeout.
    pub timeout: Duration,
    /// Restart the relative timeout whenever a line arrives.
    pub greedy_read: bool,
    /// Actively read and discard stale modem output at open time.
    pub clear_modem_side_buffers: bool,
}

impl Profile {
    /// A profile for `device` with 115200 8N1 and a 3 second timeout.
    pub fn new(device: impl Into<PathBuf>) -> Self {
        Self {
            device: device.into(),
            baud_rate: BaudRate::default().as_u32(),
            data_bits: DataBits::default().as_u8(),
            timeout: Duration::from_secs(3),
            greedy_read: false,
            clear_modem_side_buffers: false,
        }
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn with_data_bits(mut self, data_bits: u8) -> Self {
        self.data_bits = data_bits;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_greedy_read(mut self, greedy_read: bool) -> Self {
        self.greedy_read = greedy_read;
        self
    }

    pub fn with_clear_modem_side_buffers(mut self, clear: bool) -> Self {
        self.clear_modem_side_buffers = clear;
        self
    }

    /// The speed the port will actually run at.
    pub fn effective_baud_rate(&self) -> BaudRate {
        BaudRate::from_u32_or_default(self.baud_rate)
    }

    /// The character width the port will actually use.
    pub fn effective_data_bits(&self) -> DataBits {
        DataBits::from_bits_or_default(self.data_bits)
    }

    /// Hard ceiling on one read, unaffected by greedy resets.
    pub fn absolute_timeout(&self) -> Duration {
        self.timeout.saturating_mul(ABSOLUTE_TIMEOUT_FACTOR)
    }
}
