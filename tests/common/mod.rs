//! Shared test utilities for at-tty tests.
//!
//! - Mock-backed channels with short timeouts
//! - A log capture writer for per-test tracing output

#![allow(dead_code)]

use at_tty::{Channel, MockSerialPort, Profile};
use parking_lot::Mutex;
use std::io;
use std::sync::Arc;
use std::time::Duration;

/// A profile for a mock device with a millisecond-scale timeout.
pub fn fast_profile(timeout_ms: u64) -> Profile {
    Profile::new("MOCK0").with_timeout(Duration::from_millis(timeout_ms))
}

/// Open a channel over a fresh mock port.
///
/// Returns the channel and a handle to script the modem side. Anything
/// queued on the handle before this call would be flushed by the open.
pub fn mock_channel(profile: &Profile) -> (Channel<MockSerialPort>, MockSerialPort) {
    let port = MockSerialPort::new(profile.device.display().to_string());
    let handle = port.clone();
    (Channel::from_port(port, profile), handle)
}

/// Collects everything a fmt subscriber writes.
#[derive(Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).into_owned()
    }

    /// A debug-level subscriber writing into this capture.
    pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync {
        let capture = self.clone();
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || capture.clone())
            .finish()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
