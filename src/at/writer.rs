//! The command writer.

use crate::channel::Channel;
use crate::error::{AtError, AtResult};
use crate::port::{PortError, SerialPortAdapter, POLL_INTERVAL};
use crate::profile::deadline_after;
use std::io;
use std::time::{Duration, Instant};
use tracing::{debug, error};

/// Appended to every AT command.
pub const LINE_TERMINATOR: &str = "\r\n";

/// Pause after each write so the device can take the bytes.
pub const WRITE_SETTLE: Duration = Duration::from_micros(100);

/// `command` followed by exactly one [`LINE_TERMINATOR`].
pub fn terminated(command: &str) -> AtResult<Vec<u8>> {
    let mut line = Vec::new();
    line.try_reserve_exact(command.len() + LINE_TERMINATOR.len())
        .map_err(|_| {
            error!("Error allocating memory for command");
            PortError::Io(io::Error::from(io::ErrorKind::OutOfMemory))
        })?;
    line.extend_from_slice(command.as_bytes());
    line.extend_from_slice(LINE_TERMINATOR.as_bytes());
    Ok(line)
}

impl<P: SerialPortAdapter> Channel<P> {
    /// Send `command` with `\r\n` appended.
    pub fn write(&mut self, command: &str) -> AtResult<()> {
        let line = terminated(command)?;
        self.write_raw(line)
    }

    /// Send `data` exactly as given.
    pub fn write_raw(&mut self, data: impl AsRef<[u8]>) -> AtResult<()> {
        let span = self.span.clone();
        let _entered = span.enter();

        let data = data.as_ref();
        debug!("Write: {}", String::from_utf8_lossy(data).trim_end());
        self.outbound.extend_from_slice(data);
        let result = self.flush_outbound();
        std::thread::sleep(WRITE_SETTLE);

        result.map_err(|e| {
            error!("Error writing to {}: {e}", self.port.name());
            AtError::Comm(e)
        })
    }

    /// Push the write view's buffered bytes to the port.
    ///
    /// A full output queue is retried for up to one profile timeout. The
    /// buffer is emptied either way so a failed command is never resent.
    pub(crate) fn flush_outbound(&mut self) -> Result<(), PortError> {
        let deadline = deadline_after(Instant::now(), self.profile.timeout);
        let mut written = 0;
        let result = loop {
            if written >= self.outbound.len() {
                break Ok(());
            }
            match self.port.write_bytes(&self.outbound[written..]) {
                Ok(0) => break Err(PortError::Io(io::Error::from(io::ErrorKind::WriteZero))),
                Ok(n) => written += n,
                Err(e) if e.is_transient() && Instant::now() < deadline => {
                    std::thread::sleep(POLL_INTERVAL)
                }
                Err(e) => break Err(e),
            }
        };
        self.outbound.clear();
        result
    }
}
