//! Line assembly on top of a non-blocking port.

use crate::port::{PortError, SerialPortAdapter};
use memchr::memchr;

/// Longest line handed out at once; longer physical lines are split here.
pub const LINE_CAPACITY: usize = 1024;

/// The read side of a channel: bytes pulled from the port that have not
/// been handed out as a line yet.
#[derive(Debug, Default)]
pub(crate) struct LineReader {
    pending: Vec<u8>,
    /// Bytes pulled from the port by the last `next_line` call.
    last_pull: usize,
}

impl LineReader {
    /// Return the next line, pulling whatever the port has ready.
    ///
    /// A trailing partial line is only returned when `surface_partial` is
    /// set; otherwise it stays pending until its newline arrives.
    pub fn next_line<P: SerialPortAdapter>(
        &mut self,
        port: &mut P,
        surface_partial: bool,
    ) -> Result<Option<Vec<u8>>, PortError> {
        let mut chunk = [0u8; LINE_CAPACITY];
        self.last_pull = 0;
        loop {
            if let Some(line) = self.take_complete() {
                return Ok(Some(line));
            }
            match port.read_bytes(&mut chunk) {
                Ok(0) => break,
                Ok(n) => {
                    self.last_pull += n;
                    self.pending.extend_from_slice(&chunk[..n]);
                }
                Err(e) if e.is_transient() => break,
                Err(e) => return Err(e),
            }
        }

        if surface_partial && !self.pending.is_empty() {
            return Ok(Some(std::mem::take(&mut self.pending)));
        }
        Ok(None)
    }

    pub fn last_pull(&self) -> usize {
        self.last_pull
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Drop buffered input. Returns how many bytes were discarded.
    pub fn discard(&mut self) -> usize {
        let n = self.pending.len();
        self.pending.clear();
        n
    }

    fn take_complete(&mut self) -> Option<Vec<u8>> {
        let end = match memchr(b'\n', &self.pending) {
            Some(i) if i < LINE_CAPACITY => i + 1,
            _ if self.pending.len() >= LINE_CAPACITY => LINE_CAPACITY,
            _ => return None,
        };
        Some(self.pending.drain(..end).collect())
    }
}
