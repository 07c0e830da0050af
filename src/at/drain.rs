//! Buffer draining: resynchronizing with a modem that has stale output.

use crate::channel::Channel;
use crate::error::{AtError, AtResult};
use crate::port::{PortError, SerialPortAdapter};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// Upper bound on one active drain.
pub const DRAIN_WINDOW: Duration = Duration::from_secs(1);

const PREVIEW_CHARS: usize = 50;

/// What an active drain threw away.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    pub lines: usize,
    pub bytes: usize,
    pub elapsed: Duration,
}

fn preview(line: &[u8]) -> String {
    let text = String::from_utf8_lossy(line);
    let text = text.trim_end();
    let mut shown: String = text.chars().take(PREVIEW_CHARS).collect();
    if text.chars().count() > PREVIEW_CHARS {
        shown.push_str("...");
    }
    shown
}

impl<P: SerialPortAdapter> Channel<P> {
    /// Flush the write view, drop the read view's unread bytes and discard
    /// the kernel input and output queues.
    ///
    /// Every step runs even if an earlier one fails; the first failure is
    /// returned.
    pub fn flush_kernel_buffers(&mut self) -> Result<(), PortError> {
        let span = self.span.clone();
        let _entered = span.enter();
        let mut first_error = None;

        if let Err(e) = self.flush_outbound() {
            error!("Failed to flush output stream: {e}");
            first_error.get_or_insert(e);
        }

        let discarded = self.lines.discard();
        if discarded > 0 {
            debug!("Discarded {discarded} buffered input bytes");
        }

        match self.port.clear_buffers() {
            Ok(()) => debug!("TTY buffers cleared successfully"),
            Err(e) => {
                error!("{e}");
                first_error.get_or_insert(e);
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Read and discard whatever the modem still has queued.
    ///
    /// Stops at the first attempt that finds nothing, and never runs past
    /// [`DRAIN_WINDOW`]. Partial lines are discarded too.
    pub fn drain_modem_buffers(&mut self) -> AtResult<DrainReport> {
        let span = self.span.clone();
        let _entered = span.enter();

        self.flush_kernel_buffers().map_err(|e| {
            error!("Failed to flush TTY kernel buffers before drain");
            AtError::Comm(e)
        })?;

        let start = Instant::now();
        let mut report = DrainReport::default();
        while start.elapsed() < DRAIN_WINDOW {
            match self.lines.next_line(&mut self.port, true) {
                Ok(Some(line)) => {
                    report.lines += 1;
                    report.bytes += line.len();
                    debug!(
                        "Drained {} bytes from modem buffer: {}",
                        line.len(),
                        preview(&line)
                    );
                }
                Ok(None) => break,
                Err(e) => {
                    debug!("Drain stopped on read error: {e}");
                    break;
                }
            }
        }

        if let Err(e) = self.flush_kernel_buffers() {
            warn!("Failed final TTY buffer flush: {e}");
        }

        report.elapsed = start.elapsed();
        if report.bytes > 0 {
            debug!(
                "Drained {} bytes from modem buffer in {:.2?}",
                report.bytes, report.elapsed
            );
        } else {
            debug!("No data found in modem buffer (buffer was already clean)");
        }
        Ok(report)
    }
}
