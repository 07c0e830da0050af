//! The response reader: accumulates lines until a terminator or a deadline.
//!
//! Two deadlines bound every read. The relative one is `profile.timeout`
//! from the last reset; with `greedy_read` it restarts whenever a line
//! arrives. The absolute one is fixed at `ABSOLUTE_TIMEOUT_FACTOR` times the
//! timeout from the start of the call, so a peer that never stops talking
//! cannot hold the caller forever.

use super::message::Message;
use super::outcome::{ReadOutcome, ReadRequest, ReadResponse};
use super::terminator::{classify, Termination};
use crate::channel::Channel;
use crate::port::{SerialPortAdapter, POLL_INTERVAL};
use crate::profile::deadline_after;
use std::time::{Duration, Instant};
use tracing::{debug, error};

/// How long a line without its newline may sit idle before it is handed
/// out as-is (one VTIME quantum). Prompts such as `> ` end this way.
pub const PARTIAL_LINE_GRACE: Duration = Duration::from_millis(100);

impl<P: SerialPortAdapter> Channel<P> {
    /// Read until a generic terminator line, capturing the response.
    pub fn read(&mut self) -> ReadResponse {
        self.read_with(ReadRequest::new())
    }

    /// Read until a line starting with `keyword`, capturing the response.
    ///
    /// A generic terminator seen first ends the read with
    /// [`ReadOutcome::KeywordNotMatched`].
    pub fn read_keyword(&mut self, keyword: &str) -> ReadResponse {
        self.read_with(ReadRequest::keyword(keyword))
    }

    pub fn read_with(&mut self, request: ReadRequest<'_>) -> ReadResponse {
        let span = self.span.clone();
        let _entered = span.enter();

        let keyword = request.keyword.filter(|k| !k.is_empty());
        let timeout = self.profile.timeout;
        let start = Instant::now();
        let hard_deadline = deadline_after(start, self.profile.absolute_timeout());
        let mut origin = start;

        let mut message = request.capture.then(Message::new);
        let mut data_received = false;
        let mut surface_partial = false;
        // When the last wait reported readable, and when it started.
        let mut woke_ready: Option<Instant> = None;
        let mut outcome = None;

        loop {
            let now = Instant::now();
            let deadline = deadline_after(origin, timeout).min(hard_deadline);
            if now >= deadline {
                if now >= hard_deadline {
                    debug!("Absolute timeout reached");
                }
                break;
            }

            let line = match self.lines.next_line(&mut self.port, surface_partial) {
                Ok(Some(line)) => line,
                Ok(None) => {
                    let budget = deadline - now;
                    if let Some(waited) = woke_ready.take() {
                        // Readable yet empty: keep each such round at least one
                        // poll quantum long instead of spinning.
                        let spent = waited.elapsed();
                        if self.lines.last_pull() == 0 && spent < POLL_INTERVAL {
                            std::thread::sleep((POLL_INTERVAL - spent).min(budget));
                            continue;
                        }
                    }
                    let wait = if self.lines.has_pending() {
                        budget.min(PARTIAL_LINE_GRACE)
                    } else {
                        budget
                    };
                    let waited = Instant::now();
                    match self.port.wait_readable(wait) {
                        Ok(ready) => {
                            woke_ready = ready.then_some(waited);
                            surface_partial = !ready && self.lines.has_pending();
                        }
                        Err(e) => {
                            error!("Waiting on {} failed: {e}", self.port.name());
                            outcome = Some(ReadOutcome::CommError);
                            break;
                        }
                    }
                    continue;
                }
                Err(e) => {
                    error!("Read from {} failed: {e}", self.port.name());
                    outcome = Some(ReadOutcome::CommError);
                    break;
                }
            };

            surface_partial = false;
            woke_ready = None;
            data_received = true;
            debug!("Read: {}", String::from_utf8_lossy(&line).trim_end());

            if self.profile.greedy_read {
                origin = Instant::now();
            }

            if let Some(message) = message.as_mut() {
                if let Err(e) = message.append(&line) {
                    error!("{e}");
                    outcome = Some(ReadOutcome::BufferOverflow);
                    break;
                }
            }

            match classify(&line, keyword) {
                Termination::None => {}
                Termination::Keyword => {
                    debug!("Keyword '{}' found", keyword.unwrap_or_default());
                    outcome = Some(ReadOutcome::Success);
                    break;
                }
                Termination::Generic if keyword.is_none() => {
                    outcome = Some(ReadOutcome::Success);
                    break;
                }
                Termination::Generic => {
                    debug!(
                        "Terminator arrived before keyword '{}'",
                        keyword.unwrap_or_default()
                    );
                    outcome = Some(ReadOutcome::KeywordNotMatched);
                    break;
                }
            }
        }

        let outcome = match outcome {
            Some(outcome) => outcome,
            None if !data_received => {
                error!("No data received within {timeout:?}");
                ReadOutcome::CommError
            }
            None => {
                debug!("Timed out waiting for a terminator line");
                ReadOutcome::TimeoutWaitingTerminator
            }
        };

        ReadResponse {
            outcome,
            message,
            keyword: keyword.map(str::to_owned),
        }
    }
}
