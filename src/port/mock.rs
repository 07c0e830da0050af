//! A scripted modem for tests.
//!
//! `MockSerialPort` plays the modem side of a line: bytes can be queued
//! immediately, scheduled to arrive later, or produced periodically by a
//! "chatter" source. Writes are logged and failures can be injected.

use super::error::PortError;
use super::traits::SerialPortAdapter;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A line repeated at a fixed interval, like an unsolicited `RING`.
#[derive(Debug)]
struct Chatter {
    line: Vec<u8>,
    interval: Duration,
    next: Instant,
}

#[derive(Debug, Default)]
struct MockPortState {
    /// Bytes sitting in the kernel input queue.
    ready: VecDeque<u8>,
    /// Bytes still on the wire, ordered by arrival time.
    in_flight: VecDeque<(Instant, Vec<u8>)>,
    chatter: Option<Chatter>,
    write_log: Vec<Vec<u8>>,
    fail_reads: bool,
    fail_writes: bool,
    clear_count: usize,
    closed: bool,
}

impl MockPortState {
    /// Move everything that has arrived by `now` into the input queue.
    fn deliver(&mut self, now: Instant) {
        while self.in_flight.front().is_some_and(|(at, _)| *at <= now) {
            if let Some((_, bytes)) = self.in_flight.pop_front() {
                self.ready.extend(bytes);
            }
        }
        if let Some(chatter) = self.chatter.as_mut() {
            while chatter.next <= now {
                self.ready.extend(chatter.line.iter().copied());
                chatter.next += chatter.interval;
            }
        }
    }

    fn next_arrival(&self) -> Option<Instant> {
        let scheduled = self.in_flight.front().map(|(at, _)| *at);
        let chatter = self.chatter.as_ref().map(|c| c.next);
        match (scheduled, chatter) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}

/// Scripted modem-side endpoint.
///
/// Clones share state, so a test can keep one handle while a `Channel` owns
/// the other.
///
/// # Example
/// ```
/// use at_tty::port::{MockSerialPort, SerialPortAdapter};
///
/// let mut port = MockSerialPort::new("MOCK0");
/// port.enqueue_read(b"OK\r\n");
///
/// let mut buffer = [0u8; 16];
/// let n = port.read_bytes(&mut buffer).unwrap();
/// assert_eq!(&buffer[..n], b"OK\r\n");
///
/// port.write_bytes(b"AT\r\n").unwrap();
/// assert_eq!(port.get_write_log(), vec![b"AT\r\n".to_vec()]);
/// ```
#[derive(Clone)]
pub struct MockSerialPort {
    name: String,
    state: Arc<Mutex<MockPortState>>,
}

impl MockSerialPort {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MockPortState::default())),
        }
    }

    /// Queue bytes that are already readable.
    pub fn enqueue_read(&self, data: &[u8]) {
        self.state.lock().ready.extend(data.iter().copied());
    }

    /// Schedule bytes to become readable after `delay`.
    pub fn enqueue_read_after(&self, delay: Duration, data: &[u8]) {
        let at = Instant::now() + delay;
        let mut state = self.state.lock();
        let index = state.in_flight.partition_point(|(t, _)| *t <= at);
        state.in_flight.insert(index, (at, data.to_vec()));
    }

    /// Bytes that are due now but not yet in the kernel queue, so a kernel
    /// flush does not discard them.
    pub fn enqueue_in_flight(&self, data: &[u8]) {
        self.enqueue_read_after(Duration::ZERO, data);
    }

    /// Emit `line` every `interval` until stopped.
    pub fn start_chatter(&self, line: &[u8], interval: Duration) {
        let interval = interval.max(Duration::from_micros(100));
        self.state.lock().chatter = Some(Chatter {
            line: line.to_vec(),
            interval,
            next: Instant::now() + interval,
        });
    }

    pub fn stop_chatter(&self) {
        self.state.lock().chatter = None;
    }

    /// Make every read fail with a hard I/O error.
    pub fn fail_reads(&self, fail: bool) {
        self.state.lock().fail_reads = fail;
    }

    /// Make every write fail with a hard I/O error.
    pub fn fail_writes(&self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }

    /// Get a copy of every write, one entry per `write_bytes` call.
    pub fn get_write_log(&self) -> Vec<Vec<u8>> {
        self.state.lock().write_log.clone()
    }

    /// All written bytes concatenated.
    pub fn written(&self) -> Vec<u8> {
        self.state.lock().write_log.concat()
    }

    pub fn clear_write_log(&self) {
        self.state.lock().write_log.clear();
    }

    pub fn was_cleared(&self) -> bool {
        self.clear_count() > 0
    }

    pub fn clear_count(&self) -> usize {
        self.state.lock().clear_count
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Bytes currently readable.
    pub fn available_bytes(&self) -> usize {
        let mut state = self.state.lock();
        state.deliver(Instant::now());
        state.ready.len()
    }
}

impl SerialPortAdapter for MockSerialPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let mut state = self.state.lock();
        if state.fail_writes {
            return Err(PortError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "injected write failure",
            )));
        }
        state.write_log.push(data.to_vec());
        Ok(data.len())
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        let mut state = self.state.lock();
        if state.fail_reads {
            return Err(PortError::Io(io::Error::other("injected read failure")));
        }
        state.deliver(Instant::now());

        let n = buffer.len().min(state.ready.len());
        if n == 0 {
            return Err(PortError::would_block());
        }
        for (slot, byte) in buffer.iter_mut().zip(state.ready.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn clear_buffers(&mut self) -> Result<(), PortError> {
        let mut state = self.state.lock();
        state.ready.clear();
        state.clear_count += 1;
        Ok(())
    }

    fn wait_readable(&mut self, timeout: Duration) -> Result<bool, PortError> {
        let now = Instant::now();
        let next = {
            let mut state = self.state.lock();
            state.deliver(now);
            if !state.ready.is_empty() {
                return Ok(true);
            }
            state.next_arrival()
        };

        match next {
            Some(at) if at <= now + timeout => {
                std::thread::sleep(at.saturating_duration_since(now));
                Ok(true)
            }
            _ => {
                std::thread::sleep(timeout);
                Ok(false)
            }
        }
    }

    fn close(self) -> Result<(), PortError> {
        self.state.lock().closed = true;
        Ok(())
    }
}

impl std::fmt::Debug for MockSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MockSerialPort")
            .field("name", &self.name)
            .field("ready", &state.ready.len())
            .field("in_flight", &state.in_flight.len())
            .finish()
    }
}
