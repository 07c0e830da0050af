//! An open AT command session.
//!
//! A [`Channel`] owns one port plus its two stream views: the line-buffered
//! read side and the fully buffered write side. Dropping the channel
//! releases all three together.

use crate::at::line::LineReader;
use crate::at::{ReadRequest, ReadResponse};
use crate::error::AtResult;
use crate::port::SerialPortAdapter;
use crate::profile::Profile;
use std::time::Duration;
use tracing::{debug, info_span, warn, Span};

#[cfg(unix)]
use crate::port::{PortError, TermiosSnapshot, TtyPort};
#[cfg(unix)]
use tracing::error;

/// Pause after opening before the first flush or drain.
pub const SETTLE_DELAY: Duration = Duration::from_millis(5);

/// An initialized duplex session over one port.
#[derive(Debug)]
pub struct Channel<P: SerialPortAdapter> {
    pub(crate) port: P,
    pub(crate) lines: LineReader,
    pub(crate) outbound: Vec<u8>,
    pub(crate) profile: Profile,
    pub(crate) span: Span,
}

#[cfg(unix)]
impl Channel<TtyPort> {
    /// Open and configure the profile's device.
    ///
    /// # Example
    /// ```no_run
    /// use at_tty::{Channel, Profile};
    ///
    /// let profile = Profile::new("/dev/ttyUSB2").with_baud_rate(115200);
    /// let mut channel = Channel::open(&profile)?;
    /// channel.write("AT+CSQ")?;
    /// let response = channel.read_keyword("+CSQ:");
    /// println!("{:?}: {:?}", response.outcome, response.message);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(profile: &Profile) -> AtResult<Self> {
        let port = TtyPort::open(&profile.device, profile.baud_rate, profile.data_bits)
            .map_err(|e| {
                error!("Error opening tty device {}: {e}", profile.device.display());
                e
            })?;
        Ok(Self::from_port(port, profile))
    }

    /// Terminal attributes captured before raw mode was applied.
    pub fn saved_settings(&self) -> &TermiosSnapshot {
        self.port.saved_settings()
    }

    /// Terminal attributes currently in effect.
    pub fn current_settings(&self) -> Result<TermiosSnapshot, PortError> {
        self.port.current_settings()
    }
}

impl<P: SerialPortAdapter> Channel<P> {
    /// Wrap an already configured port.
    ///
    /// After a short settle delay, stale modem output is actively drained
    /// when the profile asks for it; otherwise kernel buffers are flushed.
    /// Failures here are logged and do not prevent the session.
    pub fn from_port(port: P, profile: &Profile) -> Self {
        let span = info_span!("at_session", device = %port.name());
        let mut channel = Self {
            port,
            lines: LineReader::default(),
            outbound: Vec::new(),
            profile: profile.clone(),
            span,
        };

        std::thread::sleep(SETTLE_DELAY);

        let span = channel.span.clone();
        let _entered = span.enter();
        if profile.clear_modem_side_buffers {
            debug!("Clearing modem side buffers");
            if let Err(e) = channel.drain_modem_buffers() {
                warn!("Failed to clear modem side buffers: {e}");
            }
        } else if let Err(e) = channel.flush_kernel_buffers() {
            warn!("Failed to clear some buffers after open: {e}");
        }
        channel
    }

    /// Write `command` and read its response in one exchange.
    pub fn command(&mut self, command: &str, keyword: Option<&str>) -> AtResult<ReadResponse> {
        self.write(command)?;
        let request = match keyword {
            Some(keyword) => ReadRequest::keyword(keyword),
            None => ReadRequest::new(),
        };
        Ok(self.read_with(request))
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn name(&self) -> &str {
        self.port.name()
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    /// The span every event of this session is recorded under.
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Close the write view, the read view and the device, in that order.
    ///
    /// Failures are logged; cleanup always runs to completion.
    pub fn close(mut self) {
        let span = self.span.clone();
        let _entered = span.enter();

        if let Err(e) = self.flush_outbound() {
            warn!("Failed to flush output stream on close: {e}");
        }
        let discarded = self.lines.discard();
        if discarded > 0 {
            debug!("Discarded {discarded} unread bytes on close");
        }
        if let Err(e) = self.port.close() {
            warn!("Failed to close device: {e}");
        }
    }
}
