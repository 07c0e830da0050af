//! Raw-mode TTY port built directly on termios.
//!
//! Opening happens in two stages: the device is first opened blocking so the
//! raw-mode attributes negotiate reliably, then closed and reopened
//! non-blocking for command traffic.

use super::error::PortError;
use super::traits::{BaudRate, DataBits, SerialPortAdapter};
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::{AsRawFd, IntoRawFd, RawFd};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// A copy of a terminal configuration.
#[derive(Clone, Copy)]
pub struct TermiosSnapshot(libc::termios);

impl TermiosSnapshot {
    fn read(fd: RawFd) -> Result<Self, PortError> {
        // SAFETY: termios is plain old data and tcgetattr fills it in.
        let mut tty: libc::termios = unsafe { std::mem::zeroed() };
        // SAFETY: `tty` is a live, writable termios for the duration of the call.
        if unsafe { libc::tcgetattr(fd, &mut tty) } != 0 {
            return Err(PortError::termios("read", io::Error::last_os_error()));
        }
        Ok(Self(tty))
    }

    pub fn as_raw(&self) -> &libc::termios {
        &self.0
    }

    /// Output speed, if it is one of the supported rates.
    pub fn baud_rate(&self) -> Option<BaudRate> {
        // SAFETY: reads a field of an initialised termios.
        BaudRate::from_speed(unsafe { libc::cfgetospeed(&self.0) })
    }

    pub fn data_bits(&self) -> Option<DataBits> {
        DataBits::from_char_size(self.0.c_cflag)
    }

    pub fn cflag(&self) -> libc::tcflag_t {
        self.0.c_cflag
    }

    pub fn lflag(&self) -> libc::tcflag_t {
        self.0.c_lflag
    }

    pub fn oflag(&self) -> libc::tcflag_t {
        self.0.c_oflag
    }

    pub fn vmin(&self) -> libc::cc_t {
        self.0.c_cc[libc::VMIN]
    }

    pub fn vtime(&self) -> libc::cc_t {
        self.0.c_cc[libc::VTIME]
    }

    /// No canonical processing, echo or signal generation.
    pub fn is_raw(&self) -> bool {
        self.0.c_lflag & (libc::ICANON | libc::ECHO | libc::ISIG) == 0
    }
}

impl fmt::Debug for TermiosSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TermiosSnapshot")
            .field("baud_rate", &self.baud_rate())
            .field("data_bits", &self.data_bits())
            .field("raw", &self.is_raw())
            .field("vmin", &self.vmin())
            .field("vtime", &self.vtime())
            .finish()
    }
}

/// Put `fd` into raw mode at the requested speed and width.
///
/// Returns the attributes that were in effect before.
fn apply_raw_mode(fd: RawFd, baud_rate: u32, data_bits: u8) -> Result<TermiosSnapshot, PortError> {
    let saved = TermiosSnapshot::read(fd)?;
    let mut tty = saved.0;

    let baud = BaudRate::from_u32(baud_rate).unwrap_or_else(|| {
        debug!("Unsupported baud rate {baud_rate}, using 115200");
        BaudRate::default()
    });
    let bits = DataBits::from_bits(data_bits).unwrap_or_else(|| {
        debug!("Unsupported data bits {data_bits}, using 8");
        DataBits::default()
    });

    // SAFETY: tty is a valid termios obtained from tcgetattr.
    unsafe { libc::cfmakeraw(&mut tty) };
    tty.c_cflag |= libc::CLOCAL | libc::CREAD;
    tty.c_cflag &= !(libc::CRTSCTS | libc::CSTOPB | libc::PARENB);
    tty.c_oflag &= !libc::OPOST;
    tty.c_cc[libc::VMIN] = 0;
    tty.c_cc[libc::VTIME] = 1;

    tty.c_cflag &= !libc::CSIZE;
    tty.c_cflag |= bits.char_size();

    // SAFETY: `tty` is a valid termios owned by this frame.
    if unsafe { libc::cfsetspeed(&mut tty, baud.speed()) } != 0 {
        return Err(PortError::termios("set speed in", io::Error::last_os_error()));
    }
    // SAFETY: `tty` is fully initialised and outlives the call.
    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &tty) } != 0 {
        return Err(PortError::termios("apply", io::Error::last_os_error()));
    }
    Ok(saved)
}

fn open_device(path: &Path, extra_flags: libc::c_int) -> Result<File, PortError> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .custom_flags(libc::O_NOCTTY | extra_flags)
        .open(path)
        .map_err(|e| PortError::open(path, e))
}

/// A configured, non-blocking TTY.
pub struct TtyPort {
    file: File,
    name: String,
    saved: TermiosSnapshot,
}

impl TtyPort {
    /// Open `path` and put it into raw mode.
    ///
    /// Unsupported `baud_rate`/`data_bits` values fall back to 115200 and 8.
    /// Any descriptor opened along the way is closed again on failure.
    pub fn open(path: &Path, baud_rate: u32, data_bits: u8) -> Result<Self, PortError> {
        let blocking = open_device(path, 0)?;
        let saved = apply_raw_mode(blocking.as_raw_fd(), baud_rate, data_bits)?;
        drop(blocking);

        let file = open_device(path, libc::O_NONBLOCK)?;
        let mut port = Self {
            file,
            name: path.display().to_string(),
            saved,
        };

        debug!("Clearing buffers after device reopen");
        if let Err(e) = port.clear_buffers() {
            warn!("{e}");
        }
        Ok(port)
    }

    /// Attributes in effect before this port reconfigured the device.
    ///
    /// Kept for callers that want to restore the line themselves; closing
    /// the port does not restore them.
    pub fn saved_settings(&self) -> &TermiosSnapshot {
        &self.saved
    }

    /// Attributes currently applied to the device.
    pub fn current_settings(&self) -> Result<TermiosSnapshot, PortError> {
        TermiosSnapshot::read(self.file.as_raw_fd())
    }
}

impl SerialPortAdapter for TtyPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        self.file.write(data).map_err(PortError::Io)
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        // With O_NONBLOCK an empty queue is EAGAIN, so zero bytes is end-of-file.
        match self.file.read(buffer).map_err(PortError::Io)? {
            0 if !buffer.is_empty() => Err(PortError::HungUp),
            n => Ok(n),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn clear_buffers(&mut self) -> Result<(), PortError> {
        // SAFETY: the descriptor is owned by `self.file` and open.
        if unsafe { libc::tcflush(self.file.as_raw_fd(), libc::TCIOFLUSH) } != 0 {
            return Err(PortError::Flush(io::Error::last_os_error()));
        }
        Ok(())
    }

    fn wait_readable(&mut self, timeout: Duration) -> Result<bool, PortError> {
        let mut pfd = libc::pollfd {
            fd: self.file.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };
        let millis = timeout.as_micros().div_ceil(1000).min(libc::c_int::MAX as u128) as libc::c_int;

        // SAFETY: `pfd` is a valid pollfd and the count passed is 1.
        match unsafe { libc::poll(&mut pfd, 1, millis) } {
            n if n > 0 && pfd.revents & libc::POLLIN != 0 => Ok(true),
            n if n > 0 && pfd.revents & (libc::POLLHUP | libc::POLLERR | libc::POLLNVAL) != 0 => {
                Err(PortError::HungUp)
            }
            n if n > 0 => Ok(true),
            0 => Ok(false),
            _ => {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    Ok(false)
                } else {
                    Err(PortError::Io(err))
                }
            }
        }
    }

    fn close(self) -> Result<(), PortError> {
        let fd = self.file.into_raw_fd();
        // SAFETY: `into_raw_fd` gave up ownership, so this is the only close.
        if unsafe { libc::close(fd) } != 0 {
            return Err(PortError::Io(io::Error::last_os_error()));
        }
        Ok(())
    }
}

impl fmt::Debug for TtyPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtyPort")
            .field("name", &self.name)
            .field("fd", &self.file.as_raw_fd())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_device() {
        let err = TtyPort::open(Path::new("/dev/nonexistent_tty_12345"), 115200, 8).unwrap_err();
        match err {
            PortError::Open { path, source } => {
                assert!(path.to_string_lossy().contains("nonexistent"));
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("Expected Open error, got: {other:?}"),
        }
    }

    #[test]
    fn test_non_tty_rejected() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = TtyPort::open(file.path(), 9600, 8).unwrap_err();
        assert!(matches!(err, PortError::Termios { op: "read", .. }));
    }
}
