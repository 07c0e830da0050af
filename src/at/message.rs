//! Accumulated response text.

use crate::error::AtError;
use serde::{Serialize, Serializer};
use std::borrow::Cow;

/// Hard cap on one accumulated response.
pub const MAX_MESSAGE_LEN: usize = 64 * 1024;

/// The raw bytes of every line received during one read, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    bytes: Vec<u8>,
}

impl Message {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one line, refusing to grow past [`MAX_MESSAGE_LEN`].
    ///
    /// On failure the message is left unchanged.
    pub(crate) fn append(&mut self, line: &[u8]) -> Result<(), AtError> {
        if line.is_empty() {
            return Ok(());
        }
        let overflow = AtError::BufferOverflow {
            limit: MAX_MESSAGE_LEN,
        };
        if self.bytes.len() + line.len() > MAX_MESSAGE_LEN {
            return Err(overflow);
        }
        self.bytes.try_reserve(line.len()).map_err(|_| overflow)?;
        self.bytes.extend_from_slice(line);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    /// Non-empty lines with their `\r\n` stripped.
    pub fn lines(&self) -> impl Iterator<Item = Cow<'_, str>> {
        self.bytes
            .split(|&b| b == b'\n')
            .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
            .filter(|line| !line.is_empty())
            .map(String::from_utf8_lossy)
    }
}

impl AsRef<[u8]> for Message {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl Serialize for Message {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text())
    }
}
