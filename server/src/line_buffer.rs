//! Reassembly of line-delimited client input
//!
//! TCP delivers a byte stream, not messages: a single read may carry half a
//! line, exactly one line, or several lines at once. Each connection owns a
//! `LineBuffer` that accumulates whatever arrived and hands back complete
//! lines one at a time, keeping any unterminated tail for the next read.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LineError {
    #[error("line exceeds {capacity} bytes")]
    Overflow { capacity: usize },
}

/// Per-connection input buffer with a hard capacity for a single line
#[derive(Debug)]
pub struct LineBuffer {
    bytes: Vec<u8>,
    capacity: usize,
}

impl LineBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends freshly read bytes behind whatever is still pending
    pub fn append(&mut self, data: &[u8]) {
        self.bytes.extend_from_slice(data);
    }

    /// Extracts the next complete line, without its terminator.
    ///
    /// Lines end with `\n`; a `\r` directly in front of it is dropped too, so
    /// both `\r\n` and bare `\n` clients work. Returns `Ok(None)` when no
    /// terminator has arrived yet, leaving the partial line buffered.
    pub fn next_line(&mut self) -> Result<Option<String>, LineError> {
        let Some(end) = self.bytes.iter().position(|&b| b == b'\n') else {
            // A trailing `\r` may still turn out to be half of the terminator
            let carriage = usize::from(self.bytes.last() == Some(&b'\r'));
            if self.bytes.len() - carriage > self.capacity {
                return Err(LineError::Overflow {
                    capacity: self.capacity,
                });
            }
            return Ok(None);
        };

        let mut line_end = end;
        if line_end > 0 && self.bytes[line_end - 1] == b'\r' {
            line_end -= 1;
        }

        if line_end > self.capacity {
            return Err(LineError::Overflow {
                capacity: self.capacity,
            });
        }

        let line = String::from_utf8_lossy(&self.bytes[..line_end]).into_owned();
        self.bytes.drain(..=end);
        Ok(Some(line))
    }

    /// Number of bytes received but not yet returned as a line
    pub fn pending(&self) -> usize {
        self.bytes.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
