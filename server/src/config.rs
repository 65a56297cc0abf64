//! Tunable limits for a game session

use shared::{MAX_BUF, MAX_GUESSES, MAX_NAME};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max guesses must be at least 1")]
    NoGuesses,
    #[error("max clients must be at least 1")]
    NoClients,
    #[error("max line length must be at least {min} bytes, got {got}")]
    LineTooShort { min: usize, got: usize },
    #[error("max name length must be between 1 and the max line length ({line}), got {got}")]
    BadNameLength { line: usize, got: usize },
    #[error("outbox capacity must be at least 1")]
    NoOutbox,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Misses allowed per round before the word is revealed
    pub max_guesses: u32,
    /// Concurrent connections, named or not
    pub max_clients: usize,
    /// Longest accepted input line, terminator excluded
    pub max_line_len: usize,
    pub max_name_len: usize,
    /// Bytes requested per socket read
    pub read_chunk: usize,
    /// Messages queued for one connection before it counts as stalled
    pub outbox_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_guesses: MAX_GUESSES,
            max_clients: 64,
            max_line_len: MAX_BUF,
            max_name_len: MAX_NAME,
            read_chunk: MAX_BUF,
            outbox_capacity: 128,
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_guesses == 0 {
            return Err(ConfigError::NoGuesses);
        }
        if self.max_clients == 0 {
            return Err(ConfigError::NoClients);
        }
        if self.outbox_capacity == 0 {
            return Err(ConfigError::NoOutbox);
        }
        // Room for at least a single letter guess
        if self.max_line_len < 1 {
            return Err(ConfigError::LineTooShort {
                min: 1,
                got: self.max_line_len,
            });
        }
        if self.max_name_len == 0 || self.max_name_len > self.max_line_len {
            return Err(ConfigError::BadNameLength {
                line: self.max_line_len,
                got: self.max_name_len,
            });
        }
        Ok(())
    }
}
