use crate::config::ConfigError;
use crate::dictionary::DictionaryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Dictionary(#[from] DictionaryError),
}

/// Failure to hand a message to a connection. The session treats every
/// variant as the recipient having gone away.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendError {
    #[error("connection {0} is closed")]
    Closed(u32),
    #[error("connection {0} is not reading, outbox full")]
    Full(u32),
    #[error("connection {0} is unknown")]
    Unknown(u32),
}

