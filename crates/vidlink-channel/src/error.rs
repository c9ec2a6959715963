use std::path::PathBuf;

/// Errors surfaced by channel endpoints and transports.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The frame header contains an invalid magic number.
    #[error("invalid frame magic (expected 0x564c \"VL\")")]
    InvalidMagic,

    /// A frame payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// A message could not be serialized for the wire.
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),

    /// A frame payload could not be parsed as a protocol message.
    #[error("failed to decode message: {0}")]
    Decode(#[source] serde_json::Error),

    /// An I/O error occurred on the transport stream.
    #[error("channel I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to bind a listening socket.
    #[error("failed to bind to {path}: {source}")]
    Bind {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to connect to a listening socket.
    #[error("failed to connect to {path}: {source}")]
    Connect {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to accept an incoming connection.
    #[error("failed to accept connection: {0}")]
    Accept(#[source] std::io::Error),

    /// The socket path is too long for the platform.
    #[error("socket path too long ({len} bytes, max {max}): {path}")]
    PathTooLong {
        path: PathBuf,
        len: usize,
        max: usize,
    },

    /// The other end of the channel is gone.
    #[error("channel closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, ChannelError>;
