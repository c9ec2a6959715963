//! Error types for the media engine and its typed client.

use std::io;

/// Errors from store access, container parsing, and transforms.
///
/// The `Display` text of each operation-path variant is the exact error
/// value the worker sends across the channel, so the messages are fixed and
/// diagnostics travel in the `source` chain instead.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    /// The named file could not be read from the store.
    #[error("Failed to load file")]
    Load(#[source] io::Error),

    /// The bytes do not parse as an ISO-BMFF container.
    #[error("Failed to read video file")]
    Parse,

    /// The container parsed but carries no video track to report on.
    #[error("Failed to read file metadata")]
    Metadata,

    /// The rotation rewrite could not be applied.
    #[error("Failed to transcode video")]
    Transcode,

    /// The metadata strip could not be applied.
    #[error("Failed to transmux video")]
    Transmux,

    /// The result could not be written back to the store.
    #[error("Failed to write file")]
    Write(#[source] io::Error),

    /// A store handle or file name is not a plain file name.
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// The store root directory is unusable.
    #[error("cannot open store root {path}")]
    StoreUnavailable {
        path: std::path::PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, MediaError>;

/// Errors surfaced by the typed client wrappers.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Rpc(#[from] vidlink_rpc::RpcError),

    /// The worker replied, but not with the shape the wrapper promises.
    #[error("unexpected reply shape: {0}")]
    ReplyShape(#[from] serde_json::Error),
}
