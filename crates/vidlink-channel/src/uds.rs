//! Unix domain socket transport.
//!
//! A connected socket is wrapped in the length-prefixed frame codec; each
//! frame payload is one JSON-encoded protocol message. Two pump tasks per
//! connection shuttle messages between the socket and the typed endpoint.

use std::os::unix::fs::{FileTypeExt, MetadataExt, PermissionsExt};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::net::{UnixListener, UnixStream};
use tokio_util::codec::Framed;
use tracing::{debug, info, trace, warn};

use crate::codec::{FrameCodec, DEFAULT_MAX_PAYLOAD};
use crate::endpoint::{channel, Endpoint};
use crate::error::{ChannelError, Result};

/// Listening side of the unix-socket transport.
///
/// The socket file is created on bind and removed on drop, provided nobody
/// replaced the path in between.
pub struct UdsListener {
    listener: UnixListener,
    path: PathBuf,
    created_inode: Option<(u64, u64)>,
    cleanup_on_drop: bool,
    max_payload_size: usize,
}

impl UdsListener {
    /// Default permission mode for created socket paths.
    pub const DEFAULT_SOCKET_MODE: u32 = 0o600;
    /// Maximum socket path length.
    /// Unix `sockaddr_un.sun_path` is typically 108 bytes on Linux, 104 on macOS.
    #[cfg(target_os = "linux")]
    const MAX_PATH_LEN: usize = 108;
    #[cfg(target_os = "macos")]
    const MAX_PATH_LEN: usize = 104;
    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    const MAX_PATH_LEN: usize = 104;

    /// Bind and listen on a filesystem-path unix socket.
    ///
    /// If the path already holds a socket it is assumed stale and removed
    /// first; any other file type is refused.
    pub fn bind(path: impl AsRef<Path>) -> Result<Self> {
        Self::bind_with_mode(path, Self::DEFAULT_SOCKET_MODE)
    }

    /// Bind with an explicit permission mode on the socket file.
    pub fn bind_with_mode(path: impl AsRef<Path>, mode: u32) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let path_bytes = path.as_os_str().len();
        if path_bytes >= Self::MAX_PATH_LEN {
            return Err(ChannelError::PathTooLong {
                path,
                len: path_bytes,
                max: Self::MAX_PATH_LEN,
            });
        }

        // Remove stale sockets, but never remove non-socket files.
        if path.exists() {
            let metadata = std::fs::symlink_metadata(&path).map_err(|e| ChannelError::Bind {
                path: path.clone(),
                source: e,
            })?;
            if metadata.file_type().is_socket() {
                debug!(?path, "removing stale socket");
                std::fs::remove_file(&path).map_err(|e| ChannelError::Bind {
                    path: path.clone(),
                    source: e,
                })?;
            } else {
                return Err(ChannelError::Bind {
                    path: path.clone(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::AlreadyExists,
                        "existing path is not a unix socket",
                    ),
                });
            }
        }

        let listener = UnixListener::bind(&path).map_err(|e| ChannelError::Bind {
            path: path.clone(),
            source: e,
        })?;

        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode)).map_err(|e| {
            ChannelError::Bind {
                path: path.clone(),
                source: e,
            }
        })?;
        let created_metadata =
            std::fs::symlink_metadata(&path).map_err(|e| ChannelError::Bind {
                path: path.clone(),
                source: e,
            })?;
        let created_inode = Some((created_metadata.dev(), created_metadata.ino()));

        info!(?path, "listening on unix domain socket");

        Ok(Self {
            listener,
            path,
            created_inode,
            cleanup_on_drop: true,
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        })
    }

    /// Override the per-frame payload limit applied to accepted connections.
    pub fn with_max_payload_size(mut self, max_payload_size: usize) -> Self {
        self.max_payload_size = max_payload_size;
        self
    }

    /// Accept one connection and wrap it in a typed endpoint.
    pub async fn accept<Out, In>(&self) -> Result<Endpoint<Out, In>>
    where
        Out: Serialize + Send + 'static,
        In: DeserializeOwned + Send + 'static,
    {
        let (stream, _addr) = self.listener.accept().await.map_err(ChannelError::Accept)?;
        debug!("accepted connection");
        Ok(spawn_pumps(stream, self.max_payload_size))
    }

    /// The path this socket is bound to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for UdsListener {
    fn drop(&mut self) {
        if self.cleanup_on_drop {
            if let Some((expected_dev, expected_ino)) = self.created_inode {
                if let Ok(metadata) = std::fs::symlink_metadata(&self.path) {
                    if metadata.file_type().is_socket()
                        && metadata.dev() == expected_dev
                        && metadata.ino() == expected_ino
                    {
                        debug!(path = ?self.path, "cleaning up socket file");
                        let _ = std::fs::remove_file(&self.path);
                    } else {
                        debug!(
                            path = ?self.path,
                            "socket path identity changed; skipping cleanup"
                        );
                    }
                }
            }
        }
    }
}

/// Connect to a listening unix socket and wrap it in a typed endpoint.
pub async fn connect<Out, In>(path: impl AsRef<Path>) -> Result<Endpoint<Out, In>>
where
    Out: Serialize + Send + 'static,
    In: DeserializeOwned + Send + 'static,
{
    connect_with_max_payload(path, DEFAULT_MAX_PAYLOAD).await
}

/// Connect with an explicit per-frame payload limit.
pub async fn connect_with_max_payload<Out, In>(
    path: impl AsRef<Path>,
    max_payload_size: usize,
) -> Result<Endpoint<Out, In>>
where
    Out: Serialize + Send + 'static,
    In: DeserializeOwned + Send + 'static,
{
    let path = path.as_ref();
    let stream = UnixStream::connect(path)
        .await
        .map_err(|e| ChannelError::Connect {
            path: path.to_path_buf(),
            source: e,
        })?;
    debug!(?path, "connected to unix domain socket");
    Ok(spawn_pumps(stream, max_payload_size))
}

/// Wrap a connected stream in the frame codec and spawn the two pump tasks.
fn spawn_pumps<Out, In>(stream: UnixStream, max_payload_size: usize) -> Endpoint<Out, In>
where
    Out: Serialize + Send + 'static,
    In: DeserializeOwned + Send + 'static,
{
    let framed = Framed::new(stream, FrameCodec::with_max_payload(max_payload_size));
    let (mut sink, mut frames) = framed.split();

    let (out_tx, mut out_rx) = channel::<Out>();
    let (in_tx, in_rx) = channel::<In>();

    tokio::spawn(async move {
        while let Some(item) = out_rx.recv().await {
            let message = match item {
                Ok(message) => message,
                // A locally injected error item aborts the transport.
                Err(_) => break,
            };
            let payload = match serde_json::to_vec(&message) {
                Ok(payload) => payload,
                Err(err) => {
                    warn!(error = %ChannelError::Encode(err), "dropping unencodable message");
                    continue;
                }
            };
            if let Err(err) = sink.send(Bytes::from(payload)).await {
                debug!(error = %err, "outbound pump stopping");
                break;
            }
        }
        let _ = sink.close().await;
        trace!("outbound pump finished");
    });

    tokio::spawn(async move {
        loop {
            match frames.next().await {
                Some(Ok(payload)) => match serde_json::from_slice::<In>(&payload) {
                    Ok(message) => {
                        if in_tx.send(message).is_err() {
                            break; // local receiver gone
                        }
                    }
                    Err(err) => {
                        let _ = in_tx.send_error(ChannelError::Decode(err));
                        break;
                    }
                },
                Some(Err(err)) => {
                    debug!(error = %err, "inbound pump stopping on transport error");
                    let _ = in_tx.send_error(err);
                    break;
                }
                None => break,
            }
        }
        trace!("inbound pump finished");
    });

    Endpoint::new(out_tx, in_rx)
}
