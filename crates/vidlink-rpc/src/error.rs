//! Error types for call correlation and dispatch.

use serde_json::Value;
use vidlink_channel::ChannelError;
use vidlink_proto::METHOD_NOT_FOUND_PREFIX;

/// Errors surfaced by the client proxy.
///
/// Worker-reported failures arrive as JSON values on the wire and are kept
/// verbatim; the two transport variants cover everything that can go wrong
/// between issuing a call and seeing its reply.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// The underlying channel reported a transport or codec error.
    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),

    /// The channel ended, or the proxy was closed, before a reply arrived.
    #[error("channel closed before a reply arrived")]
    ChannelClosed,

    /// The worker has no operation registered under the requested name.
    /// Carries the worker's message verbatim.
    #[error("{0}")]
    MethodNotFound(String),

    /// The operation ran and failed; its error value is forwarded untouched.
    #[error("operation failed: {0}")]
    Operation(Value),
}

impl RpcError {
    /// Classify the error value of a reply envelope.
    pub(crate) fn from_reply_value(error: Value) -> Self {
        match error {
            Value::String(message) if message.starts_with(METHOD_NOT_FOUND_PREFIX) => {
                Self::MethodNotFound(message)
            }
            other => Self::Operation(other),
        }
    }

    /// True when the call failed because the channel or proxy went away.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Self::Channel(_) | Self::ChannelClosed)
    }
}

/// A reply sender dropping mid-call means the proxy tore the call down.
impl From<tokio::sync::oneshot::error::RecvError> for RpcError {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        Self::ChannelClosed
    }
}

pub type Result<T> = std::result::Result<T, RpcError>;
