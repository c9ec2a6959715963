use std::fmt;
use std::io;

use serde_json::Value;
use vidlink_channel::ChannelError;
use vidlink_media::{ClientError, MediaError};
use vidlink_rpc::RpcError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound
        | io::ErrorKind::PermissionDenied
        | io::ErrorKind::ConnectionRefused => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn channel_error(context: &str, err: ChannelError) -> CliError {
    match err {
        ChannelError::PathTooLong { .. } => CliError::new(USAGE, format!("{context}: {err}")),
        ChannelError::InvalidMagic
        | ChannelError::PayloadTooLarge { .. }
        | ChannelError::Encode(_)
        | ChannelError::Decode(_) => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn rpc_error(context: &str, err: RpcError) -> CliError {
    match err {
        RpcError::Channel(inner) => channel_error(context, inner),
        RpcError::ChannelClosed => CliError::new(TRANSPORT_ERROR, format!("{context}: {err}")),
        RpcError::MethodNotFound(message) => CliError::new(USAGE, format!("{context}: {message}")),
        RpcError::Operation(value) => {
            CliError::new(FAILURE, format!("{context}: {}", error_value_text(&value)))
        }
    }
}

pub fn client_error(context: &str, err: ClientError) -> CliError {
    match err {
        ClientError::Rpc(inner) => rpc_error(context, inner),
        ClientError::ReplyShape(inner) => {
            CliError::new(DATA_INVALID, format!("{context}: {inner}"))
        }
    }
}

pub fn media_error(context: &str, err: MediaError) -> CliError {
    match err {
        MediaError::InvalidName(_) => CliError::new(USAGE, format!("{context}: {err}")),
        MediaError::Write(_) => CliError::new(INTERNAL, format!("{context}: {err}")),
        other => CliError::new(FAILURE, format!("{context}: {other}")),
    }
}

fn error_value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
