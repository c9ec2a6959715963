//! Typed message channels for the vidlink protocol.
//!
//! A channel is a pair of endpoints shuttling typed messages in both
//! directions: ordered, lossless, message-only. Two transports are provided:
//!
//! - [`memory::duplex`]: in-process, zero serialization; for tests and
//!   embedders running the worker on a local task.
//! - [`uds`]: unix domain sockets, each message framed as magic `VL` +
//!   length (u32 LE) + JSON payload.
//!
//! Transport failures arrive in-band as the final item of the receiving
//! side; orderly shutdown is `None` from [`endpoint::MessageReceiver::recv`].

pub mod codec;
pub mod endpoint;
pub mod error;
pub mod memory;
#[cfg(unix)]
pub mod uds;

pub use codec::{decode_frame, encode_frame, FrameCodec, DEFAULT_MAX_PAYLOAD, HEADER_SIZE, MAGIC};
pub use endpoint::{channel, Endpoint, MessageReceiver, MessageSender};
pub use error::{ChannelError, Result};
