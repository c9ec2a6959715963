//! Controller/worker RPC for sandboxed video processing.
//!
//! vidlink splits video handling into a controller-side proxy and an
//! isolated worker talking over a message channel: the controller issues
//! JSON calls, the worker routes them through an operation registry and
//! replies by call id.
//!
//! # Crate Structure
//!
//! - [`proto`] — envelope types and the wire representation
//! - [`channel`] — framed transports: in-memory duplex and unix sockets
//! - [`rpc`] — client proxy, dispatcher and operation registry
//! - [`media`] — blob store, mp4 probe, offset-safe rewrites, worker assembly

/// Re-export protocol types.
pub mod proto {
    pub use vidlink_proto::*;
}

/// Re-export channel transports.
pub mod channel {
    pub use vidlink_channel::*;
}

/// Re-export RPC types.
pub mod rpc {
    pub use vidlink_rpc::*;
}

/// Re-export media engine types.
pub mod media {
    pub use vidlink_media::*;
}
