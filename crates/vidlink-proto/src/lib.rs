//! Wire envelope types for the vidlink controller/worker protocol.
//!
//! Every message is a JSON object with an explicit `type` discriminant:
//!
//! ```text
//! controller -> worker   {"type":"call","id":0,"method":"readMetaData","args":["store","clip.mp4"]}
//! worker -> controller   {"type":"ready"}
//!                        {"type":"result","id":0,"result":{...}}
//!                        {"type":"error","id":0,"error":"Failed to load file"}
//! ```
//!
//! Call ids are assigned by the controller, monotonically from 0, and are
//! never reused for the lifetime of a proxy. The `ready` message is sent by
//! the worker exactly once, before any reply, after its engine is usable.

pub mod envelope;

pub use envelope::{
    is_method_not_found, method_not_found_message, CallEnvelope, CallId, ClientMessage,
    WorkerMessage, METHOD_NOT_FOUND_PREFIX,
};
