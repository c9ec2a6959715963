use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier correlating a call with its reply.
///
/// Assigned by the controller, strictly increasing from 0, never reused
/// within a proxy's lifetime.
pub type CallId = u64;

/// Prefix of the error value the worker sends for an unregistered method.
pub const METHOD_NOT_FOUND_PREFIX: &str = "Method doesn't exist";

/// The exact error value sent when `method` names no registered operation.
pub fn method_not_found_message(method: &str) -> String {
    format!("{METHOD_NOT_FOUND_PREFIX}: {method}")
}

/// Returns true if an error value is the unknown-method error.
pub fn is_method_not_found(error: &Value) -> bool {
    matches!(error, Value::String(s) if s.starts_with(METHOD_NOT_FOUND_PREFIX))
}

/// A named method invocation with positional arguments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CallEnvelope {
    /// Caller-assigned correlation id.
    pub id: CallId,
    /// Name of the remote operation.
    pub method: String,
    /// Positional arguments, arbitrary arity.
    pub args: Vec<Value>,
}

impl CallEnvelope {
    /// Create a call envelope.
    pub fn new(id: CallId, method: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            id,
            method: method.into(),
            args,
        }
    }
}

/// Messages travelling controller -> worker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    /// Invoke a named operation.
    Call(CallEnvelope),
}

impl ClientMessage {
    /// Wrap a call envelope.
    pub fn call(envelope: CallEnvelope) -> Self {
        Self::Call(envelope)
    }
}

/// Messages travelling worker -> controller.
///
/// `Ready` carries no id and no payload; it announces that the worker's
/// engine finished initializing. `Result` and `Error` are the two reply
/// shapes; exactly one of them terminates each call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WorkerMessage {
    /// One-time readiness announcement.
    Ready,
    /// Successful reply for the call with this id.
    Result {
        id: CallId,
        result: Value,
    },
    /// Failed reply for the call with this id. The error value is opaque to
    /// the protocol and forwarded to the caller verbatim.
    Error {
        id: CallId,
        error: Value,
    },
}

impl WorkerMessage {
    /// Build a successful reply.
    pub fn result(id: CallId, result: Value) -> Self {
        Self::Result { id, result }
    }

    /// Build a failed reply.
    pub fn error(id: CallId, error: Value) -> Self {
        Self::Error { id, error }
    }

    /// Build a reply from an operation outcome.
    pub fn reply(id: CallId, outcome: Result<Value, Value>) -> Self {
        match outcome {
            Ok(result) => Self::Result { id, result },
            Err(error) => Self::Error { id, error },
        }
    }

    /// The call id this message settles, if any.
    pub fn call_id(&self) -> Option<CallId> {
        match self {
            Self::Ready => None,
            Self::Result { id, .. } | Self::Error { id, .. } => Some(*id),
        }
    }
}
