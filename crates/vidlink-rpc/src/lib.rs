//! Call correlation and dispatch between a controller and an isolated worker.
//!
//! The controller holds a [`Client`]: it waits for the worker's one-time
//! readiness signal, assigns each call a fresh monotonic id, and matches
//! replies back to their callers in whatever order they arrive. The worker
//! holds a [`Dispatcher`]: it routes call envelopes to operations in an
//! [`OperationRegistry`] and sends exactly one reply per call.
//!
//! Both halves speak the envelopes defined in `vidlink-proto` over any
//! `vidlink-channel` endpoint, so a worker can sit behind an in-process
//! channel in tests and behind a Unix socket in production without either
//! half changing.

pub mod client;
pub mod dispatcher;
pub mod error;
pub mod registry;

pub use client::Client;
pub use dispatcher::Dispatcher;
pub use error::{Result, RpcError};
pub use registry::{OpOutcome, Operation, OperationRegistry};

use vidlink_channel::Endpoint;
use vidlink_proto::{ClientMessage, WorkerMessage};

/// Controller-side endpoint: sends calls, receives readiness and replies.
pub type ClientEndpoint = Endpoint<ClientMessage, WorkerMessage>;

/// Worker-side endpoint: receives calls, sends readiness and replies.
pub type WorkerEndpoint = Endpoint<WorkerMessage, ClientMessage>;
