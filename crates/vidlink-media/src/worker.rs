//! Worker-side assembly: engine, registry and dispatcher on one endpoint.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::debug;
use vidlink_rpc::{Dispatcher, OperationRegistry, WorkerEndpoint};

use crate::engine::MediaEngine;
use crate::ops::register_operations;

/// Serve media operations on an endpoint until the controller hangs up.
///
/// Readiness is announced right away: constructing the engine is the
/// bootstrap, and the caller did that before handing it in. A worker whose
/// engine construction fails never gets here, so the controller observes a
/// dropped channel instead of a readiness signal.
pub async fn serve(engine: Arc<MediaEngine>, endpoint: WorkerEndpoint) {
    let (sender, receiver) = endpoint.split();

    let mut registry = OperationRegistry::new();
    register_operations(&mut registry, engine);

    let dispatcher = Dispatcher::new(registry, sender);
    if dispatcher.announce_ready().is_err() {
        debug!("controller hung up before readiness");
        return;
    }
    dispatcher.run(receiver).await;
}

/// Spawn [`serve`] on its own task.
pub fn spawn(engine: Arc<MediaEngine>, endpoint: WorkerEndpoint) -> JoinHandle<()> {
    tokio::spawn(serve(engine, endpoint))
}
