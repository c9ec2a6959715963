//! Worker-side dispatch: readiness announcement, call routing, replies.

use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;
use tracing::{debug, trace, warn};
use vidlink_channel::{MessageReceiver, MessageSender};
use vidlink_proto::{method_not_found_message, CallEnvelope, ClientMessage, WorkerMessage};

use crate::error::Result;
use crate::registry::OperationRegistry;

/// Worker-side message dispatcher.
///
/// Owns the operation registry and the reply sender. Each call runs on its
/// own task, so a slow operation never blocks the serve loop or other calls;
/// replies are sent whenever their operations finish, in any order.
pub struct Dispatcher {
    registry: OperationRegistry,
    sender: MessageSender<WorkerMessage>,
    ready_sent: AtomicBool,
}

impl Dispatcher {
    pub fn new(registry: OperationRegistry, sender: MessageSender<WorkerMessage>) -> Self {
        Self {
            registry,
            sender,
            ready_sent: AtomicBool::new(false),
        }
    }

    /// Announce readiness to the controller.
    ///
    /// The signal is sent at most once per dispatcher; later announcements
    /// are ignored. Callers announce only after their engine is usable.
    pub fn announce_ready(&self) -> Result<()> {
        if self.ready_sent.swap(true, Ordering::SeqCst) {
            debug!("readiness already announced; ignoring");
            return Ok(());
        }
        self.sender.send(WorkerMessage::Ready)?;
        debug!(operations = self.registry.len(), "announced readiness");
        Ok(())
    }

    /// Route one call envelope.
    ///
    /// A call naming an unregistered method is answered immediately with an
    /// error reply and no operation runs. A registered method is invoked on
    /// a fresh task; the reply carries the call's id whichever way the
    /// invocation ends.
    pub fn dispatch(&self, envelope: CallEnvelope) {
        let CallEnvelope { id, method, args } = envelope;
        let Some(op) = self.registry.get(&method) else {
            debug!(id, %method, "call names an unregistered operation");
            let reply = WorkerMessage::error(id, Value::String(method_not_found_message(&method)));
            if self.sender.send(reply).is_err() {
                debug!(id, "controller hung up before the error reply was sent");
            }
            return;
        };

        trace!(id, %method, "dispatching call");
        let sender = self.sender.clone();
        tokio::spawn(async move {
            let reply = WorkerMessage::reply(id, op.invoke(args).await);
            if sender.send(reply).is_err() {
                debug!(id, "controller hung up before the reply was sent");
            }
        });
    }

    /// Serve calls from the receiver until the channel ends or errors.
    ///
    /// In-flight operations keep running when the loop stops; their replies
    /// go nowhere once the controller is gone.
    pub async fn run(self, mut receiver: MessageReceiver<ClientMessage>) {
        while let Some(item) = receiver.recv().await {
            match item {
                Ok(ClientMessage::Call(envelope)) => self.dispatch(envelope),
                Err(err) => {
                    warn!(error = %err, "channel error; dispatcher stopping");
                    break;
                }
            }
        }
        debug!("dispatcher finished");
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("ready_sent", &self.ready_sent)
            .finish()
    }
}
