//! Controller-side proxy: readiness handshake, id assignment, correlation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use vidlink_channel::MessageSender;
use vidlink_proto::{CallEnvelope, CallId, ClientMessage, WorkerMessage};

use crate::error::{Result, RpcError};
use crate::ClientEndpoint;

type CallOutcome = Result<Value>;

struct ClientShared {
    sender: Mutex<Option<MessageSender<ClientMessage>>>,
    next_id: AtomicU64,
    pending: Mutex<HashMap<CallId, oneshot::Sender<CallOutcome>>>,
    closed: AtomicBool,
}

/// Client proxy for a worker on the far side of a channel.
///
/// [`Client::connect`] performs the readiness handshake and hands back a
/// usable proxy; [`Client::call`] issues one call and resolves with its
/// reply, however the replies are ordered on the wire. Ids are assigned
/// monotonically from 0 and never reused for the proxy's lifetime.
pub struct Client {
    shared: Arc<ClientShared>,
    reader: JoinHandle<()>,
}

impl Client {
    /// Wait for the worker's readiness signal, then start correlating.
    ///
    /// Fails if the channel errors or ends before readiness. A reply
    /// envelope arriving before the readiness signal is a protocol
    /// violation; it is logged and dropped while the wait continues.
    pub async fn connect(endpoint: ClientEndpoint) -> Result<Self> {
        let (sender, mut receiver) = endpoint.split();

        loop {
            match receiver.recv().await {
                Some(Ok(WorkerMessage::Ready)) => break,
                Some(Ok(message)) => {
                    warn!(?message, "reply before readiness signal; dropping");
                }
                Some(Err(err)) => return Err(RpcError::Channel(err)),
                None => return Err(RpcError::ChannelClosed),
            }
        }
        debug!("worker ready; accepting calls");

        let shared = Arc::new(ClientShared {
            sender: Mutex::new(Some(sender)),
            next_id: AtomicU64::new(0),
            pending: Mutex::new(HashMap::new()),
            closed: AtomicBool::new(false),
        });

        let reader = tokio::spawn(read_replies(receiver, Arc::clone(&shared)));
        Ok(Self { shared, reader })
    }

    /// Issue one call and wait for its reply.
    ///
    /// The pending entry is registered before the envelope is sent, so a
    /// reply can never arrive for an id the table does not know.
    pub async fn call(&self, method: impl Into<String>, args: Vec<Value>) -> Result<Value> {
        if self.shared.closed.load(Ordering::SeqCst) {
            return Err(RpcError::ChannelClosed);
        }

        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.shared.pending.lock().await.insert(id, tx);

        let envelope = ClientMessage::call(CallEnvelope::new(id, method, args));
        let sent = {
            let guard = self.shared.sender.lock().await;
            match guard.as_ref() {
                Some(sender) => sender.send(envelope).is_ok(),
                None => false,
            }
        };
        if !sent {
            self.shared.pending.lock().await.remove(&id);
            return Err(RpcError::ChannelClosed);
        }

        // From<RecvError> covers the proxy tearing the call down mid-wait.
        rx.await?
    }

    /// Terminate the channel and reject every outstanding call with
    /// [`RpcError::ChannelClosed`]. Idempotent.
    pub async fn close(&self) {
        if self.shared.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.shared.sender.lock().await.take();
        self.reader.abort();

        let mut pending = self.shared.pending.lock().await;
        if !pending.is_empty() {
            debug!(count = pending.len(), "rejecting outstanding calls on close");
        }
        for (_, tx) in pending.drain() {
            let _ = tx.send(Err(RpcError::ChannelClosed));
        }
        debug!("client closed");
    }

    /// Number of calls awaiting replies.
    pub async fn pending_calls(&self) -> usize {
        self.shared.pending.lock().await.len()
    }

    /// False once the proxy is closed or the channel is gone.
    pub fn is_alive(&self) -> bool {
        !self.shared.closed.load(Ordering::SeqCst) && !self.reader.is_finished()
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("closed", &self.shared.closed)
            .finish()
    }
}

/// Reader loop: settle replies against the pending table until the channel
/// ends or errors, then reject whatever is still outstanding.
async fn read_replies(
    mut receiver: vidlink_channel::MessageReceiver<WorkerMessage>,
    shared: Arc<ClientShared>,
) {
    while let Some(item) = receiver.recv().await {
        match item {
            Ok(WorkerMessage::Ready) => {
                debug!("duplicate readiness signal; ignoring");
            }
            Ok(WorkerMessage::Result { id, result }) => {
                settle(&shared, id, Ok(result)).await;
            }
            Ok(WorkerMessage::Error { id, error }) => {
                settle(&shared, id, Err(RpcError::from_reply_value(error))).await;
            }
            Err(err) => {
                warn!(error = %err, "channel error; rejecting outstanding calls");
                break;
            }
        }
    }
    fail_all_pending(&shared).await;
}

async fn settle(shared: &ClientShared, id: CallId, outcome: CallOutcome) {
    // Remove before resolving, so a duplicate reply finds nothing.
    let entry = shared.pending.lock().await.remove(&id);
    match entry {
        Some(tx) => {
            // The caller may have stopped waiting; that is not an error.
            let _ = tx.send(outcome);
        }
        None => warn!(id, "reply matches no pending call; dropping"),
    }
}

async fn fail_all_pending(shared: &ClientShared) {
    shared.closed.store(true, Ordering::SeqCst);
    let mut pending = shared.pending.lock().await;
    if !pending.is_empty() {
        debug!(count = pending.len(), "rejecting outstanding calls");
    }
    for (_, tx) in pending.drain() {
        let _ = tx.send(Err(RpcError::ChannelClosed));
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::oneshot;
    use vidlink_channel::{memory, ChannelError};

    use serde_json::json;

    use super::*;
    use crate::dispatcher::Dispatcher;
    use crate::registry::OperationRegistry;
    use crate::WorkerEndpoint;

    fn pair() -> (ClientEndpoint, WorkerEndpoint) {
        memory::duplex::<ClientMessage, WorkerMessage>()
    }

    #[tokio::test]
    async fn connect_resolves_on_readiness() {
        let (client_side, worker_side) = pair();
        let (worker_tx, _worker_rx) = worker_side.split();
        worker_tx.send(WorkerMessage::Ready).unwrap();

        let client = Client::connect(client_side).await.unwrap();
        assert!(client.is_alive());
        assert_eq!(client.pending_calls().await, 0);
    }

    #[tokio::test]
    async fn connect_fails_on_error_before_readiness() {
        let (client_side, worker_side) = pair();
        let (worker_tx, _worker_rx) = worker_side.split();
        worker_tx.send_error(ChannelError::Closed).unwrap();

        let err = Client::connect(client_side).await.unwrap_err();
        assert!(matches!(err, RpcError::Channel(_)));
    }

    #[tokio::test]
    async fn connect_fails_on_hangup_before_readiness() {
        let (client_side, worker_side) = pair();
        drop(worker_side);

        let err = Client::connect(client_side).await.unwrap_err();
        assert!(matches!(err, RpcError::ChannelClosed));
    }

    #[tokio::test]
    async fn reply_before_readiness_is_dropped() {
        let (client_side, worker_side) = pair();
        let (worker_tx, mut worker_rx) = worker_side.split();

        worker_tx.send(WorkerMessage::result(0, json!("stale"))).unwrap();
        worker_tx.send(WorkerMessage::Ready).unwrap();

        let client = Client::connect(client_side).await.unwrap();

        // The dropped reply must not have touched the fresh id space.
        let (outcome, ()) = tokio::join!(client.call("ping", vec![]), async {
            let item = worker_rx.recv().await.unwrap().unwrap();
            let ClientMessage::Call(envelope) = item;
            assert_eq!(envelope.id, 0);
            worker_tx
                .send(WorkerMessage::result(envelope.id, json!("pong")))
                .unwrap();
        });
        assert_eq!(outcome.unwrap(), json!("pong"));
    }

    #[tokio::test]
    async fn permuted_replies_resolve_their_own_calls() {
        let (client_side, worker_side) = pair();
        let (worker_tx, mut worker_rx) = worker_side.split();
        worker_tx.send(WorkerMessage::Ready).unwrap();

        let client = Client::connect(client_side).await.unwrap();

        let driver = tokio::spawn(async move {
            let mut ids = Vec::new();
            for _ in 0..3 {
                let item = worker_rx.recv().await.unwrap().unwrap();
                let ClientMessage::Call(envelope) = item;
                ids.push(envelope.id);
            }
            assert_eq!(ids, vec![0, 1, 2]);

            // Deliver C first, then A, then B.
            worker_tx.send(WorkerMessage::result(2, json!("c"))).unwrap();
            worker_tx.send(WorkerMessage::result(0, json!("a"))).unwrap();
            worker_tx.send(WorkerMessage::result(1, json!("b"))).unwrap();
        });

        let (a, b, c) = tokio::join!(
            client.call("opA", vec![json!(1)]),
            client.call("opB", vec![json!(2)]),
            client.call("opC", vec![json!(3)]),
        );
        assert_eq!(a.unwrap(), json!("a"));
        assert_eq!(b.unwrap(), json!("b"));
        assert_eq!(c.unwrap(), json!("c"));
        assert_eq!(client.pending_calls().await, 0);
        driver.await.unwrap();
    }

    #[tokio::test]
    async fn call_ids_increase_and_are_never_reused() {
        let (client_side, worker_side) = pair();
        let (worker_tx, mut worker_rx) = worker_side.split();
        worker_tx.send(WorkerMessage::Ready).unwrap();

        let client = Client::connect(client_side).await.unwrap();

        // Each call completes before the next starts; its id must still
        // never come back.
        for expected in 0..3u64 {
            let (outcome, observed) = tokio::join!(client.call("ping", vec![]), async {
                let item = worker_rx.recv().await.unwrap().unwrap();
                let ClientMessage::Call(envelope) = item;
                worker_tx
                    .send(WorkerMessage::result(envelope.id, json!(envelope.id)))
                    .unwrap();
                envelope.id
            });
            assert_eq!(observed, expected);
            assert_eq!(outcome.unwrap(), json!(expected));
        }
    }

    #[tokio::test]
    async fn unmatched_reply_is_dropped_without_damage() {
        let (client_side, worker_side) = pair();
        let (worker_tx, mut worker_rx) = worker_side.split();
        worker_tx.send(WorkerMessage::Ready).unwrap();

        let client = Client::connect(client_side).await.unwrap();
        worker_tx.send(WorkerMessage::result(99, json!("stale"))).unwrap();

        let (outcome, ()) = tokio::join!(client.call("ping", vec![]), async {
            let item = worker_rx.recv().await.unwrap().unwrap();
            let ClientMessage::Call(envelope) = item;
            worker_tx
                .send(WorkerMessage::result(envelope.id, json!("pong")))
                .unwrap();
        });
        assert_eq!(outcome.unwrap(), json!("pong"));
        assert!(client.is_alive());
    }

    #[tokio::test]
    async fn duplicate_reply_settles_only_the_first_time() {
        let (client_side, worker_side) = pair();
        let (worker_tx, mut worker_rx) = worker_side.split();
        worker_tx.send(WorkerMessage::Ready).unwrap();

        let client = Client::connect(client_side).await.unwrap();

        let (outcome, ()) = tokio::join!(client.call("once", vec![]), async {
            let item = worker_rx.recv().await.unwrap().unwrap();
            let ClientMessage::Call(envelope) = item;
            worker_tx
                .send(WorkerMessage::result(envelope.id, json!("first")))
                .unwrap();
            worker_tx
                .send(WorkerMessage::result(envelope.id, json!("second")))
                .unwrap();
        });
        assert_eq!(outcome.unwrap(), json!("first"));

        // The proxy shrugged off the duplicate and still serves calls.
        let (outcome, ()) = tokio::join!(client.call("again", vec![]), async {
            let item = worker_rx.recv().await.unwrap().unwrap();
            let ClientMessage::Call(envelope) = item;
            assert_eq!(envelope.id, 1);
            worker_tx
                .send(WorkerMessage::result(envelope.id, json!("fine")))
                .unwrap();
        });
        assert_eq!(outcome.unwrap(), json!("fine"));
    }

    #[tokio::test]
    async fn duplicate_readiness_in_steady_state_is_ignored() {
        let (client_side, worker_side) = pair();
        let (worker_tx, mut worker_rx) = worker_side.split();
        worker_tx.send(WorkerMessage::Ready).unwrap();

        let client = Client::connect(client_side).await.unwrap();
        worker_tx.send(WorkerMessage::Ready).unwrap();

        let (outcome, ()) = tokio::join!(client.call("ping", vec![]), async {
            let item = worker_rx.recv().await.unwrap().unwrap();
            let ClientMessage::Call(envelope) = item;
            worker_tx
                .send(WorkerMessage::result(envelope.id, json!("pong")))
                .unwrap();
        });
        assert_eq!(outcome.unwrap(), json!("pong"));
    }

    #[tokio::test]
    async fn close_rejects_outstanding_calls() {
        let (client_side, worker_side) = pair();
        let (worker_tx, mut worker_rx) = worker_side.split();
        worker_tx.send(WorkerMessage::Ready).unwrap();

        let client = Client::connect(client_side).await.unwrap();

        let (outcome, ()) = tokio::join!(client.call("stall", vec![]), async {
            // Close only after the call is on the wire.
            let _ = worker_rx.recv().await.unwrap().unwrap();
            client.close().await;
        });
        assert!(matches!(outcome, Err(RpcError::ChannelClosed)));
        assert_eq!(client.pending_calls().await, 0);
        assert!(!client.is_alive());

        // Idempotent, and later calls fail fast.
        client.close().await;
        let err = client.call("late", vec![]).await.unwrap_err();
        assert!(matches!(err, RpcError::ChannelClosed));
    }

    #[tokio::test]
    async fn worker_hangup_rejects_outstanding_calls() {
        let (client_side, worker_side) = pair();
        let (worker_tx, mut worker_rx) = worker_side.split();
        worker_tx.send(WorkerMessage::Ready).unwrap();

        let client = Client::connect(client_side).await.unwrap();

        let (outcome, ()) = tokio::join!(client.call("stall", vec![]), async move {
            let _ = worker_rx.recv().await.unwrap().unwrap();
            drop(worker_tx);
            drop(worker_rx);
        });
        assert!(matches!(outcome, Err(RpcError::ChannelClosed)));
        assert!(!client.is_alive());

        let err = client.call("late", vec![]).await.unwrap_err();
        assert!(matches!(err, RpcError::ChannelClosed));
    }

    #[tokio::test]
    async fn channel_error_in_steady_state_rejects_outstanding_calls() {
        let (client_side, worker_side) = pair();
        let (worker_tx, mut worker_rx) = worker_side.split();
        worker_tx.send(WorkerMessage::Ready).unwrap();

        let client = Client::connect(client_side).await.unwrap();

        let (outcome, ()) = tokio::join!(client.call("stall", vec![]), async {
            let _ = worker_rx.recv().await.unwrap().unwrap();
            worker_tx.send_error(ChannelError::Closed).unwrap();
        });
        assert!(matches!(outcome, Err(RpcError::ChannelClosed)));
    }

    #[tokio::test]
    async fn end_to_end_metadata_call() {
        let (client_side, worker_side) = pair();
        let (worker_tx, worker_rx) = worker_side.split();

        let mut registry = OperationRegistry::new();
        registry.register_fn("readMetaData", |_| async {
            Ok(json!({"duration": 12.3, "rotation": 0, "vidWidth": 1920, "vidHeight": 1080}))
        });
        let dispatcher = Dispatcher::new(registry, worker_tx);
        dispatcher.announce_ready().unwrap();
        tokio::spawn(dispatcher.run(worker_rx));

        let client = Client::connect(client_side).await.unwrap();
        let result = client
            .call("readMetaData", vec![json!("store"), json!("clip.mp4")])
            .await
            .unwrap();
        assert_eq!(
            result,
            json!({"duration": 12.3, "rotation": 0, "vidWidth": 1920, "vidHeight": 1080})
        );
        assert_eq!(client.pending_calls().await, 0);
    }

    #[tokio::test]
    async fn end_to_end_unknown_method_leaves_other_calls_pending() {
        let (client_side, worker_side) = pair();
        let (worker_tx, worker_rx) = worker_side.split();

        let (gate_tx, gate_rx) = oneshot::channel::<()>();
        let gate = Arc::new(Mutex::new(Some(gate_rx)));
        let mut registry = OperationRegistry::new();
        registry.register_fn("gated", move |_| {
            let gate = Arc::clone(&gate);
            async move {
                if let Some(rx) = gate.lock().await.take() {
                    let _ = rx.await;
                }
                Ok(json!("done"))
            }
        });
        let dispatcher = Dispatcher::new(registry, worker_tx);
        dispatcher.announce_ready().unwrap();
        tokio::spawn(dispatcher.run(worker_rx));

        let client = Client::connect(client_side).await.unwrap();

        let (gated_outcome, ()) = tokio::join!(client.call("gated", vec![]), async {
            let err = client.call("noSuchOp", vec![]).await.unwrap_err();
            assert_eq!(err.to_string(), "Method doesn't exist: noSuchOp");

            // The failure settled only its own call.
            assert_eq!(client.pending_calls().await, 1);
            gate_tx.send(()).unwrap();
        });
        assert_eq!(gated_outcome.unwrap(), json!("done"));
        assert_eq!(client.pending_calls().await, 0);
    }
}
