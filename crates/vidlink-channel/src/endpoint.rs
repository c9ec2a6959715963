use tokio::sync::mpsc;

use crate::error::{ChannelError, Result};

/// Sending half of a typed message channel.
///
/// Sending never blocks and never applies back-pressure; the only failure
/// mode is the other end being gone.
pub struct MessageSender<T> {
    tx: mpsc::UnboundedSender<Result<T>>,
}

impl<T> Clone for MessageSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> std::fmt::Debug for MessageSender<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageSender")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

impl<T> MessageSender<T> {
    /// Deliver a message to the other end.
    pub fn send(&self, message: T) -> Result<()> {
        self.tx.send(Ok(message)).map_err(|_| ChannelError::Closed)
    }

    /// Surface a transport failure to the other end.
    ///
    /// Transport pumps use this to report the terminal error through the
    /// receiving side instead of silently dropping the link.
    pub fn send_error(&self, error: ChannelError) -> Result<()> {
        self.tx.send(Err(error)).map_err(|_| ChannelError::Closed)
    }

    /// True once the receiving half has been dropped or closed.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving half of a typed message channel.
pub struct MessageReceiver<T> {
    rx: mpsc::UnboundedReceiver<Result<T>>,
}

impl<T> std::fmt::Debug for MessageReceiver<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageReceiver").finish_non_exhaustive()
    }
}

impl<T> MessageReceiver<T> {
    /// Receive the next inbound item.
    ///
    /// `Some(Ok(_))` is a message, `Some(Err(_))` is a transport failure
    /// (terminal: the transport stops after reporting it), `None` is orderly
    /// end-of-channel.
    pub async fn recv(&mut self) -> Option<Result<T>> {
        self.rx.recv().await
    }

    /// Stop accepting new items. Already-queued items can still be received.
    pub fn close(&mut self) {
        self.rx.close();
    }
}

/// Create a connected sender/receiver pair.
pub fn channel<T>() -> (MessageSender<T>, MessageReceiver<T>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (MessageSender { tx }, MessageReceiver { rx })
}

/// One side of a bidirectional message channel: sends `Out`, receives `In`.
#[derive(Debug)]
pub struct Endpoint<Out, In> {
    pub sender: MessageSender<Out>,
    pub receiver: MessageReceiver<In>,
}

impl<Out, In> Endpoint<Out, In> {
    /// Assemble an endpoint from its halves.
    pub fn new(sender: MessageSender<Out>, receiver: MessageReceiver<In>) -> Self {
        Self { sender, receiver }
    }

    /// Split the endpoint back into its halves.
    pub fn split(self) -> (MessageSender<Out>, MessageReceiver<In>) {
        (self.sender, self.receiver)
    }
}
