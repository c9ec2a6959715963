//! In-process duplex channel.
//!
//! Zero serialization: messages move between the two endpoints as values.
//! This is the channel used by tests and by embedders that run the worker
//! on a local task.

use crate::endpoint::{channel, Endpoint};

/// Create a connected pair of endpoints.
///
/// The first endpoint sends `A` and receives `B`; the second is the mirror
/// image. Dropping either endpoint's sender is observed by the peer as
/// end-of-channel.
pub fn duplex<A, B>() -> (Endpoint<A, B>, Endpoint<B, A>) {
    let (a_tx, a_rx) = channel::<A>();
    let (b_tx, b_rx) = channel::<B>();
    (Endpoint::new(a_tx, b_rx), Endpoint::new(b_tx, a_rx))
}
