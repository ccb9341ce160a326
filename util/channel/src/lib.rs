//! Reexports `crossbeam_channel` to uniform the dependency version.

pub use crossbeam_channel::{
    after, bounded, never, select, select_biased, tick, unbounded, Receiver, RecvError,
    RecvTimeoutError, SendError, Sender, TryRecvError, TrySendError,
};

/// A one-shot request carrying its response channel.
///
/// The caller builds the request with a rendezvous channel, sends it to a
/// service thread, and blocks on the responder for the reply.
pub struct Request<A, R> {
    /// Channel the service answers on.
    pub responder: Sender<R>,
    /// Request payload.
    pub arguments: A,
}

impl<A, R> Request<A, R> {
    /// Send `arguments` to `sender` and wait for the response.
    ///
    /// Returns `None` if the service has gone away (either side of the
    /// exchange disconnected).
    pub fn call(sender: &Sender<Request<A, R>>, arguments: A) -> Option<R> {
        let (responder, response) = bounded(1);
        sender
            .send(Request {
                responder,
                arguments,
            })
            .ok()?;
        response.recv().ok()
    }
}
