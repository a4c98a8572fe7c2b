//! A bounded one-shot wrapper used for request/response hand-offs, e.g. the
//! blocker selection service replying with exactly one [`crate::error`]-typed
//! outcome.

use crate::error::RecvError;

/// Sending half of a one-shot reply channel.
#[derive(Debug)]
pub struct Sender<T>(tokio::sync::oneshot::Sender<T>);

/// Receiving half of a one-shot reply channel.
#[derive(Debug)]
pub struct Receiver<T>(tokio::sync::oneshot::Receiver<T>);

/// Creates a new one-shot reply channel.
#[must_use]
pub fn channel<T>() -> (Sender<T>, Receiver<T>) {
    let (tx, rx) = tokio::sync::oneshot::channel();
    (Sender(tx), Receiver(rx))
}

impl<T> Sender<T> {
    /// Sends the single reply value. Returns the value back if the receiver
    /// was already dropped.
    pub fn send(self, value: T) -> Result<(), T> {
        self.0.send(value)
    }
}

impl<T> Receiver<T> {
    /// Awaits the single reply value.
    pub async fn recv(self) -> Result<T, RecvError> {
        self.0.await.map_err(|_| RecvError::Closed)
    }
}
