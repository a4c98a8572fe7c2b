//! A thin bounded mpsc wrapper so call sites deal with [`crate::error::SendError`]
//! instead of the raw `tokio::sync::mpsc` error types.

use crate::error::{RecvError, SendError};

/// Sending half of a bounded channel.
#[derive(Debug)]
pub struct Sender<T>(tokio::sync::mpsc::Sender<T>);

/// Receiving half of a bounded channel.
#[derive(Debug)]
pub struct Receiver<T>(tokio::sync::mpsc::Receiver<T>);

impl<T> Clone for Sender<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

/// Creates a new bounded channel with the given capacity.
#[must_use]
pub fn channel<T>(capacity: usize) -> (Sender<T>, Receiver<T>) {
    let (tx, rx) = tokio::sync::mpsc::channel(capacity);
    (Sender(tx), Receiver(rx))
}

impl<T> Sender<T> {
    /// Sends a message, waiting for capacity if the channel is full.
    pub async fn send(&self, value: T) -> Result<(), SendError<T>> {
        self.0.send(value).await.map_err(|e| SendError::Closed(e.0))
    }

    /// Attempts to send a message without waiting.
    pub fn try_send(&self, value: T) -> Result<(), SendError<T>> {
        self.0.try_send(value).map_err(|e| match e {
            tokio::sync::mpsc::error::TrySendError::Full(v) => SendError::Full(v),
            tokio::sync::mpsc::error::TrySendError::Closed(v) => SendError::Closed(v),
        })
    }
}

impl<T> Receiver<T> {
    /// Receives the next message, or `None` once the channel is closed and drained.
    pub async fn recv(&mut self) -> Option<T> {
        self.0.recv().await
    }

    /// Receives the next message, mapping a closed-and-empty channel to [`RecvError::Closed`].
    pub async fn recv_or_closed(&mut self) -> Result<T, RecvError> {
        self.0.recv().await.ok_or(RecvError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_and_receive() {
        let (tx, mut rx) = channel::<u32>(4);
        tx.send(1).await.unwrap();
        tx.send(2).await.unwrap();
        assert_eq!(rx.recv().await, Some(1));
        assert_eq!(rx.recv().await, Some(2));
    }

    #[tokio::test]
    async fn send_after_drop_is_closed() {
        let (tx, rx) = channel::<u32>(1);
        drop(rx);
        match tx.send(1).await {
            Err(SendError::Closed(v)) => assert_eq!(v, 1),
            other => panic!("expected Closed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn try_send_full() {
        let (tx, _rx) = channel::<u32>(1);
        tx.try_send(1).unwrap();
        match tx.try_send(2) {
            Err(SendError::Full(v)) => assert_eq!(v, 2),
            other => panic!("expected Full, got {other:?}"),
        }
    }
}
