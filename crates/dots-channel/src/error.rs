//! Errors for the bounded channels used to hand work between DOTS tasks.

/// Errors that can occur sending a message into a channel.
#[derive(thiserror::Error, Debug)]
pub enum SendError<T> {
    /// The channel is full and the message could not be sent without blocking.
    #[error("channel is full and the message could not be sent")]
    Full(T),

    /// The channel is closed (the receiver was dropped).
    #[error("channel is closed and the message could not be sent")]
    Closed(T),
}

impl<T> SendError<T> {
    /// Returns the value that failed to send, regardless of the reason.
    pub fn into_inner(self) -> T {
        match self {
            Self::Full(t) => t,
            Self::Closed(t) => t,
        }
    }
}

/// Errors that can occur receiving a message from a channel.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecvError {
    /// The channel is closed and no further messages will arrive.
    #[error("channel is closed")]
    Closed,
}
