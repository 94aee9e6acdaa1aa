//! Error types for `BlockingQueue` operations.

use thiserror::Error;

/// Errors that can occur when constructing or operating on a [`crate::BlockingQueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    /// Constructor called with `capacity <= 0`.
    #[error("invalid capacity: must be greater than zero")]
    InvalidCapacity,

    /// A required collection argument was absent.
    #[error("collection must not be null")]
    NullCollection,

    /// A seeding collection's size exceeded the queue's capacity.
    #[error("collection exceeds queue capacity")]
    CollectionTooLarge,

    /// `drain_to` was called with the queue itself as the sink.
    #[error("cannot drain a queue into itself")]
    SelfDrain,

    /// `add`/`offer`/`put` was called with an element that is not permitted
    /// (kept for parity with spec.md; unreachable from this crate's safe
    /// constructors since Rust has no null `T`).
    #[error("element must not be null")]
    NullElement,

    /// `add` was called on a full queue.
    #[error("queue is full")]
    QueueFull,

    /// `remove` was called on an empty queue.
    #[error("queue is empty")]
    QueueEmpty,

    /// A blocking wait was aborted by a cooperative interruption.
    #[error("operation interrupted")]
    Interrupted,
}
