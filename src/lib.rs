//! A bounded, thread-safe, blocking FIFO queue, in the spirit of Java's
//! `java.util.concurrent.ArrayBlockingQueue`.
//!
//! A single `Mutex` guards a fixed-capacity ring buffer; two `Condvar`s
//! (`not_empty`, `not_full`) coordinate producers and consumers blocking on
//! a full or empty queue. An optional strict-FIFO fairness discipline
//! orders *waiting* threads without penalizing callers who never have to
//! wait. Rust has no built-in thread-interrupt signal, so blocking calls
//! take a cooperative [`Interrupt`] token instead of relying on one.
//!
//! # Example
//!
//! ```
//! use ringqueue::BlockingQueue;
//!
//! let queue: BlockingQueue<u64> = BlockingQueue::new(16).unwrap();
//! queue.put(1).unwrap();
//! queue.put(2).unwrap();
//! assert_eq!(queue.take().unwrap(), 1);
//!
//! let mut drained = Vec::new();
//! queue.drain_to(&mut drained).unwrap();
//! assert_eq!(drained, vec![2]);
//! ```

mod atomic_counter;
mod atomic_flag;
mod config;
mod error;
mod interrupt;
mod invariants;
mod queue;

pub use atomic_counter::AtomicCounter;
pub use atomic_flag::AtomicFlag;
pub use config::Config;
pub use error::QueueError;
pub use interrupt::Interrupt;
pub use queue::BlockingQueue;
