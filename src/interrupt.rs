use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::queue::Inner;

/// A cooperative cancellation token for a blocking [`crate::BlockingQueue`]
/// call.
///
/// Rust threads have no built-in interrupt signal the way the source
/// language's threads do, so a blocking `put`/`take`/timed `offer`/timed
/// `poll` call takes one of these instead: another thread calls
/// [`interrupt`](Interrupt::interrupt) on it, and the blocked call aborts
/// with [`crate::QueueError::Interrupted`] the next time it wakes, with no
/// element consumed or produced as a side effect.
///
/// Obtained from [`crate::BlockingQueue::new_interrupt`]; scoped to the
/// queue it was created from, since `interrupt()` has to wake exactly that
/// queue's waiters.
pub struct Interrupt<T> {
    inner: Arc<Inner<T>>,
    signaled: Arc<AtomicBool>,
}

// A hand-written impl, not `#[derive(Clone)]`: the derive would add a
// spurious `T: Clone` bound, even though `T` only ever appears behind an
// `Arc` here.
impl<T> Clone for Interrupt<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            signaled: Arc::clone(&self.signaled),
        }
    }
}

impl<T> Interrupt<T> {
    pub(crate) fn new(inner: Arc<Inner<T>>) -> Self {
        Self {
            inner,
            signaled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Requests that the blocking call this token was passed to abort.
    ///
    /// Sets the cancellation flag, then wakes every waiter on both of the
    /// queue's condition variables so the interrupted thread (and, in fair
    /// mode, any thread re-checking its ticket) re-evaluates its wait
    /// predicate promptly instead of waiting out its full timeout.
    pub fn interrupt(&self) {
        self.signaled.store(true, Ordering::SeqCst);
        self.inner.not_empty.notify_all();
        self.inner.not_full.notify_all();
    }

    /// Returns `true` if [`interrupt`](Self::interrupt) has been called and
    /// not yet [`clear`](Self::clear)ed.
    pub fn is_interrupted(&self) -> bool {
        self.signaled.load(Ordering::SeqCst)
    }

    /// Resets the cancellation flag so this token can be reused for a
    /// subsequent blocking call.
    ///
    /// Don't call this concurrently with a call still blocked on this same
    /// token: an indefinite wait (`put`/`take`) relies on observing the
    /// flag as still set immediately after waking from an interruption, and
    /// a `clear()` racing that observation could in principle make the wait
    /// see neither "room/data available" nor "interrupted". Reuse a token
    /// only after the call it was passed to has returned.
    pub fn clear(&self) {
        self.signaled.store(false, Ordering::SeqCst);
    }
}
