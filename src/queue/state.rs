/// The mutable state protected by `Inner::state`'s mutex.
///
/// Holding this under one lock is what makes `BlockingQueue` correct: every
/// invariant in `SPEC_FULL.md` §3 is a statement about this struct, and it
/// only has to hold between operations, never mid-operation, because a
/// single `MutexGuard` spans each operation from entry to exit.
use std::collections::BTreeSet;

pub(super) struct State<T> {
    pub(super) buf: Box<[Option<T>]>,
    pub(super) take_index: usize,
    pub(super) put_index: usize,
    pub(super) count: usize,

    /// Fair-mode ticket counters for the `not_empty` condition (consumers
    /// waiting to `take`/`poll`). Unused when the queue is non-fair.
    pub(super) not_empty_next_ticket: u64,
    pub(super) not_empty_now_serving: u64,
    /// Tickets whose holder left (timed out or was interrupted) before
    /// reaching the head of the `not_empty` line. Consulted by
    /// [`advance_not_empty`](Self::advance_not_empty) so the line keeps
    /// moving instead of stalling on a ticket nobody will ever claim.
    pub(super) not_empty_abandoned: BTreeSet<u64>,

    /// Fair-mode ticket counters for the `not_full` condition (producers
    /// waiting to `put`/`offer`).
    pub(super) not_full_next_ticket: u64,
    pub(super) not_full_now_serving: u64,
    /// Symmetric to [`not_empty_abandoned`](Self::not_empty_abandoned), for
    /// the `not_full` line.
    pub(super) not_full_abandoned: BTreeSet<u64>,
}

impl<T> State<T> {
    pub(super) fn new(capacity: usize) -> Self {
        let mut buf = Vec::with_capacity(capacity);
        buf.resize_with(capacity, || None);
        Self {
            buf: buf.into_boxed_slice(),
            take_index: 0,
            put_index: 0,
            count: 0,
            not_empty_next_ticket: 0,
            not_empty_now_serving: 0,
            not_empty_abandoned: BTreeSet::new(),
            not_full_next_ticket: 0,
            not_full_now_serving: 0,
            not_full_abandoned: BTreeSet::new(),
        }
    }

    /// Advances the `not_full` line past ticket `t` (this thread's ticket,
    /// which just reached the head of the line) and then past any
    /// consecutive tickets already marked abandoned, so a ticket whose
    /// holder left early never strands the tickets behind it.
    ///
    /// Caller must have already verified `t == self.not_full_now_serving`.
    pub(super) fn advance_not_full(&mut self, t: u64) {
        self.not_full_now_serving = t + 1;
        while self.not_full_abandoned.remove(&self.not_full_now_serving) {
            self.not_full_now_serving += 1;
        }
    }

    /// Symmetric to [`advance_not_full`](Self::advance_not_full) for the
    /// `not_empty` line.
    pub(super) fn advance_not_empty(&mut self, t: u64) {
        self.not_empty_now_serving = t + 1;
        while self.not_empty_abandoned.remove(&self.not_empty_now_serving) {
            self.not_empty_now_serving += 1;
        }
    }

    #[inline]
    pub(super) fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub(super) fn is_full(&self, capacity: usize) -> bool {
        self.count == capacity
    }

    /// Enqueues `item` at `put_index`. Caller must have already verified
    /// there is room (`count < capacity`).
    pub(super) fn enqueue(&mut self, item: T) {
        let capacity = self.buf.len();
        crate::invariants::debug_assert_bounded_count!(self.count + 1, capacity);
        self.buf[self.put_index] = Some(item);
        self.put_index = (self.put_index + 1) % capacity;
        self.count += 1;
        crate::invariants::debug_assert_index_in_range!("put_index", self.put_index, capacity);
    }

    /// Dequeues the element at `take_index`. Caller must have already
    /// verified the queue is non-empty.
    pub(super) fn dequeue(&mut self) -> T {
        let capacity = self.buf.len();
        let item = self.buf[self.take_index]
            .take()
            .expect("dequeue called on an empty slot");
        self.take_index = (self.take_index + 1) % capacity;
        self.count -= 1;
        crate::invariants::debug_assert_index_in_range!("take_index", self.take_index, capacity);
        item
    }

    /// Logical position of element `i` (0-based from the head) within `buf`.
    #[inline]
    pub(super) fn logical_index(&self, i: usize) -> usize {
        (self.take_index + i) % self.buf.len()
    }
}
