//! Loom-based concurrency tests for the blocking queue's wait/notify
//! protocol.
//!
//! Run with: `cargo test --features loom --test loom_tests --release`
//!
//! Loom doesn't understand `std::sync::Mutex`/`Condvar` directly, so these
//! tests re-implement the same mutex-held ring buffer and not_empty/not_full
//! protocol against `loom::sync` primitives, at a small fixed capacity to
//! keep the interleaving space tractable. This exercises the same
//! wait-while-full / wait-while-empty / notify-on-state-change shape
//! `BlockingQueue` uses, not `BlockingQueue` itself.

#![cfg(feature = "loom")]

use loom::sync::{Arc, Condvar, Mutex};
use loom::thread;

struct LoomQueue {
    state: Mutex<State>,
    not_empty: Condvar,
    not_full: Condvar,
}

struct State {
    buf: [Option<u64>; 2],
    head: usize,
    count: usize,
}

const CAPACITY: usize = 2;

impl LoomQueue {
    fn new() -> Self {
        Self {
            state: Mutex::new(State {
                buf: [None, None],
                head: 0,
                count: 0,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
        }
    }

    fn put(&self, item: u64) {
        let mut guard = self.state.lock().unwrap();
        while guard.count == CAPACITY {
            guard = self.not_full.wait(guard).unwrap();
        }
        let idx = (guard.head + guard.count) % CAPACITY;
        guard.buf[idx] = Some(item);
        guard.count += 1;
        drop(guard);
        self.not_empty.notify_one();
    }

    fn take(&self) -> u64 {
        let mut guard = self.state.lock().unwrap();
        while guard.count == 0 {
            guard = self.not_empty.wait(guard).unwrap();
        }
        let item = guard.buf[guard.head].take().unwrap();
        guard.head = (guard.head + 1) % CAPACITY;
        guard.count -= 1;
        drop(guard);
        self.not_full.notify_one();
        item
    }
}

/// A producer blocked on a full queue is woken by the consumer that makes
/// room, and the element it then inserts is the one the consumer observes.
#[test]
fn loom_put_blocks_until_room() {
    loom::model(|| {
        let queue = Arc::new(LoomQueue::new());
        queue.put(1);
        queue.put(2); // queue now full (capacity 2)

        let producer_queue = Arc::clone(&queue);
        let producer = thread::spawn(move || {
            producer_queue.put(3);
        });

        let consumer_queue = Arc::clone(&queue);
        let consumer = thread::spawn(move || consumer_queue.take());

        let first = consumer.join().unwrap();
        producer.join().unwrap();

        assert_eq!(first, 1);
    });
}

/// A consumer blocked on an empty queue is woken by the producer that
/// inserts the element it then receives.
#[test]
fn loom_take_blocks_until_available() {
    loom::model(|| {
        let queue = Arc::new(LoomQueue::new());

        let producer_queue = Arc::clone(&queue);
        let producer = thread::spawn(move || {
            producer_queue.put(42);
        });

        let consumer_queue = Arc::clone(&queue);
        let consumer = thread::spawn(move || consumer_queue.take());

        producer.join().unwrap();
        let received = consumer.join().unwrap();

        assert_eq!(received, 42);
    });
}

/// Two producers racing to fill a 2-capacity queue never observe more than
/// `CAPACITY` elements resident at once, under every interleaving loom
/// explores.
#[test]
fn loom_concurrent_producers_respect_capacity() {
    loom::model(|| {
        let queue = Arc::new(LoomQueue::new());

        let q1 = Arc::clone(&queue);
        let p1 = thread::spawn(move || q1.put(1));
        let q2 = Arc::clone(&queue);
        let p2 = thread::spawn(move || q2.put(2));

        p1.join().unwrap();
        p2.join().unwrap();

        let guard = queue.state.lock().unwrap();
        assert!(guard.count <= CAPACITY);
        assert_eq!(guard.count, 2);
    });
}
