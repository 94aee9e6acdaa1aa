/// Configuration for constructing a [`crate::BlockingQueue`].
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Maximum number of elements the queue may hold.
    pub capacity: usize,
    /// Selects the waiter wake-up discipline: strict FIFO (`true`) or
    /// unspecified barging order (`false`).
    pub fair: bool,
}

impl Config {
    /// Creates a new configuration.
    pub const fn new(capacity: usize, fair: bool) -> Self {
        Self { capacity, fair }
    }

    /// Non-fair, tuned for hand-off speed rather than strict producer
    /// ordering. This is the default discipline: most callers don't need
    /// FIFO among waiters and non-fair mode avoids the broadcast wakeup
    /// fairness requires.
    pub const fn low_latency(capacity: usize) -> Self {
        Self {
            capacity,
            fair: false,
        }
    }

    /// Fair, for callers that need the earliest-arrived waiting producer
    /// to be the one whose element is delivered next.
    pub const fn fair_handoff(capacity: usize) -> Self {
        Self {
            capacity,
            fair: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::low_latency(16)
    }
}
