use std::sync::atomic::{AtomicI64, Ordering};

/// An integer value with serialized read, write, compare-and-swap, and
/// arithmetic read-modify-write operations, all individually atomic.
///
/// Backed by `std::sync::atomic::AtomicI64`. Narrowing a value returned by
/// [`get`](Self::get) to a smaller integer width (e.g. `counter.get() as
/// u32`) truncates exactly the way any other Rust `as` cast on an `i64`
/// does — no crate-specific narrowing API is needed for that.
#[derive(Debug, Default)]
pub struct AtomicCounter {
    value: AtomicI64,
}

impl AtomicCounter {
    /// Creates a new counter holding `initial`.
    #[inline]
    pub const fn new(initial: i64) -> Self {
        Self {
            value: AtomicI64::new(initial),
        }
    }

    /// Returns the current value.
    #[inline]
    pub fn get(&self) -> i64 {
        self.value.load(Ordering::SeqCst)
    }

    /// Stores `new`.
    #[inline]
    pub fn set(&self, new: i64) {
        self.value.store(new, Ordering::SeqCst);
    }

    /// Atomically returns the old value and stores `new`.
    #[inline]
    pub fn get_and_set(&self, new: i64) -> i64 {
        self.value.swap(new, Ordering::SeqCst)
    }

    /// If the current value equals `expected`, replaces it with `new` and
    /// returns `true`; otherwise leaves it unchanged and returns `false`.
    /// Never fails spuriously.
    #[inline]
    pub fn compare_and_set(&self, expected: i64, new: i64) -> bool {
        self.value
            .compare_exchange(expected, new, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Same contract as [`compare_and_set`](Self::compare_and_set), but
    /// allowed to fail spuriously; implemented as a strong CAS (see
    /// [`AtomicFlag::weak_compare_and_set`](crate::AtomicFlag::weak_compare_and_set)
    /// for the rationale).
    #[inline]
    pub fn weak_compare_and_set(&self, expected: i64, new: i64) -> bool {
        self.value
            .compare_exchange_weak(expected, new, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Returns the current value and increments it by one.
    #[inline]
    pub fn get_and_increment(&self) -> i64 {
        self.value.fetch_add(1, Ordering::SeqCst)
    }

    /// Returns the current value and decrements it by one.
    #[inline]
    pub fn get_and_decrement(&self) -> i64 {
        self.value.fetch_sub(1, Ordering::SeqCst)
    }

    /// Increments by one and returns the updated value.
    #[inline]
    pub fn increment_and_get(&self) -> i64 {
        self.value.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Decrements by one and returns the updated value.
    #[inline]
    pub fn decrement_and_get(&self) -> i64 {
        self.value.fetch_sub(1, Ordering::SeqCst) - 1
    }

    /// Returns the current value and adds `delta`.
    #[inline]
    pub fn get_and_add(&self, delta: i64) -> i64 {
        self.value.fetch_add(delta, Ordering::SeqCst)
    }

    /// Adds `delta` and returns the updated value.
    #[inline]
    pub fn add_and_get(&self, delta: i64) -> i64 {
        self.value.fetch_add(delta, Ordering::SeqCst) + delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_set_round_trip() {
        let counter = AtomicCounter::new(5);
        assert_eq!(counter.get(), 5);
        counter.set(10);
        assert_eq!(counter.get(), 10);
    }

    #[test]
    fn increment_and_decrement() {
        let counter = AtomicCounter::new(0);
        assert_eq!(counter.increment_and_get(), 1);
        assert_eq!(counter.get_and_increment(), 1);
        assert_eq!(counter.get(), 2);
        assert_eq!(counter.decrement_and_get(), 1);
        assert_eq!(counter.get_and_decrement(), 1);
        assert_eq!(counter.get(), 0);
    }

    #[test]
    fn add_and_get_variants() {
        let counter = AtomicCounter::new(100);
        assert_eq!(counter.get_and_add(5), 100);
        assert_eq!(counter.get(), 105);
        assert_eq!(counter.add_and_get(-5), 100);
    }

    #[test]
    fn compare_and_set() {
        let counter = AtomicCounter::new(1);
        assert!(counter.compare_and_set(1, 2));
        assert!(!counter.compare_and_set(1, 3));
        assert_eq!(counter.get(), 2);
    }

    #[test]
    fn narrowing_truncates_like_any_cast() {
        let counter = AtomicCounter::new((u32::MAX as i64) + 10);
        let narrowed = counter.get() as u32;
        assert_eq!(narrowed, 9);
    }
}
