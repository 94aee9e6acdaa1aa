//! Mutex-held bulk transfer out of a `BlockingQueue`'s live window.
//!
//! Every function here takes an already-locked `State<T>` and returns the
//! elements removed in take-order. Callers are responsible for releasing
//! the lock and signalling `not_full` afterwards (`BlockingQueue::drain_to*`
//! does both).

use super::state::State;

/// Logs a `warn` event if dropped while unwinding — i.e. exactly when a
/// caller-supplied predicate panics partway through phase 1 of
/// `drain_matching`, leaving `state` deliberately uncommitted.
struct PanicWarnGuard;

impl Drop for PanicWarnGuard {
    fn drop(&mut self) {
        if std::thread::panicking() {
            tracing::warn!("drain predicate panicked; queue left unchanged");
        }
    }
}

/// Removes every element currently in the queue, in take-order.
pub(super) fn drain_all<T>(state: &mut State<T>) -> Vec<T> {
    drain_up_to(state, state.count)
}

/// Removes up to `max` elements, in take-order. `max == 0` removes none.
pub(super) fn drain_up_to<T>(state: &mut State<T>, max: usize) -> Vec<T> {
    let n = max.min(state.count);
    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        out.push(state.dequeue());
    }
    out
}

/// Removes every element for which `predicate` returns `true`. Elements
/// that are retained keep their original relative order (gap-closing).
///
/// `predicate` is evaluated for every candidate element *before* any
/// element is actually removed from the buffer. If `predicate` panics,
/// nothing has been committed yet — `state` is observed exactly as it was
/// on entry by anything that later inspects it, satisfying the strong
/// exception safety spec.md §7 requires of a failed mutating operation.
pub(super) fn drain_matching<T>(
    state: &mut State<T>,
    mut predicate: impl FnMut(&T) -> bool,
) -> Vec<T> {
    let n = state.count;

    // Phase 1: decide, without mutating anything. A panic here leaves
    // `state` untouched; `_panic_guard` logs that fact on the way out.
    let _panic_guard = PanicWarnGuard;
    let mut drain_flags = Vec::with_capacity(n);
    for i in 0..n {
        let idx = state.logical_index(i);
        let item_ref = state.buf[idx]
            .as_ref()
            .expect("live window slot must be occupied");
        drain_flags.push(predicate(item_ref));
    }

    // Phase 2: commit. No user code runs here, so this cannot panic
    // partway through and leave `count` inconsistent with `buf`.
    let capacity = state.buf.len();
    let mut drained = Vec::new();
    let mut retained = Vec::new();
    for i in 0..n {
        let idx = state.logical_index(i);
        let item = state.buf[idx]
            .take()
            .expect("live window slot must be occupied");
        if drain_flags[i] {
            drained.push(item);
        } else {
            retained.push(item);
        }
    }

    state.take_index = 0;
    state.put_index = retained.len() % capacity;
    state.count = retained.len();
    for (i, item) in retained.into_iter().enumerate() {
        state.buf[i] = Some(item);
    }

    crate::invariants::debug_assert_count_matches_slots!(state.buf, state.take_index, state.count);

    drained
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(items: &[i32], capacity: usize) -> State<i32> {
        let mut state = State::new(capacity);
        for &item in items {
            state.enqueue(item);
        }
        state
    }

    #[test]
    fn drain_all_empties_in_take_order() {
        let mut state = seeded(&[1, 2, 3], 4);
        let out = drain_all(&mut state);
        assert_eq!(out, vec![1, 2, 3]);
        assert_eq!(state.count, 0);
    }

    #[test]
    fn drain_up_to_limits_and_closes_gap() {
        let mut state = seeded(&[1, 2, 3, 4, 5], 9);
        let out = drain_up_to(&mut state, 2);
        assert_eq!(out, vec![1, 2]);
        assert_eq!(state.count, 3);
        assert_eq!(state.dequeue(), 3);
    }

    #[test]
    fn drain_matching_preserves_retained_order() {
        let mut state = seeded(&[1, 2, 3, 4, 5], 9);
        let out = drain_matching(&mut state, |&x| x % 2 == 0);
        assert_eq!(out, vec![2, 4]);
        assert_eq!(state.count, 3);
        assert_eq!(state.dequeue(), 1);
        assert_eq!(state.dequeue(), 3);
        assert_eq!(state.dequeue(), 5);
    }

    #[test]
    fn drain_matching_panic_leaves_state_untouched() {
        let mut state = seeded(&[1, 2, 3], 4);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            drain_matching(&mut state, |&x| {
                if x == 2 {
                    panic!("boom");
                }
                true
            })
        }));
        assert!(result.is_err());
        assert_eq!(state.count, 3);
        assert_eq!(state.dequeue(), 1);
        assert_eq!(state.dequeue(), 2);
        assert_eq!(state.dequeue(), 3);
    }
}
