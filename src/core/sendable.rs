//! Sendable capability: which values may cross an isolation domain boundary.
//!
//! A type qualifies when it is `Send + Sync + 'static`. That covers immutable
//! data, data guarded by its own synchronization (`Mutex`, atomics) and actor
//! handles. Anything else must be asserted with [`UncheckedSendable`].
//!
//! Shared mutable state without synchronization is rejected at build time:
//!
//! ```compile_fail
//! use isolation_lab::core::sendable::assert_sendable;
//! assert_sendable::<std::rc::Rc<u32>>();
//! ```
//!
//! ```compile_fail
//! use isolation_lab::core::sendable::assert_sendable;
//! assert_sendable::<std::cell::Cell<u32>>();
//! ```
//!
//! A closure is Sendable only if everything it captures is:
//!
//! ```compile_fail
//! use isolation_lab::core::sendable::require_sendable;
//! let counter = std::rc::Rc::new(std::cell::RefCell::new(0));
//! let bump = move || *counter.borrow_mut() += 1;
//! require_sendable(&bump);
//! ```
//!
//! ```
//! use isolation_lab::core::sendable::require_sendable;
//! use std::sync::{Arc, Mutex};
//! let counter = Arc::new(Mutex::new(0));
//! let bump = move || *counter.lock().unwrap() += 1;
//! require_sendable(&bump);
//! ```

use std::fmt;

pub trait Sendable: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> Sendable for T {}

/// Compile-time check. Calling it only type-checks when `T` is Sendable.
pub const fn assert_sendable<T: Sendable>() {}

/// Same check for a value whose type cannot be named, e.g. a closure.
pub fn require_sendable<T: Sendable>(_value: &T) {}

/// A value explicitly asserted as safe to share across domains.
pub struct UncheckedSendable<T> {
    value: T,
}

impl<T> UncheckedSendable<T> {
    /// # Safety
    ///
    /// The caller guarantees that no two domains ever touch `value`
    /// concurrently, and that any interior state it reaches is not mutated
    /// behind the wrapper's back.
    pub unsafe fn new(value: T) -> Self {
        Self { value }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

// SAFETY: upheld by the contract of `UncheckedSendable::new`.
unsafe impl<T> Send for UncheckedSendable<T> {}
// SAFETY: upheld by the contract of `UncheckedSendable::new`.
unsafe impl<T> Sync for UncheckedSendable<T> {}

impl<T: fmt::Debug> fmt::Debug for UncheckedSendable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UncheckedSendable").field(&self.value).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::sync::atomic::AtomicU64;
    use std::sync::{Arc, Mutex};

    #[derive(Debug)]
    struct Snapshot {
        _titles: Vec<String>,
    }

    #[test]
    fn test_immutable_and_synchronized_types_are_sendable() {
        assert_sendable::<u64>();
        assert_sendable::<String>();
        assert_sendable::<Snapshot>();
        assert_sendable::<Arc<Snapshot>>();
        assert_sendable::<Mutex<Vec<u8>>>();
        assert_sendable::<Arc<AtomicU64>>();
    }

    #[test]
    fn test_unchecked_wrapper_crosses_threads() {
        // SAFETY: only the spawned thread touches the cell after the move.
        let wrapped = unsafe { UncheckedSendable::new(Cell::new(41)) };
        assert_sendable::<UncheckedSendable<Cell<u32>>>();

        let value = std::thread::spawn(move || {
            let cell = wrapped.into_inner();
            cell.set(cell.get() + 1);
            cell.get()
        })
        .join()
        .unwrap();

        assert_eq!(value, 42);
    }
}
