//! Serialization of update cycles.
//!
//! [`UpdateLock`] is a single-slot lock: at most one update cycle may hold it
//! at a time, regardless of which thread the cycle runs on. It is not a
//! queue — waiters are woken together and re-race for the slot, with no
//! fairness ordering — and it has no timeout: a stuck cycle holds the lock
//! indefinitely.
//!
//! Acquisition is scoped: [`UpdateLock::acquire`] returns an [`UpdateGuard`]
//! whose `Drop` releases the lock, so every exit path of a cycle (including
//! panics) releases it.

use std::sync::{Condvar, Mutex, PoisonError};

/// Single-slot lock serializing plot update cycles.
pub struct UpdateLock {
    locked: Mutex<bool>,
    cond: Condvar,
}

impl UpdateLock {
    /// Create a free lock.
    pub fn new() -> Self {
        Self {
            locked: Mutex::new(false),
            cond: Condvar::new(),
        }
    }

    /// Block until the lock is free, take it, and return the releasing guard.
    ///
    /// A disturbed wait (spurious wakeup, or a holder that panicked and
    /// poisoned the monitor) still proceeds to re-attempt the free→locked
    /// transition instead of abandoning the cycle.
    pub fn acquire(&self) -> UpdateGuard<'_> {
        let mut locked = self.locked.lock().unwrap_or_else(PoisonError::into_inner);
        if *locked {
            log::debug!("update lock busy, waiting ({:?})", std::thread::current().id());
        }
        while *locked {
            locked = self
                .cond
                .wait(locked)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *locked = true;
        log::debug!("update lock acquired ({:?})", std::thread::current().id());
        UpdateGuard { lock: self }
    }

    /// Whether an update cycle currently holds the lock.
    pub fn is_locked(&self) -> bool {
        *self.locked.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn release(&self) {
        let mut locked = self.locked.lock().unwrap_or_else(PoisonError::into_inner);
        *locked = false;
        log::debug!("update lock released ({:?})", std::thread::current().id());
        // All waiters wake and re-race; exactly one wins the flag.
        self.cond.notify_all();
    }
}

impl Default for UpdateLock {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard for a held [`UpdateLock`]; dropping it releases the lock.
#[must_use = "dropping the guard releases the update lock"]
pub struct UpdateGuard<'a> {
    lock: &'a UpdateLock,
}

impl Drop for UpdateGuard<'_> {
    fn drop(&mut self) {
        self.lock.release();
    }
}
