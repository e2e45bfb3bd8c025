//! Counting semaphore gating how many applications run at once.

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Fixed-capacity slot counter.
/// - `acquire()` takes a slot, blocking while none are free.
/// - Slots come back through `Permit`'s `Drop`, including while unwinding.
///
/// The lock/condvar pair is only touched when the counter hits zero, so a
/// limiter sized to the whole input never blocks and never locks.
pub struct Limiter {
    capacity: usize,
    available: AtomicUsize,
    waiters: AtomicUsize,
    lock: Mutex<()>,
    freed: Condvar,
}

/// One held slot. Dropping it releases the slot.
#[must_use = "dropping a permit releases its slot immediately"]
pub struct Permit<'a> {
    limiter: &'a Limiter,
}

impl Limiter {
    /// `capacity` must be at least 1; `acquire()` on an empty limiter never returns.
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "a zero-capacity limiter blocks every acquire");
        Self {
            capacity,
            available: AtomicUsize::new(capacity),
            waiters: AtomicUsize::new(0),
            lock: Mutex::new(()),
            freed: Condvar::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Free slots right now; racy by nature, meant for diagnostics.
    pub fn available(&self) -> usize {
        self.available.load(Ordering::SeqCst)
    }

    /// Block until a slot is free and take it.
    pub fn acquire(&self) -> Permit<'_> {
        if self.try_take() {
            return Permit { limiter: self };
        }

        let mut guard = self.lock.lock();
        self.waiters.fetch_add(1, Ordering::SeqCst);
        while !self.try_take() {
            self.freed.wait(&mut guard);
        }
        self.waiters.fetch_sub(1, Ordering::SeqCst);
        Permit { limiter: self }
    }

    /// Take a slot without blocking; `None` when at capacity.
    pub fn try_acquire(&self) -> Option<Permit<'_>> {
        self.try_take().then(|| Permit { limiter: self })
    }

    fn try_take(&self) -> bool {
        let mut current = self.available.load(Ordering::SeqCst);
        loop {
            if current == 0 {
                return false;
            }
            match self.available.compare_exchange_weak(
                current,
                current - 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    fn release(&self) {
        let before = self.available.fetch_add(1, Ordering::SeqCst);
        debug_assert!(before < self.capacity, "released more slots than acquired");
        if self.waiters.load(Ordering::SeqCst) > 0 {
            // Taking the lock orders this notify after the waiter's failed re-check.
            let _guard = self.lock.lock();
            self.freed.notify_one();
        }
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        self.limiter.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn permits_are_counted_and_returned() {
        let limiter = Limiter::new(2);
        assert_eq!(limiter.capacity(), 2);

        let a = limiter.acquire();
        let b = limiter.acquire();
        assert_eq!(limiter.available(), 0);
        assert!(limiter.try_acquire().is_none());

        drop(a);
        assert_eq!(limiter.available(), 1);
        drop(b);
        assert_eq!(limiter.available(), 2);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "zero-capacity")]
    fn zero_capacity_is_rejected() {
        let _ = Limiter::new(0);
    }

    #[test]
    fn permit_released_while_unwinding() {
        let limiter = Limiter::new(1);
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _permit = limiter.acquire();
            panic!("boom");
        }));
        assert!(res.is_err());
        assert_eq!(limiter.available(), 1);
    }

    #[test]
    fn blocked_acquire_wakes_on_release() {
        let limiter = Limiter::new(1);
        let acquired = AtomicBool::new(false);

        thread::scope(|s| {
            let held = limiter.acquire();
            s.spawn(|| {
                let _second = limiter.acquire();
                acquired.store(true, Ordering::SeqCst);
            });

            thread::sleep(Duration::from_millis(50));
            assert!(!acquired.load(Ordering::SeqCst), "acquire must block at capacity");
            drop(held);
        });

        assert!(acquired.load(Ordering::SeqCst));
        assert_eq!(limiter.available(), 1);
    }

    #[test]
    fn many_threads_never_exceed_capacity() {
        let limiter = Limiter::new(3);
        let active = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);

        thread::scope(|s| {
            for _ in 0..16 {
                s.spawn(|| {
                    for _ in 0..50 {
                        let _permit = limiter.acquire();
                        let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        thread::yield_now();
                        active.fetch_sub(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(limiter.available(), 3);
    }
}
